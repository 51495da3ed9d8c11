//! Native messaging framing: a 4-byte little-endian length, then that many
//! bytes of UTF-8 JSON.
use std::io;

use marker_core::{CompanionRequest, ErrorReply, Message};
use marker_engine::TabId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Largest frame accepted from the browser.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("frame of {0} bytes exceeds the limit")]
    TooLarge(usize),
    #[error("frame is not valid json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Frames sent by the browser side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Inbound {
    /// A message from one of our own content scripts or pages.
    Request {
        id: u64,
        #[serde(default)]
        sender: Option<TabId>,
        message: Value,
    },
    /// A message from another extension.
    External {
        id: u64,
        sender: String,
        message: Value,
    },
    TabUpdated {
        tab: TabId,
        url: String,
    },
    TabRemoved {
        tab: TabId,
    },
    /// Answer to a host-initiated `deliver` or `external-request`.
    Reply(Reply),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: u64,
    pub ok: bool,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Frames written by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Outbound {
    Response {
        id: u64,
        ok: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ErrorReply>,
    },
    Deliver {
        id: u64,
        tab: TabId,
        message: Message,
    },
    ExternalRequest {
        id: u64,
        extension: String,
        message: CompanionRequest,
    },
}

impl Outbound {
    pub fn answer(id: u64, value: Value) -> Self {
        Outbound::Response {
            id,
            ok: true,
            value: Some(value),
            error: None,
        }
    }

    pub fn failure(id: u64, error: ErrorReply) -> Self {
        Outbound::Response {
            id,
            ok: false,
            value: None,
            error: Some(error),
        }
    }
}

/// Read one frame. `Ok(None)` on a clean end of stream.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Value>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let mut len = [0u8; 4];
    match reader.read_exact(&mut len).await {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    }
    let len = u32::from_le_bytes(len) as usize;
    if len > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(len));
    }

    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(&body)?))
}

pub async fn write_frame<W, T>(writer: &mut W, frame: &T) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let body = serde_json::to_vec(frame)?;
    let len = u32::try_from(body.len()).map_err(|_| FrameError::TooLarge(body.len()))?;
    writer.write_all(&len.to_le_bytes()).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

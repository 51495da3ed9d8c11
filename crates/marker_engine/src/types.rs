use marker_core::{ErrorCode, ErrorReply, PostUrlError};
use thiserror::Error;

use crate::persist::PersistError;

/// Browser tab identifier.
pub type TabId = i32;

/// A message could not be delivered or answered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Nobody is listening on the other end (tab closed, extension disabled).
    #[error("receiver unreachable: {0}")]
    Unreachable(String),
    #[error("no reply within {0} ms")]
    Timeout(u64),
    #[error("malformed response: {0}")]
    BadResponse(String),
    /// The receiver answered with an error.
    #[error("{}", .0.message)]
    Remote(ErrorReply),
}

impl TransportError {
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            TransportError::Remote(reply) => Some(reply.code),
            _ => None,
        }
    }

    /// The request reached the background but the companion extension could not be.
    pub fn is_companion_unreachable(&self) -> bool {
        self.code() == Some(ErrorCode::CompanionUnreachable)
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value for {key} is malformed: {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Persist(#[from] PersistError),
    #[error("storage backend: {0}")]
    Backend(String),
}

/// Failure talking to the companion "upload" extension.
#[derive(Debug, Error)]
pub enum CompanionError {
    /// Not installed or disabled. Never the same thing as "no results".
    #[error("companion extension unreachable: {0}")]
    Unreachable(#[source] TransportError),
    #[error("companion extension reported: {0}")]
    Reported(String),
    #[error("companion response malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Failure handling a message in the background.
#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Companion(#[from] CompanionError),
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("message from unknown sender {0}")]
    UnknownSender(String),
    #[error("could not encode answer: {0}")]
    Encode(#[from] serde_json::Error),
}

impl BackgroundError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BackgroundError::Storage(_) => ErrorCode::Storage,
            BackgroundError::Companion(CompanionError::Unreachable(_)) => {
                ErrorCode::CompanionUnreachable
            }
            BackgroundError::Companion(_) => ErrorCode::CompanionFailed,
            BackgroundError::BadRequest(_) | BackgroundError::UnknownSender(_) => {
                ErrorCode::BadRequest
            }
            BackgroundError::Encode(_) => ErrorCode::Internal,
        }
    }

    pub fn to_reply(&self) -> ErrorReply {
        ErrorReply {
            code: self.code(),
            message: self.to_string(),
        }
    }
}

/// Manual post entry in the thumbnail panel was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PanelError {
    #[error("panel is not open")]
    NotOpen,
    #[error("not a recognised post URL: {0}")]
    InvalidUrl(#[from] PostUrlError),
}

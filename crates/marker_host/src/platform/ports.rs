use std::sync::Arc;

use async_trait::async_trait;
use marker_core::{CompanionRequest, Message};
use marker_engine::{CompanionPort, TabId, TabMessenger, TransportError};
use serde_json::Value;

use super::frame::Outbound;
use super::transport::Transport;

/// Tab delivery through `deliver` frames; the browser side answers with a
/// `reply` once the tab's content script has accepted the message.
pub struct FrameTabMessenger {
    transport: Arc<Transport>,
}

impl FrameTabMessenger {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl TabMessenger for FrameTabMessenger {
    async fn send(&self, tab: TabId, message: &Message) -> Result<(), TransportError> {
        self.transport
            .call(|id| Outbound::Deliver {
                id,
                tab,
                message: message.clone(),
            })
            .await
            .map(|_| ())
    }
}

/// Companion extension calls through `external-request` frames.
pub struct FrameCompanion {
    transport: Arc<Transport>,
    extension: String,
}

impl FrameCompanion {
    pub fn new(transport: Arc<Transport>, extension: impl Into<String>) -> Self {
        Self {
            transport,
            extension: extension.into(),
        }
    }
}

#[async_trait]
impl CompanionPort for FrameCompanion {
    async fn send(&self, request: &CompanionRequest) -> Result<Value, TransportError> {
        self.transport
            .call(|id| Outbound::ExternalRequest {
                id,
                extension: self.extension.clone(),
                message: request.clone(),
            })
            .await
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use marker_core::Message;
use serde_json::Value;

use crate::ports::MessagePort;
use crate::sync::StatusSync;
use crate::{TabId, TransportError};

/// Message port wired straight to a `StatusSync` in the same process,
/// speaking for one tab.
#[derive(Clone)]
pub struct LocalBackground {
    sync: Arc<StatusSync>,
    tab: Option<TabId>,
}

impl LocalBackground {
    pub fn new(sync: Arc<StatusSync>, tab: Option<TabId>) -> Self {
        Self { sync, tab }
    }
}

#[async_trait]
impl MessagePort for LocalBackground {
    async fn request(&self, message: Message) -> Result<Value, TransportError> {
        match self.sync.handle_message(message, self.tab).await {
            Ok(answer) => Ok(answer.unwrap_or(Value::Null)),
            Err(err) => Err(TransportError::Remote(err.to_reply())),
        }
    }

    async fn publish(&self, message: Message) -> Result<(), TransportError> {
        self.request(message).await.map(|_| ())
    }
}

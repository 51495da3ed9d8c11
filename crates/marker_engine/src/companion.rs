use std::sync::Arc;

use marker_core::{
    ArtistDatabaseResponse, ArtistEntry, CompanionRequest, HostPost, PostHost, QueryHostResponse,
};
use marker_logging::{marker_debug, marker_warn};
use serde_json::Value;

use crate::ports::CompanionPort;
use crate::CompanionError;

/// Typed requests to the companion "upload" extension.
#[derive(Clone)]
pub struct CompanionClient {
    port: Arc<dyn CompanionPort>,
}

impl CompanionClient {
    pub fn new(port: Arc<dyn CompanionPort>) -> Self {
        Self { port }
    }

    /// Posts on `host` matching all of `tags`.
    pub async fn query_host(
        &self,
        tags: Vec<String>,
        host: PostHost,
    ) -> Result<Vec<HostPost>, CompanionError> {
        marker_debug!("query-host {host} {tags:?}");
        let value = self.send(&CompanionRequest::QueryHost { tags, host }).await?;
        let response: QueryHostResponse = serde_json::from_value(value)?;
        match response.error {
            Some(error) => Err(CompanionError::Reported(error)),
            None => Ok(response.posts),
        }
    }

    /// Artist tags known for an artist page URL.
    pub async fn query_artist_database(&self, url: &str) -> Result<Vec<ArtistEntry>, CompanionError> {
        let request = CompanionRequest::QueryArtistDatabase {
            url: url.to_string(),
        };
        let value = self.send(&request).await?;
        let response: ArtistDatabaseResponse = serde_json::from_value(value)?;
        match response.error {
            Some(error) => Err(CompanionError::Reported(error)),
            None => Ok(response.artists),
        }
    }

    /// Relay a request unchanged and hand back whatever the companion answers.
    pub async fn forward(&self, request: &CompanionRequest) -> Result<Value, CompanionError> {
        self.send(request).await
    }

    async fn send(&self, request: &CompanionRequest) -> Result<Value, CompanionError> {
        self.port.send(request).await.map_err(|err| {
            marker_warn!("companion extension unreachable for {}: {err}", request.type_name());
            CompanionError::Unreachable(err)
        })
    }
}

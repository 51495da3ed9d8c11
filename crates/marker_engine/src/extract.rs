use std::sync::Arc;

use futures_util::future::{self, BoxFuture, FutureExt};
use futures_util::StreamExt;
use marker_core::{ElementId, SourceId};
use thiserror::Error;

use crate::ports::{AnchorProbe, Page};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("anchor of {0} has no usable id")]
    MissingId(ElementId),
    /// The page tore down its observers before the anchor appeared.
    #[error("observer for {0} closed before the anchor appeared")]
    ObserverClosed(ElementId),
}

/// Reads the source id of a thumbnail from its anchor.
#[derive(Clone)]
pub struct IdentifierExtractor {
    page: Arc<dyn Page>,
}

impl IdentifierExtractor {
    pub fn new(page: Arc<dyn Page>) -> Self {
        Self { page }
    }

    /// Always a future. It is ready on first poll when the anchor is
    /// already rendered, otherwise it waits on the element's subtree.
    pub fn extract(&self, element: ElementId) -> BoxFuture<'static, Result<SourceId, ExtractError>> {
        if let Some(result) = read_anchor(element, self.page.probe_anchor(element)) {
            return future::ready(result).boxed();
        }

        let page = self.page.clone();
        let mut changes = page.subtree_changes(element);
        async move {
            while changes.next().await.is_some() {
                if let Some(result) = read_anchor(element, page.probe_anchor(element)) {
                    // Dropping `changes` disconnects the observer.
                    return result;
                }
            }
            Err(ExtractError::ObserverClosed(element))
        }
        .boxed()
    }

    /// Synchronous probe, `None` while the anchor is still missing.
    pub fn try_extract(&self, element: ElementId) -> Option<Result<SourceId, ExtractError>> {
        read_anchor(element, self.page.probe_anchor(element))
    }
}

fn read_anchor(element: ElementId, probe: AnchorProbe) -> Option<Result<SourceId, ExtractError>> {
    match probe {
        AnchorProbe::Missing => None,
        AnchorProbe::Present(Some(id)) if !id.trim().is_empty() && id != "undefined" => {
            Some(Ok(id.trim().to_string()))
        }
        AnchorProbe::Present(_) => Some(Err(ExtractError::MissingId(element))),
    }
}

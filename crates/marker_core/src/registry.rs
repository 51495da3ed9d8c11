use std::collections::HashMap;
use std::fmt;

use crate::SourceId;

/// Opaque handle of a DOM element owned by the page. Holding one never keeps
/// the element alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "el#{}", self.0)
    }
}

/// Handle of a container whose children are thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u64);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct LinkInfo {
    source_id: SourceId,
    large: bool,
}

/// Many-to-many association between source ids and the elements displaying them.
///
/// An element belongs to at most one list. An id's entry disappears with its
/// last element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRegistry {
    by_source: HashMap<SourceId, Vec<ElementId>>,
    by_element: HashMap<ElementId, LinkInfo>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `element` to `source_id`. Idempotent; an element registered
    /// under another id is moved. Returns `true` if the element was not
    /// attached to `source_id` before.
    pub fn register(&mut self, element: ElementId, source_id: &str, large: bool) -> bool {
        if let Some(info) = self.by_element.get_mut(&element) {
            info.large = large;
            if info.source_id == source_id {
                return false;
            }
            let previous = std::mem::replace(&mut info.source_id, source_id.to_string());
            Self::strike(&mut self.by_source, &previous, element);
        } else {
            self.by_element.insert(
                element,
                LinkInfo {
                    source_id: source_id.to_string(),
                    large,
                },
            );
        }
        self.by_source
            .entry(source_id.to_string())
            .or_default()
            .push(element);
        true
    }

    /// Detach `element`. Returns the id it was attached to.
    pub fn unregister(&mut self, element: ElementId) -> Option<SourceId> {
        let info = self.by_element.remove(&element)?;
        Self::strike(&mut self.by_source, &info.source_id, element);
        Some(info.source_id)
    }

    fn strike(by_source: &mut HashMap<SourceId, Vec<ElementId>>, source_id: &str, element: ElementId) {
        if let Some(elements) = by_source.get_mut(source_id) {
            elements.retain(|el| *el != element);
            if elements.is_empty() {
                by_source.remove(source_id);
            }
        }
    }

    pub fn elements(&self, source_id: &str) -> &[ElementId] {
        self.by_source
            .get(source_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn source_id_of(&self, element: ElementId) -> Option<&str> {
        self.by_element
            .get(&element)
            .map(|info| info.source_id.as_str())
    }

    pub fn is_large(&self, element: ElementId) -> bool {
        self.by_element
            .get(&element)
            .is_some_and(|info| info.large)
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.by_source.contains_key(source_id)
    }

    /// Tracked source ids in ascending order.
    pub fn source_ids(&self) -> Vec<SourceId> {
        let mut ids: Vec<SourceId> = self.by_source.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.by_source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty()
    }

    pub fn element_count(&self) -> usize {
        self.by_element.len()
    }

    pub fn clear(&mut self) {
        self.by_source.clear();
        self.by_element.clear();
    }
}

use crate::{HostMaps, PostHost};

pub const CLASS_HANDLED: &str = "handled";
pub const CLASS_LARGE: &str = "large";
pub const CLASS_PARTIALLY_CHECKED: &str = "partially-checked";
pub const CLASS_CHECKED_UPLOADED: &str = "checked-uploaded";
pub const CLASS_CHECKED_MIXED: &str = "checked-mixed";
pub const CLASS_CHECKED_NOT_UPLOADED: &str = "checked-not-uploaded";

/// Status classes toggled by the visual updater.
pub const STATUS_CLASSES: [&str; 4] = [
    CLASS_PARTIALLY_CHECKED,
    CLASS_CHECKED_UPLOADED,
    CLASS_CHECKED_MIXED,
    CLASS_CHECKED_NOT_UPLOADED,
];

/// Status of one artwork summed up over the active hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregateStatus {
    pub num_posts: usize,
    pub is_checked: bool,
    pub is_some_host_missing: bool,
    pub is_partially_checked: bool,
}

impl AggregateStatus {
    pub fn compute(maps: &HostMaps, source_id: &str, hosts: &[PostHost]) -> Self {
        let mut status = AggregateStatus::default();
        for host in hosts {
            match maps.post_ids(*host, source_id) {
                Some(post_ids) => {
                    status.is_checked = true;
                    status.num_posts += post_ids.len();
                    if post_ids.is_empty() {
                        status.is_some_host_missing = true;
                    }
                }
                None => status.is_partially_checked = true,
            }
        }
        status
    }

    /// Flags to render, or `None` while no active host has reported yet.
    pub fn markers(&self, large: bool) -> Option<MarkerFlags> {
        if !self.is_checked {
            return None;
        }
        let uploaded = self.num_posts > 0;
        Some(MarkerFlags {
            large,
            partially_checked: self.is_partially_checked,
            checked_uploaded: uploaded && !self.is_some_host_missing,
            checked_mixed: uploaded && self.is_some_host_missing,
            checked_not_uploaded: !uploaded,
        })
    }
}

/// CSS state of one thumbnail element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkerFlags {
    pub large: bool,
    pub partially_checked: bool,
    pub checked_uploaded: bool,
    pub checked_mixed: bool,
    pub checked_not_uploaded: bool,
}

impl MarkerFlags {
    /// Every status class paired with whether it should be present.
    pub fn toggles(&self) -> [(&'static str, bool); 4] {
        [
            (CLASS_PARTIALLY_CHECKED, self.partially_checked),
            (CLASS_CHECKED_UPLOADED, self.checked_uploaded),
            (CLASS_CHECKED_MIXED, self.checked_mixed),
            (CLASS_CHECKED_NOT_UPLOADED, self.checked_not_uploaded),
        ]
    }

    pub fn class_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self
            .toggles()
            .into_iter()
            .filter_map(|(name, on)| on.then_some(name))
            .collect();
        if self.large {
            names.push(CLASS_LARGE);
        }
        names
    }
}

use crate::domain::model::{ChangeEvent, RangeSet, ServiceRegionKey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOutcome {
    Unchanged,
    Changed(ChangeEvent),
}

impl DiffOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, DiffOutcome::Changed(_))
    }
}

/// Element-wise comparison of two canonical sets. No sorting happens here.
pub fn diff(key: &ServiceRegionKey, old: &RangeSet, new: &RangeSet) -> DiffOutcome {
    if old.as_slice() == new.as_slice() {
        DiffOutcome::Unchanged
    } else {
        DiffOutcome::Changed(ChangeEvent::new(key.clone(), old.clone(), new.clone()))
    }
}

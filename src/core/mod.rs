pub mod diff;
pub mod dispatch;
pub mod partition;
pub mod watcher;

pub use crate::domain::model::{ChangeEvent, RangeSet, RunSummary, ServiceRegionKey};
pub use crate::domain::ports::{RangeLoader, RangeRepository, Sender};
pub use crate::utils::error::Result;

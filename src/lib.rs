pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{FileRepository, HttpRangeLoader, MemoryRepository, SlackSender};
pub use config::WatchConfig;
pub use crate::core::{dispatch::Dispatcher, watcher::RangeWatcher};
pub use domain::model::{ChangeEvent, RangeSet, RunSummary, ServiceRegionKey};
pub use utils::error::{Result, WatchError};

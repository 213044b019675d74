// Adapters layer: concrete implementations of the domain ports.

pub mod file;
pub mod http;
pub mod memory;
pub mod slack;
pub mod sns;

#[cfg(feature = "aws")]
pub mod dynamodb;

pub use file::FileRepository;
pub use http::{build_client, HttpRangeLoader, DEFAULT_RANGE_DOCUMENT_URL};
pub use memory::MemoryRepository;
pub use slack::SlackSender;
pub use sns::PubSubMessage;

#[cfg(feature = "aws")]
pub use dynamodb::DynamoRepository;
#[cfg(feature = "aws")]
pub use sns::SnsSender;

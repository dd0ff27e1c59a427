//! Ingestion queue adapters.

mod channel;

pub use channel::ChannelIngestionQueue;

//! Replicate image-generation adapter.

mod generator;

pub use generator::{ReplicateConfig, ReplicateImageGenerator, REPLICATE_API_BASE};

//! Generation handlers.
//!
//! Image generation is a paid feature: every operation passes through the
//! `GenerationGate` before reaching the provider.

mod create_prediction;
mod gate;
mod get_prediction;

pub use create_prediction::{
    CreatePredictionCommand, CreatePredictionHandler, MAX_DIMENSION, MIN_DIMENSION,
};
pub use gate::GenerationGate;
pub use get_prediction::{GetPredictionHandler, GetPredictionQuery};

//! HTTP adapter for image generation endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::GenerationAppState;
pub use routes::generation_routes;

//! Paystack REST adapter.

mod gateway;

pub use gateway::{PaystackConfig, PaystackGateway, PAYSTACK_API_BASE};

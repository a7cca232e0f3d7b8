//! HTTP route handlers.

pub mod health;
pub mod limits;
pub mod metrics;
pub mod purchases;

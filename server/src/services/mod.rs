//! Business logic behind the HTTP handlers.

pub mod analytics;
pub mod logo;
pub mod pipeline;
pub mod request;

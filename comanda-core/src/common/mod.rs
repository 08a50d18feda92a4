//! Cross-cutting concerns: errors and logging

pub mod error;
pub mod logger;

pub use error::{CoreError, CoreResult};

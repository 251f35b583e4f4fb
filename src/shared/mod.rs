pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, Platform};
pub use error::{AppError, ErrorCode, FieldErrors, Result};

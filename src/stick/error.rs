use thiserror::Error;

use crate::hal::HalError;

/// Errors raised by the stick reader.
#[derive(Debug, Error)]
pub enum StickError {
    /// The requested operation needs hardware the reader was not built with
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Configuring a channel on the backend failed
    #[error("Hardware error: {0}")]
    Hal(#[from] HalError),
}

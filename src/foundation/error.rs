/// Result alias used throughout the crate.
pub type ReelResult<T> = Result<T, ReelError>;

/// Error taxonomy for a reel render.
///
/// Every variant is fatal for the run; nothing is retried.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid configuration or a broken composition invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Missing, unreadable or undecodable input asset.
    #[error("asset error: {0}")]
    Asset(String),

    /// Font could not be resolved or loaded.
    #[error("font error: {0}")]
    Font(String),

    /// Encoder unavailable, encoder failure, or output not writable.
    #[error("encode error: {0}")]
    Encode(String),

    /// Context-wrapped error from a lower layer.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Asset`].
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`ReelError::Font`].
    pub fn font(msg: impl Into<String>) -> Self {
        Self::Font(msg.into())
    }

    /// Build a [`ReelError::Encode`].
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

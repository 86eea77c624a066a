//! Error type shared across the crate
//!
//! Shape problems in the correlation routine and the layers, bad configuration
//! values, and I/O or plotting failures all surface as [`Error`].

/// All errors that can occur within the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Kernel and input volumes disagree on the number of channels.
    #[error("channel mismatch: input has {input} channels, kernel has {kernel}")]
    ChannelMismatch { input: usize, kernel: usize },

    /// The kernel does not fit inside the (padded) input.
    #[error("kernel size {kernel} exceeds padded input size {padded}")]
    KernelTooLarge { kernel: usize, padded: usize },

    /// Stride must be at least 1.
    #[error("stride must be greater than 0")]
    InvalidStride,

    /// A flat buffer does not hold the number of elements its shape requires.
    #[error("element count mismatch: expected {expected} elements, got {got}")]
    ElementCountMismatch { expected: usize, got: usize },

    /// A configuration value is missing or out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Rendering backend failure.
    #[error("plot error: {0}")]
    Plot(String),
}

impl Error {
    /// Create an `InvalidConfig` error from any message.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::InvalidConfig(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

//! Error types for resource and collection operations.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong while configuring, resolving or evaluating
/// resources and collections.
#[derive(Debug, Error)]
pub enum Error {
    /// A collection or resource was configured in an invalid way, such as
    /// adding a second nested collection where only one is accepted.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A collection tree or a reference chain loops back on itself.
    #[error("circular reference: {0}")]
    CircularReference(String),

    /// A named reference does not resolve to a registered binding.
    #[error("unknown reference: {0}")]
    UnknownReference(String),

    /// A nested collection produced fewer elements than its declared size.
    #[error("collection declared size {declared} but produced {produced} elements")]
    Consistency {
        /// The size the nested collection reported.
        declared: usize,
        /// The number of elements iteration actually yielded.
        produced: usize,
    },

    /// An underlying I/O operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// An HTTP request for a URL-backed resource failed.
    #[cfg(feature = "url")]
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// A write was attempted against a resource whose value is already fixed.
    #[error("resource is immutable: {0}")]
    Immutable(String),

    /// The operation is not supported by this resource kind.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// The collection mutated structurally while an iterator was live.
    #[error("collection was modified during iteration")]
    ConcurrentModification,
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }
}

use thiserror::Error;

/// Canonical occex error taxonomy used across crates.
///
/// Classification guidance:
/// - [`OccexError::CatalogUnavailable`]: the remote snapshot search or
///   credential signing could not be completed; fatal before extraction starts
/// - [`OccexError::Fetch`]: a single partition fetch failed (credential
///   expiry, transient network fault, upstream unavailability); recoverable
///   exactly once via re-authorization
/// - [`OccexError::Serialization`]: the output artifact could not be written
/// - [`OccexError::InvalidConfig`]: run-configuration/schema contract violations
/// - [`OccexError::Unsupported`]: syntactically valid but intentionally
///   unimplemented behavior
/// - [`OccexError::Io`]: raw filesystem IO failures from std APIs
#[derive(Debug, Error)]
pub enum OccexError {
    /// Remote catalog search/signing failure. The caller has no local
    /// fallback; this aborts the run.
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),

    /// One partition's fetch failed. Carries the partition index so the
    /// extractor can bound its retry to that index.
    #[error("fetch failed for partition {partition}: {message}")]
    Fetch {
        /// Index of the partition whose fetch failed.
        partition: usize,
        /// Description of the underlying failure.
        message: String,
    },

    /// Output write could not complete.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Invalid or inconsistent configuration.
    ///
    /// Examples:
    /// - degenerate bounding box (`min >= max` on an axis)
    /// - sample probability outside `(0, 1]`
    /// - projection/predicate column missing from the snapshot schema
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Valid request for behavior intentionally out of scope.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Transparent std IO failures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl OccexError {
    /// Creates a catalog-unavailable error.
    #[must_use]
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::CatalogUnavailable(message.into())
    }

    /// Creates a fetch error for one partition.
    #[must_use]
    pub fn fetch(partition: usize, message: impl Into<String>) -> Self {
        Self::Fetch {
            partition,
            message: message.into(),
        }
    }

    /// True for the recoverable-once fetch class.
    #[must_use]
    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch { .. })
    }
}

/// Standard occex result alias.
pub type Result<T> = std::result::Result<T, OccexError>;

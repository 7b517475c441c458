//! Result and error types for Hallar.

use thiserror::Error;

/// Result type for Hallar operations
pub type HallarResult<T> = Result<T, HallarError>;

/// Errors that can occur in Hallar
#[derive(Debug, Clone, Error)]
pub enum HallarError {
    /// No element matched a query that required a match
    #[error("{message}")]
    ElementNotFound {
        /// Full failure message rendered from the query description
        message: String,
    },

    /// More elements matched than the query allowed, and the wait budget
    /// ran out before the surplus settled
    #[error("Ambiguous match, found {count} elements matching {description}")]
    AmbiguousMatch {
        /// Number of elements actually found
        count: usize,
        /// Query description
        description: String,
    },

    /// A previously located element no longer maps to a live DOM node.
    ///
    /// This is the only error family the core recognizes as recoverable;
    /// automatic reload (when enabled) intercepts exactly this variant.
    #[error("Stale element reference: {message}")]
    StaleElement {
        /// What the driver reported
        message: String,
    },

    /// A selector string the driver could not compile or execute
    #[error("Invalid selector {selector:?}: {message}")]
    InvalidSelector {
        /// The offending selector
        selector: String,
        /// Error message
        message: String,
    },

    /// Any other driver-level failure (crashed browser, lost connection).
    /// Fatal: never retried, never recovered.
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },
}

impl HallarError {
    /// Whether this error is the driver's invalid-element-reference signal.
    ///
    /// Only this family is eligible for stale-reference recovery; everything
    /// else propagates unmodified.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleElement { .. })
    }

    /// Construct a stale-reference error
    #[must_use]
    pub fn stale(message: impl Into<String>) -> Self {
        Self::StaleElement {
            message: message.into(),
        }
    }

    /// Construct a fatal driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }
}

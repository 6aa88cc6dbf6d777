//! Error types for U-Rack.

use thiserror::Error;

/// Errors raised when an optimizer is configured with unusable input.
///
/// Placement failures are never errors: an item that fits nowhere is
/// reported as unplaced and penalized by the fitness function.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// A configuration value is out of its valid range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// An input rectangle has unusable dimensions.
    #[error("Invalid rectangle {id}: {reason}")]
    InvalidRectangle {
        /// Index of the rectangle in the input list.
        id: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// An internal invariant was broken.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias used throughout U-Rack.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidConfig("max_containers must be at least 1".into());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: max_containers must be at least 1"
        );

        let err = Error::InvalidRectangle {
            id: 3,
            reason: "width must be positive".into(),
        };
        assert_eq!(err.to_string(), "Invalid rectangle 3: width must be positive");
    }
}

//! Crate-level error type
//!
//! Handshakes report refusals as [`Outcome`](crate::protocol::Outcome)
//! values. Only failures that abort an operation outright surface here.

use std::fmt;

use crate::queue::StoreError;

/// Failure that aborted a gateway operation
#[derive(Debug)]
pub enum GatewayError {
    /// The shared payload could not be admitted for fan-out
    Store(StoreError),
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GatewayError::Store(e) => write!(f, "Payload store error: {}", e),
        }
    }
}

impl std::error::Error for GatewayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GatewayError::Store(e) => Some(e),
        }
    }
}

impl From<StoreError> for GatewayError {
    fn from(e: StoreError) -> Self {
        GatewayError::Store(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_conversion_and_display() {
        let err: GatewayError = StoreError::Full { max_entries: 4 }.into();
        assert_eq!(
            err.to_string(),
            "Payload store error: payload store full (4 entries)"
        );
        assert!(err.source().is_some());
    }
}

//! Gateway errors

use std::time::Duration;

use fanout::AggregateError;
use thiserror::Error;

/// Failure of a cluster administration call
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The cluster rejected the call or it could not be sent
    #[error("{operation} failed: {message}")]
    Call {
        operation: &'static str,
        message: String,
    },

    /// The call did not finish before its deadline
    #[error("{operation} timed out after {}s", .after.as_secs_f64())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Several concurrent calls failed
    #[error(transparent)]
    Aggregate(#[from] AggregateError<GatewayError>),
}

impl GatewayError {
    pub fn call(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Call {
            operation,
            message: message.into(),
        }
    }

    /// Whether this error, or any error it aggregates, is a timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Call { .. } => false,
            Self::Aggregate(all) => all.failures().iter().any(Self::is_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = GatewayError::call("create_topics", "topic already exists");
        assert_eq!(err.to_string(), "create_topics failed: topic already exists");

        let err = GatewayError::Timeout {
            operation: "list_topics",
            after: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "list_topics timed out after 5s");
    }

    #[test]
    fn test_aggregate_timeout_detection() {
        let err = GatewayError::from(AggregateError::new(vec![
            GatewayError::call("describe_configs", "unknown topic"),
            GatewayError::Timeout {
                operation: "describe_configs",
                after: Duration::from_millis(500),
            },
        ]));
        assert!(err.is_timeout());
        assert!(err.to_string().starts_with("2 operations failed"));
    }
}

use serde::Serialize;
use std::fmt;

/// Why an operation did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The request itself was malformed. Nothing was looked up.
    InvalidRequest,
    /// No invoice matched the reference or id.
    NotFound,
    /// The stored invoice is inconsistent or cannot take a payment.
    InvalidInvoice,
    /// A business rule refused the operation.
    Rejected,
    /// Every check passed but the repository did not durably save the change.
    NotPersisted,
    Cancelled,
    /// The repository failed before any change was attempted.
    Unexpected,
}

/// The structured result of every handler: a success flag (an absent
/// failure), the ordered messages for the caller and an optional payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome<T> {
    pub failure: Option<FailureKind>,
    pub messages: Vec<String>,
    pub data: Option<T>,
}

impl<T> Outcome<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            failure: None,
            messages: vec![message.into()],
            data: Some(data),
        }
    }

    pub fn failure(kind: FailureKind, messages: Vec<String>) -> Self {
        Self {
            failure: Some(kind),
            messages,
            data: None,
        }
    }

    pub fn failure_with(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::failure(kind, vec![message.into()])
    }

    pub fn cancelled() -> Self {
        Self::failure_with(FailureKind::Cancelled, "The operation was cancelled.")
    }

    pub fn unexpected(error: impl fmt::Display) -> Self {
        Self::failure_with(FailureKind::Unexpected, error.to_string())
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn has_message(&self, message: &str) -> bool {
        self.messages.iter().any(|m| m == message)
    }

    /// All messages joined for single-line logging.
    pub fn summary(&self) -> String {
        self.messages.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_outcome() {
        let outcome = Outcome::success("Invoice created.", 7);
        assert!(outcome.is_success());
        assert_eq!(outcome.data, Some(7));
        assert!(outcome.has_message("Invoice created."));
    }

    #[test]
    fn test_failure_outcome_keeps_message_order() {
        let outcome: Outcome<()> = Outcome::failure(
            FailureKind::InvalidRequest,
            vec!["first".to_string(), "second".to_string()],
        );
        assert!(!outcome.is_success());
        assert_eq!(outcome.failure, Some(FailureKind::InvalidRequest));
        assert_eq!(outcome.summary(), "first; second");
        assert!(outcome.data.is_none());
    }

    #[test]
    fn test_unexpected_carries_error_text() {
        let err = std::io::Error::other("Database error");
        let outcome: Outcome<()> = Outcome::unexpected(err);
        assert_eq!(outcome.failure, Some(FailureKind::Unexpected));
        assert_eq!(outcome.messages, vec!["Database error".to_string()]);
    }
}

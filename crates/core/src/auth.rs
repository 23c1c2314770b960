use std::fmt::{Debug, Formatter};

use crate::{AppError, AppResult};

/// Authenticated operator context passed explicitly to every backend call.
#[derive(Clone, PartialEq, Eq)]
pub struct OperatorSession {
    subject: String,
    access_token: String,
}

impl OperatorSession {
    /// Creates an operator session from the operator subject and its bearer token.
    pub fn new(subject: impl Into<String>, access_token: impl Into<String>) -> AppResult<Self> {
        let subject = subject.into().trim().to_owned();
        let access_token = access_token.into().trim().to_owned();

        if subject.is_empty() {
            return Err(AppError::Validation(
                "operator subject must not be empty".to_owned(),
            ));
        }

        if access_token.is_empty() {
            return Err(AppError::Unauthorized(
                "operator access token must not be empty".to_owned(),
            ));
        }

        Ok(Self {
            subject,
            access_token,
        })
    }

    /// Returns the operator subject recorded in logs.
    #[must_use]
    pub fn subject(&self) -> &str {
        self.subject.as_str()
    }

    /// Returns the bearer token for the backend API.
    #[must_use]
    pub fn access_token(&self) -> &str {
        self.access_token.as_str()
    }
}

impl Debug for OperatorSession {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("OperatorSession")
            .field("subject", &self.subject)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::AppError;

    use super::OperatorSession;

    #[test]
    fn rejects_blank_token() {
        let result = OperatorSession::new("alice", "  ");
        assert!(matches!(result, Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn debug_output_redacts_token() {
        let session = OperatorSession::new("alice", "secret-token")
            .unwrap_or_else(|_| unreachable!());
        let rendered = format!("{session:?}");

        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("secret-token"));
    }
}

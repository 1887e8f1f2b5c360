// Error taxonomy for the bank management core.
// Every failure surfaces as a typed variant; the transport maps variants to
// HTTP statuses, the CLI prints them as-is.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BankError {
    /// Input had the wrong shape or type (e.g. a non-numeric amount).
    #[error("{0}")]
    Validation(String),

    /// A business rule rejected the operation (negative amount, overdraft
    /// limit exceeded, negative interest rate, wrong account variant).
    #[error("{0}")]
    DomainRule(String),

    /// No account matches the given owner name.
    #[error("no account found for '{name}'")]
    NotFound { name: String },

    /// The owner name is already taken; carries 3 free alternatives.
    #[error("name '{name}' already exists. Suggestions: {}", .suggestions.join(", "))]
    DuplicateName {
        name: String,
        suggestions: Vec<String>,
    },

    /// The backing store failed (I/O, corrupt data, database error).
    #[error("storage error: {0}")]
    Storage(String),

    /// Missing/invalid/expired token or insufficient role.
    #[error("{0}")]
    Auth(String),
}

impl From<rusqlite::Error> for BankError {
    fn from(err: rusqlite::Error) -> Self {
        BankError::Storage(err.to_string())
    }
}

impl From<std::io::Error> for BankError {
    fn from(err: std::io::Error) -> Self {
        BankError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for BankError {
    fn from(err: serde_json::Error) -> Self {
        BankError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_name_message_embeds_suggestions() {
        let err = BankError::DuplicateName {
            name: "Tom".to_string(),
            suggestions: vec!["Tom17".to_string(), "Tom42".to_string(), "Tom83".to_string()],
        };

        let msg = err.to_string();
        assert!(msg.contains("Tom17"));
        assert!(msg.contains("Tom42"));
        assert!(msg.contains("Tom83"));
    }

    #[test]
    fn test_sqlite_errors_become_storage_errors() {
        let err: BankError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, BankError::Storage(_)));
    }
}

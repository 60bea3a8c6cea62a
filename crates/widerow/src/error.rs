use thiserror::Error;

use crate::store::StoreError;

/// Errors surfaced by mapping operations.
///
/// Configuration problems (bad tags, schema mismatches) abort the calling
/// operation. `RowNotFound` and `ConditionCheckFailed` are domain errors a
/// caller is expected to branch on. Anything else from the store client is
/// passed through unchanged as `Store`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("no table declared in record tags")]
    MissingTable,
    #[error("invalid field tag: {0}")]
    Tag(String),
    #[error("invalid record shape: {0}")]
    InvalidRecord(String),
    #[error("primary key schema mismatch: {0}")]
    SchemaMismatch(String),
    #[error("table does not exist: {0}")]
    TableMissing(String),
    #[error("row not found")]
    RowNotFound,
    #[error("condition check failed: {0}")]
    ConditionCheckFailed(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for mapping operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_error_display() {
        let error = Error::Tag("unknown clause family `pkk`".to_string());
        assert_eq!(
            error.to_string(),
            "invalid field tag: unknown clause family `pkk`"
        );
    }

    #[test]
    fn test_row_not_found_display() {
        assert_eq!(Error::RowNotFound.to_string(), "row not found");
    }

    #[test]
    fn test_condition_check_failed_display() {
        let error = Error::ConditionCheckFailed("value is not greater".to_string());
        assert_eq!(
            error.to_string(),
            "condition check failed: value is not greater"
        );
    }

    #[test]
    fn test_store_error_passthrough_display() {
        let error = Error::from(StoreError::Transport("connection reset".to_string()));
        assert_eq!(error.to_string(), "store transport error: connection reset");
    }
}

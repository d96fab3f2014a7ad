use thiserror::Error;

/// Main error type for Ownreg
#[derive(Error, Debug)]
pub enum OwnregError {
    /// Database-related errors (the graph store is unreachable or a query failed)
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing or malformed query argument (e.g. a blank entity id)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Entity not present in the register
    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    /// Graph store failure that is not a plain SQLite error
    #[error("Graph store unavailable: {0}")]
    StoreUnavailable(String),

    /// A traversal produced more chains than the configured limit
    #[error("Result limit exceeded: more than {0} chains")]
    ResultLimitExceeded(usize),

    /// Import document / API payload parse errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// OpenCorporates transport errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<serde_json::Error> for OwnregError {
    fn from(err: serde_json::Error) -> Self {
        OwnregError::Parse(err.to_string())
    }
}

/// Convenient Result type using OwnregError
pub type Result<T> = std::result::Result<T, OwnregError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OwnregError::Config("Test error".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("Test error"));
    }

    #[test]
    fn test_error_from_rusqlite() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: OwnregError = rusqlite_err.into();
        assert!(matches!(err, OwnregError::Database(_)));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: OwnregError = io_err.into();
        assert!(matches!(err, OwnregError::Io(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: OwnregError = json_err.into();
        assert!(matches!(err, OwnregError::Parse(_)));
    }

    #[test]
    fn test_result_limit_display() {
        let err = OwnregError::ResultLimitExceeded(25);
        assert_eq!(err.to_string(), "Result limit exceeded: more than 25 chains");
    }
}

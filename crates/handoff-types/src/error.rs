use thiserror::Error;

/// Errors returned directly by routing operations.
///
/// Conflicts and missing entities are not errors here: they are reported as
/// `false` or as typed outcomes (see [`crate::result`]).
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors from routing store operations (used by the port trait in handoff-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),
}

impl From<RepositoryError> for RoutingError {
    fn from(err: RepositoryError) -> Self {
        RoutingError::Storage(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_error_display() {
        let err = RoutingError::InvalidArgument("no search criteria".to_string());
        assert_eq!(err.to_string(), "invalid argument: no search criteria");
    }

    #[test]
    fn test_repository_error_converts_to_storage() {
        let err: RoutingError = RepositoryError::Query("syntax error".to_string()).into();
        assert_eq!(err.to_string(), "storage error: query error: syntax error");
    }

    #[test]
    fn test_connection_error_converts_to_storage() {
        let err: RoutingError = RepositoryError::Connection.into();
        assert_eq!(err.to_string(), "storage error: database connection error");
    }
}

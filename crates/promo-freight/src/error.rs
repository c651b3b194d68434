//! Error types for Warehouse lookups

/// Errors from a [`WarehouseStore`](crate::WarehouseStore)
///
/// A missing Warehouse is not an error; stores return `Ok(None)` for it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// Backend could not be reached or refused the request
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// Caller deadline passed before the lookup finished
    #[error("deadline exceeded while getting Warehouse {name} in project {project}")]
    DeadlineExceeded { project: String, name: String },

    /// Caller cancelled the invocation
    #[error("lookup cancelled")]
    Cancelled,

    /// Any other backend failure
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Create deadline error for the Warehouse being fetched
    pub fn deadline_exceeded(project: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DeadlineExceeded {
            project: project.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let err = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(err.to_string(), "store unavailable: connection refused");

        let err = StoreError::deadline_exceeded("p", "w");
        assert_eq!(
            err.to_string(),
            "deadline exceeded while getting Warehouse w in project p"
        );
    }
}

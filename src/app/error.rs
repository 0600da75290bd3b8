use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("File already exists: {0}")]
    Conflict(String),

    #[error("Invalid file name: {0:?}")]
    InvalidName(String),

    #[error("Render failure: {0}")]
    RenderFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results with EditorError
pub type Result<T> = std::result::Result<T, EditorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: EditorError = io_err.into();
        assert!(matches!(err, EditorError::Io(_)));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: EditorError = json_err.into();
        assert!(matches!(err, EditorError::Json(_)));
    }

    #[test]
    fn test_error_display() {
        let err = EditorError::NotFound("notes".to_string());
        assert_eq!(err.to_string(), "File not found: notes");

        let err = EditorError::Conflict("bar".to_string());
        assert_eq!(err.to_string(), "File already exists: bar");

        let err = EditorError::InvalidName("  ".to_string());
        assert_eq!(err.to_string(), "Invalid file name: \"  \"");

        let err = EditorError::RenderFailure("unbalanced fence".to_string());
        assert_eq!(err.to_string(), "Render failure: unbalanced fence");
    }
}

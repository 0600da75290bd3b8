use std::path::Path;

use crate::app::error::{EditorError, Result};

/// Derive a store file name from a filesystem path: the file stem, so
/// `notes/todo.md` becomes `todo`.
///
/// Returns "Untitled" when no usable stem exists.
pub fn file_name_from_path(path: &str) -> String {
    Path::new(path)
        .file_stem()
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty() && *s != ".")
        .map(|s| s.to_string())
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Reject names the store cannot key on. Names are otherwise taken verbatim
/// and compared case-sensitively.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(EditorError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_path() {
        assert_eq!(file_name_from_path("/home/user/todo.md"), "todo");
        assert_eq!(file_name_from_path("README.markdown"), "README");
        assert_eq!(file_name_from_path("notes"), "notes");
        assert_eq!(file_name_from_path("archive.tar.gz"), "archive.tar");
    }

    #[test]
    fn test_file_name_from_path_edge_cases() {
        assert_eq!(file_name_from_path(""), "Untitled");
        assert_eq!(file_name_from_path("."), "Untitled");
        assert_eq!(file_name_from_path("/"), "Untitled");
        assert_eq!(file_name_from_path("/home/user/"), "user");
    }

    #[test]
    fn test_validate_name() {
        assert!(validate_name("notes").is_ok());
        assert!(validate_name(" padded ").is_ok());
        assert!(validate_name("Notes").is_ok());
        assert!(matches!(validate_name(""), Err(EditorError::InvalidName(_))));
        assert!(matches!(validate_name(" \t"), Err(EditorError::InvalidName(_))));
    }
}

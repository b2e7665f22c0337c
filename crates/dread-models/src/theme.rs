//! Theme name handling.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ThemeError {
    #[error("Theme '{0}' is empty after sanitization (use alphanumeric characters)")]
    Empty(String),
}

/// Turn a free-form theme into a file-name token.
///
/// Lower-cases, maps spaces to underscores and drops anything outside
/// `[a-z0-9_]`.
pub fn sanitize_theme(theme: &str) -> Result<String, ThemeError> {
    let token: String = theme
        .trim()
        .to_lowercase()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')
        .collect();

    if token.is_empty() {
        Err(ThemeError::Empty(theme.to_string()))
    } else {
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_theme() {
        assert_eq!(sanitize_theme("Haunted Forest!").unwrap(), "haunted_forest");
        assert_eq!(sanitize_theme("  yurei 2 ").unwrap(), "yurei_2");
        assert_eq!(sanitize_theme("Kuchisake-onna").unwrap(), "kuchisakeonna");
    }

    #[test]
    fn test_sanitize_theme_rejects_empty() {
        assert!(matches!(sanitize_theme("!!!"), Err(ThemeError::Empty(_))));
        assert!(sanitize_theme("   ").is_err());
        assert!(sanitize_theme("怪談").is_err());
    }
}

//! Small string helpers shared across the workspace.

/// Returns `None` when the string is empty, otherwise the string itself.
pub fn empty_to_none(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Trims the string and returns `None` when nothing remains.
pub fn trim_to_none(s: &str) -> Option<&str> {
    empty_to_none(s.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_to_none() {
        assert_eq!(empty_to_none(""), None);
        assert_eq!(empty_to_none("x"), Some("x"));
        assert_eq!(empty_to_none("  "), Some("  "));
    }

    #[test]
    fn test_trim_to_none() {
        assert_eq!(trim_to_none("  "), None);
        assert_eq!(trim_to_none(" x "), Some("x"));
    }
}

/// Treat an empty string the same as "unset" on read. Write paths should
/// never materialize `Some(String::new())`;
/// callers normalize through this helper when loading from storage or
/// parsing external input, and store `None` directly when writing.
pub fn normalize_empty(value: Option<String>) -> Option<String> {
    match value {
        Some(s) if s.is_empty() => None,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_becomes_none() {
        assert_eq!(normalize_empty(Some(String::new())), None);
        assert_eq!(normalize_empty(None), None);
        assert_eq!(normalize_empty(Some("x".to_string())), Some("x".to_string()));
    }
}

/// Normalize a key prefix to either `""` (tree root) or a key ending in exactly one `/`
pub fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("{trimmed}/")
    }
}

/// Build the absolute store key for a key relative to a normalized prefix
pub fn absolute_key(prefix: &str, relative_key: &str) -> String {
    format!("{prefix}{relative_key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_prefix_empty() {
        assert_eq!(normalize_prefix(""), "");
        assert_eq!(normalize_prefix("   "), "");
        assert_eq!(normalize_prefix("/"), "");
        assert_eq!(normalize_prefix(" /// "), "");
    }

    #[test]
    fn test_normalize_prefix_appends_single_slash() {
        assert_eq!(normalize_prefix("app"), "app/");
        assert_eq!(normalize_prefix("app/"), "app/");
        assert_eq!(normalize_prefix("  app/config//  "), "app/config/");
    }

    #[test]
    fn test_normalize_prefix_keeps_leading_slash() {
        assert_eq!(normalize_prefix("/app"), "/app/");
    }

    #[test]
    fn test_absolute_key() {
        assert_eq!(absolute_key("app/", "x"), "app/x");
        assert_eq!(absolute_key("", "x"), "x");
        assert_eq!(absolute_key("app/", ""), "app/");
    }
}

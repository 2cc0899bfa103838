//! Dialect resolution from an explicit request or a `version` statement

/// Version declared by the first substantive line of `text`, if any.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn declared_version(text: &str) -> Option<String> {
    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))?;
    line.strip_prefix("version ")
        .map(|rest| rest.trim().to_string())
}

/// Resolve the effective and declared versions of a document.
///
/// An explicit version wins, then the declared one, then `default`. The
/// declared version is reported even when it was overridden.
pub fn resolve(explicit: Option<&str>, text: &str, default: &str) -> (String, Option<String>) {
    let declared = declared_version(text);
    let effective = explicit
        .map(str::to_string)
        .or_else(|| declared.clone())
        .unwrap_or_else(|| default.to_string());
    (effective, declared)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_version() {
        assert_eq!(declared_version("version 1.0\n"), Some("1.0".to_string()));
        assert_eq!(
            declared_version("\n# comment\n   \n  version   1.1  \ntask"),
            Some("1.1".to_string())
        );
        assert_eq!(declared_version("task t {}\nversion 1.0"), None);
        assert_eq!(declared_version("versions 1.0"), None);
        assert_eq!(declared_version(""), None);
    }

    #[test]
    fn test_resolve() {
        assert_eq!(
            resolve(Some("1.1"), "version 1.0", "draft-2"),
            ("1.1".to_string(), Some("1.0".to_string()))
        );
        assert_eq!(
            resolve(None, "version development", "draft-2"),
            ("development".to_string(), Some("development".to_string()))
        );
        assert_eq!(
            resolve(None, "workflow w {}", "draft-2"),
            ("draft-2".to_string(), None)
        );
    }
}

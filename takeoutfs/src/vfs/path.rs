//! Helpers for slash-separated virtual paths.

/// Normalize a caller supplied path.
///
/// Leading and trailing separators are dropped and `"."` maps to the root (`""`).
pub fn normalize_path(path: &str) -> &str {
    let path = path.strip_prefix("./").unwrap_or(path);
    let path = path.trim_matches('/');
    if path == "." {
        ""
    } else {
        path
    }
}

/// Join a parent path and a local name.
pub fn join_path(parent: &str, name: &str) -> String {
    let parent = normalize_path(parent);
    let name = normalize_path(name);
    match (parent.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (false, true) => parent.to_string(),
        (false, false) => format!("{}/{}", parent, name),
    }
}

/// Last segment of a path.
pub fn base_name(path: &str) -> &str {
    let path = path.trim_end_matches('/');
    match path.rfind('/') {
        Some(i) => &path[i + 1..],
        None => path,
    }
}

/// Everything before the last segment.
pub fn parent_path(path: &str) -> &str {
    let path = path.trim_end_matches('/');
    match path.rfind('/') {
        Some(i) => &path[..i],
        None => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_root_forms() {
        assert_eq!(normalize_path(""), "");
        assert_eq!(normalize_path("."), "");
        assert_eq!(normalize_path("./"), "");
        assert_eq!(normalize_path("/"), "");
    }

    #[test]
    fn test_normalize_trims_separators() {
        assert_eq!(normalize_path("testdir/"), "testdir");
        assert_eq!(normalize_path("/a/b/"), "a/b");
        assert_eq!(normalize_path("./a/b"), "a/b");
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "a"), "a");
        assert_eq!(join_path("a/b", "c.jpg"), "a/b/c.jpg");
        assert_eq!(join_path("a/b/", "c.jpg"), "a/b/c.jpg");
        assert_eq!(join_path("a", ""), "a");
    }

    #[test]
    fn test_base_and_parent() {
        assert_eq!(base_name("a/b/c.jpg"), "c.jpg");
        assert_eq!(base_name("c.jpg"), "c.jpg");
        assert_eq!(base_name("a/b/"), "b");
        assert_eq!(parent_path("a/b/c.jpg"), "a/b");
        assert_eq!(parent_path("c.jpg"), "");
    }
}

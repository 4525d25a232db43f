//! Content path predicates
//!
//! Paths are rooted, `/`-separated and compared case-insensitively on
//! segment boundaries: `/a/b` contains `/a/b/c` but not `/a/bc`.

/// Check that a path is well formed: non-empty, rooted at `/`, free of empty
/// segments and of a trailing separator (the root itself excepted).
pub fn is_well_formed(path: &str) -> bool {
    if path.is_empty() || !path.starts_with('/') {
        return false;
    }
    if path == "/" {
        return true;
    }
    if path.ends_with('/') {
        return false;
    }
    !path[1..].split('/').any(|segment| segment.is_empty())
}

/// True when `ancestor` equals `path` or names one of its ancestors.
///
/// Case-insensitive; matches whole segments only.
pub fn is_ancestor_or_self(ancestor: &str, path: &str) -> bool {
    if ancestor == "/" {
        return path.starts_with('/');
    }
    if path.len() < ancestor.len() {
        return false;
    }
    let (head, rest) = path.split_at(ancestor.len());
    head.eq_ignore_ascii_case(ancestor) && (rest.is_empty() || rest.starts_with('/'))
}

/// Lock-conflict predicate: two paths conflict when they are equal or one
/// contains the other. Active tree-lock paths must never conflict pairwise.
pub fn paths_conflict(a: &str, b: &str) -> bool {
    is_ancestor_or_self(a, b) || is_ancestor_or_self(b, a)
}

/// Parent path, or `None` for the root
pub fn parent(path: &str) -> Option<&str> {
    if path == "/" {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some("/"),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Final segment of a path (the node name); empty for the root
pub fn name(path: &str) -> &str {
    path.rfind('/').map(|idx| &path[idx + 1..]).unwrap_or(path)
}

/// Rewrite `path` from the `old_root` subtree into `new_root`.
///
/// Returns `None` when `path` is not inside `old_root`.
pub fn reroot(path: &str, old_root: &str, new_root: &str) -> Option<String> {
    if !is_ancestor_or_self(old_root, path) {
        return None;
    }
    let rest = &path[old_root.len()..];
    Some(format!("{}{}", new_root, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========== Well-Formedness ==========

    #[test]
    fn test_well_formed_paths() {
        assert!(is_well_formed("/"));
        assert!(is_well_formed("/Root"));
        assert!(is_well_formed("/Root/Sites/Default"));
    }

    #[test]
    fn test_malformed_paths() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("Root"));
        assert!(!is_well_formed("/Root/"));
        assert!(!is_well_formed("/Root//Sites"));
    }

    // ========== Ancestor Tests ==========

    #[test]
    fn test_ancestor_or_self_exact() {
        assert!(is_ancestor_or_self("/a/b", "/a/b"));
    }

    #[test]
    fn test_ancestor_or_self_descendant() {
        assert!(is_ancestor_or_self("/a/b", "/a/b/c"));
        assert!(is_ancestor_or_self("/a", "/a/b/c/d"));
    }

    #[test]
    fn test_ancestor_respects_segment_boundary() {
        assert!(!is_ancestor_or_self("/a/b", "/a/bc"));
        assert!(!is_ancestor_or_self("/a/b", "/a/bc/d"));
    }

    #[test]
    fn test_ancestor_is_case_insensitive() {
        assert!(is_ancestor_or_self("/Root/Sites", "/root/sites/default"));
        assert!(is_ancestor_or_self("/A/B", "/a/b"));
    }

    #[test]
    fn test_root_is_ancestor_of_everything() {
        assert!(is_ancestor_or_self("/", "/"));
        assert!(is_ancestor_or_self("/", "/a"));
        assert!(is_ancestor_or_self("/", "/a/b/c"));
    }

    #[test]
    fn test_descendant_is_not_ancestor() {
        assert!(!is_ancestor_or_self("/a/b/c", "/a/b"));
    }

    // ========== Conflict Tests ==========

    #[test]
    fn test_conflict_equal_prefix_descendant() {
        assert!(paths_conflict("/a/b", "/a/b"));
        assert!(paths_conflict("/a/b", "/a/b/c"));
        assert!(paths_conflict("/a/b/c", "/a/b"));
    }

    #[test]
    fn test_no_conflict_siblings() {
        assert!(!paths_conflict("/a/b", "/a/c"));
        assert!(!paths_conflict("/a/b", "/a/bc"));
    }

    // ========== Structure Helpers ==========

    #[test]
    fn test_parent() {
        assert_eq!(parent("/"), None);
        assert_eq!(parent("/Root"), Some("/"));
        assert_eq!(parent("/Root/Sites"), Some("/Root"));
    }

    #[test]
    fn test_name() {
        assert_eq!(name("/Root/Sites"), "Sites");
        assert_eq!(name("/Root"), "Root");
        assert_eq!(name("/"), "");
    }

    #[test]
    fn test_reroot() {
        assert_eq!(
            reroot("/a/b/c", "/a/b", "/x/y").as_deref(),
            Some("/x/y/c")
        );
        assert_eq!(reroot("/a/b", "/a/b", "/x").as_deref(), Some("/x"));
        assert_eq!(reroot("/a/bc", "/a/b", "/x"), None);
    }

    #[test]
    fn test_reroot_case_insensitive_prefix() {
        assert_eq!(
            reroot("/Root/Docs/File", "/root/docs", "/Root/Archive").as_deref(),
            Some("/Root/Archive/File")
        );
    }
}

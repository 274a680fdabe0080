//! Key path helpers.
//!
//! Store keys are slash separated. Paths are built by concatenation
//! (`parent + "/" + key`) and never gain a redundant leading or trailing
//! slash from these helpers.

/// Joins `key` below `parent`.
pub fn join_path(
    parent: &str,
    key: &str,
) -> String {
    let parent = parent.trim_end_matches('/');
    let key = key.trim_matches('/');
    if key.is_empty() {
        return if parent.is_empty() { "/".to_string() } else { parent.to_string() };
    }
    format!("{parent}/{key}")
}

/// Last segment of a key path: `/dogu/nginx` -> `nginx`.
pub fn last_segment(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

/// `full_key` relative to `root_key`, without leading slash.
///
/// Keys outside `root_key` are returned with their leading slash stripped.
pub fn relative_key<'a>(
    root_key: &str,
    full_key: &'a str,
) -> &'a str {
    let root = root_key.trim_end_matches('/');
    match full_key.strip_prefix(root) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => full_key.trim_start_matches('/'),
    }
}

/// Non-empty segments of a key path.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Canonical absolute form: `a//b/` -> `/a/b`, empty -> `/`.
pub fn normalize_key(path: &str) -> String {
    let joined = segments(path).collect::<Vec<_>>().join("/");
    format!("/{joined}")
}

/// accept endpoints either like http://etcd:4001 or plain host:port
pub(crate) fn normalize_endpoint(endpoint: &str) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    }
}

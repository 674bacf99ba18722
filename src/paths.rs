//! `/`-separated path algebra shared by the identity resolver and the synthesizer.
//!
//! Workspace paths arrive from the note collaborator as URI-style paths (`/ws/a/note.md`), so
//! everything here works on `&str` rather than [std::path::Path]. That keeps folder identity
//! independent of the host separator and lets the same ids travel over the wire unchanged.

use std::{
    borrow::Cow,
    path::{Component, Path},
};

/// Utility function to replace separators and convert to unicode (via to_string_lossy) on os path.
pub fn os_path_to_string<P: AsRef<Path>>(os_path_ref: P) -> String {
    let res = os_path_ref
        .as_ref()
        .components()
        .map(|c| match c {
            Component::RootDir => Cow::from("".to_string()),
            _ => c.as_os_str().to_string_lossy(),
        })
        .collect::<Vec<_>>()
        .join("/");
    tracing::debug!(
        "os_path_to_string: turned {:?} into {}",
        os_path_ref.as_ref().components(),
        res
    );
    res
}

/// Strip trailing separators (except for the bare root) and collapse repeated separators.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let joined = segments(path).collect::<Vec<_>>().join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Non-empty segments of a path.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// The directory containing `path`.
///
/// `/ws/a/note.md` -> `/ws/a`, `/ws` -> `/`, `note.md` -> `` (the relative root). The root
/// itself (`/` or ``) has no parent.
pub fn parent(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) if trimmed.len() > 1 => Some("/"),
        Some(0) => None,
        Some(idx) => Some(&trimmed[..idx]),
        None if trimmed.is_empty() => None,
        None => Some(""),
    }
}

/// The last segment of a path, or an empty string for the root.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

pub fn join(dir: &str, name: &str) -> String {
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

/// True when `path` is `root` or lies underneath it.
pub fn is_within(path: &str, root: &str) -> bool {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        // Both "/" and "" as roots contain everything of the same flavour.
        return true;
    }
    path == root
        || path
            .strip_prefix(root)
            .map(|rest| rest.starts_with('/'))
            .unwrap_or(false)
}

/// `path` expressed relative to `root`. Paths outside of root are returned unchanged.
pub fn relative_to<'a>(path: &'a str, root: &str) -> &'a str {
    if !is_within(path, root) {
        return path;
    }
    let root = root.trim_end_matches('/');
    path[root.len()..].trim_start_matches('/')
}

/// True when any segment of `path` begins with `prefix` (the hidden-directory convention).
pub fn has_hidden_segment(path: &str, prefix: char) -> bool {
    segments(path).any(|segment| segment.starts_with(prefix))
}

/// True when the file name of `path` is one of `index_names`.
pub fn is_index_document<S: AsRef<str>>(path: &str, index_names: &[S]) -> bool {
    let name = basename(path);
    index_names.iter().any(|index| index.as_ref() == name)
}

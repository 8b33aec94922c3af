//! Module paths derived from file locations.

/// Map a root-relative source path to its module path.
///
/// `src/lib.rs` and `src/main.rs` are the crate root, `mod.rs` names its
/// directory, and everything else contributes its file stem. A leading
/// `src/` is dropped; other top-level directories (`tests/`, `benches/`)
/// keep their name as the first segment.
pub fn module_path_for(path: &str) -> String {
    let normalized = path.replace('\\', "/");
    let trimmed = normalized.trim_start_matches("./");
    let without_src = trimmed.strip_prefix("src/").unwrap_or(trimmed);

    let mut segments: Vec<&str> = without_src.split('/').filter(|s| !s.is_empty()).collect();
    if let Some(last) = segments.pop() {
        let stem = last.strip_suffix(".rs").unwrap_or(last);
        let is_root = segments.is_empty() && matches!(stem, "lib" | "main");
        if stem != "mod" && !is_root {
            segments.push(stem);
        }
    }

    std::iter::once("crate")
        .chain(segments)
        .collect::<Vec<_>>()
        .join("::")
}

/// Append an inline `mod name { .. }` to a module path.
pub fn child_module(parent: &str, name: &str) -> String {
    format!("{parent}::{name}")
}

/// Resolve a path written inside module `namespace` to a `crate::` path.
///
/// `crate`, `self` and leading `super` segments are honoured; any other path
/// is taken relative to `namespace`.
pub fn resolve_path(namespace: &str, segments: &[String]) -> String {
    let mut base: Vec<&str> = namespace.split("::").collect();
    let mut rest = segments;
    match segments.first().map(String::as_str) {
        Some("crate") => {
            base.truncate(1);
            rest = &segments[1..];
        }
        Some("self") => rest = &segments[1..],
        _ => {}
    }
    while let Some((first, tail)) = rest.split_first() {
        if first != "super" {
            break;
        }
        if base.len() > 1 {
            base.pop();
        }
        rest = tail;
    }
    base.into_iter()
        .map(str::to_string)
        .chain(rest.iter().cloned())
        .collect::<Vec<_>>()
        .join("::")
}

/// Last segment of a module path.
pub fn module_name(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

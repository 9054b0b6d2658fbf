//! `/`-delimited path arithmetic for the virtual filesystem.
//!
//! There are no symlinks and no filesystem to consult, so resolution is purely
//! lexical: `.` segments vanish, `..` pops the previous segment and is clamped
//! at the root.

/// Normalizes a path to absolute form: a single leading `/`, no empty, `.` or
/// `..` segments.
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    format!("/{}", segments.join("/"))
}

/// The directory containing `path`. The root is its own parent.
pub fn dirname(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
    }
}

/// Joins a specifier onto a directory. Absolute specifiers ignore the directory.
pub fn join(dir: &str, specifier: &str) -> String {
    if specifier.starts_with('/') {
        normalize(specifier)
    } else {
        normalize(&format!("{}/{}", dir, specifier))
    }
}

/// The extension of the final path segment, without the dot.
///
/// Dotfiles such as `.env` have no extension.
pub fn extension(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => Some(ext),
        _ => None,
    }
}

/// The final path segment.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_prefixes_root_and_collapses_segments() {
        assert_eq!(normalize("index.ts"), "/index.ts");
        assert_eq!(normalize("/index.ts"), "/index.ts");
        assert_eq!(normalize("src//./lib/../a.ts"), "/src/a.ts");
        assert_eq!(normalize("../../a.ts"), "/a.ts");
        assert_eq!(normalize(""), "/");
    }

    #[test]
    fn dirname_of_root_level_file_is_root() {
        assert_eq!(dirname("/index.ts"), "/");
        assert_eq!(dirname("/src/commands/ping.ts"), "/src/commands");
        assert_eq!(dirname("/"), "/");
    }

    #[test]
    fn join_resolves_relative_specifiers() {
        assert_eq!(join("/", "./a.ts"), "/a.ts");
        assert_eq!(join("/src/commands", "../util/format.ts"), "/src/util/format.ts");
        assert_eq!(join("/src", "/lib/x.js"), "/lib/x.js");
        assert_eq!(join("/src", "./a"), "/src/a");
    }

    #[test]
    fn extension_ignores_dotfiles() {
        assert_eq!(extension("/a.ts"), Some("ts"));
        assert_eq!(extension("/types/a.d.ts"), Some("ts"));
        assert_eq!(extension("/.env"), None);
        assert_eq!(extension("/Makefile"), None);
        assert_eq!(extension("/dir.v2/file"), None);
    }
}

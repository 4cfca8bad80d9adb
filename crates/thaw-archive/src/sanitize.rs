use std::path::{Component, Path, PathBuf};

use crate::error::FormatError;

/// Result of validating an archive entry path against an extraction root.
#[derive(Clone, Debug)]
pub struct SanitizedPath {
    pub original: String,
    pub relative: PathBuf,
    pub resolved: PathBuf,
}

/// Validate an entry path and resolve it under `root`.
///
/// Entry paths are `/`-separated and relative. Anything that could place a
/// file outside `root` is rejected rather than normalized away: parent
/// segments, absolute paths, drive prefixes, backslashes, empty or `.`
/// segments, and NUL bytes.
pub fn sanitize_entry_path(
    entry_path: &str,
    root: impl AsRef<Path>,
) -> Result<SanitizedPath, FormatError> {
    let root = root.as_ref();
    let reject = |reason| FormatError::UnsafePath {
        path: entry_path.to_string(),
        reason,
    };

    if entry_path.is_empty() {
        return Err(reject("empty path"));
    }
    if entry_path.contains('\0') {
        return Err(reject("contains NUL byte"));
    }
    if entry_path.contains('\\') {
        return Err(reject("contains backslash"));
    }
    if entry_path.starts_with('/') {
        return Err(reject("absolute path"));
    }

    let mut relative = PathBuf::new();
    for segment in entry_path.split('/') {
        match segment {
            "" => return Err(reject("empty segment")),
            "." => return Err(reject("current directory segment")),
            ".." => return Err(reject("parent directory segment")),
            _ => {}
        }
        // Catches platform-specific prefixes such as `C:` on Windows.
        let mut components = Path::new(segment).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => relative.push(segment),
            _ => return Err(reject("not a plain path segment")),
        }
    }

    let resolved = root.join(&relative);
    if !resolved.starts_with(root) {
        return Err(reject("escapes extraction root"));
    }

    Ok(SanitizedPath {
        original: entry_path.to_string(),
        relative,
        resolved,
    })
}

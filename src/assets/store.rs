use std::path::{Path, PathBuf};

use crate::foundation::error::{ReelError, ReelResult};

/// Normalize and validate an assets-root-relative path.
///
/// The normalized result uses `/` separators, removes `.` segments, and rejects absolute paths or
/// parent traversals (`..`).
pub fn normalize_rel_path(source: &str) -> ReelResult<String> {
    let s = source.replace('\\', "/");
    if s.starts_with('/') {
        return Err(ReelError::validation(format!(
            "asset path '{source}' must be relative"
        )));
    }
    if s.trim().is_empty() {
        return Err(ReelError::validation("asset path must be non-empty"));
    }

    let mut out = Vec::<&str>::new();
    for part in s.split('/') {
        if part.is_empty() || part == "." {
            continue;
        }
        if part == ".." {
            return Err(ReelError::validation(format!(
                "asset path '{source}' must not contain '..'"
            )));
        }
        out.push(part);
    }

    if out.is_empty() {
        return Err(ReelError::validation(format!(
            "asset path '{source}' must contain a file name"
        )));
    }

    Ok(out.join("/"))
}

/// Join a relative asset path onto `root` after normalization.
pub fn resolve_asset_path(root: &Path, source: &str) -> ReelResult<PathBuf> {
    let norm = normalize_rel_path(source)?;
    Ok(root.join(Path::new(&norm)))
}

/// Read an input asset fully into memory.
///
/// A missing file is an [`ReelError::Asset`] naming the role of the asset (`what`).
pub(crate) fn read_asset_bytes(path: &Path, what: &str) -> ReelResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        ReelError::asset(format!("failed to read {what} '{}': {e}", path.display()))
    })
}

/// Fail with [`ReelError::Asset`] unless `path` is an existing regular file.
pub(crate) fn require_file(path: &Path, what: &str) -> ReelResult<()> {
    if !path.is_file() {
        return Err(ReelError::asset(format!(
            "{what} '{}' does not exist or is not a file",
            path.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/assets/store.rs"]
mod tests;

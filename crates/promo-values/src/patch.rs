//! Values file patching
//!
//! Applies a set of `key -> value` changes to a YAML file on disk, keeping
//! everything else in the file as it was.

use crate::document::ValuesDocument;
use crate::error::PatchError;
use crate::path::ValuePath;
use indexmap::IndexMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Dot-path keys mapped to the string value to write, in application order
pub type Changes = IndexMap<String, String>;

/// Apply changes to document text
///
/// # Errors
/// Returns the first error hit; nothing is returned for partial edits.
pub fn apply_changes(source: &str, changes: &Changes) -> Result<String, PatchError> {
    let mut document = ValuesDocument::parse(source)?;
    for (key, value) in changes {
        let path: ValuePath = key.parse()?;
        document.set_scalar(&path, value)?;
        debug!(key = %key, value = %value, "Set values key");
    }
    Ok(document.into_string())
}

/// Apply changes to the values file at `path`
///
/// An empty change set performs no IO at all. A missing file is an error;
/// the file is never created. The file's permissions are kept.
///
/// # Errors
/// - `PatchError::Read` / `PatchError::Write` on IO failures
/// - Any error from [`apply_changes`]; the file is left untouched in that case
pub async fn update_values_file(path: &Path, changes: &Changes) -> Result<(), PatchError> {
    if changes.is_empty() {
        debug!(path = %path.display(), "No values changes");
        return Ok(());
    }

    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| PatchError::read_error(path, e))?;
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PatchError::read_error(path, e))?;

    let updated = apply_changes(&source, changes)?;

    tokio::fs::write(path, updated)
        .await
        .map_err(|e| PatchError::write_error(path, e))?;
    tokio::fs::set_permissions(path, metadata.permissions())
        .await
        .map_err(|e| PatchError::write_error(path, e))?;

    debug!(path = %path.display(), changes = changes.len(), "Updated values file");
    Ok(())
}

/// Join a relative path onto the working directory
///
/// The path is normalized lexically. Absolute paths and paths whose `..`
/// components climb above `work_dir` are rejected.
///
/// # Errors
/// Returns `PatchError::PathEscapesWorkDir` if the result would leave `work_dir`
pub fn secure_join(work_dir: &Path, relative: &str) -> Result<PathBuf, PatchError> {
    let escapes = || PatchError::PathEscapesWorkDir {
        path: PathBuf::from(relative),
    };

    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop().ok_or_else(escapes)?;
            }
            Component::RootDir | Component::Prefix(_) => return Err(escapes()),
        }
    }

    let mut joined = work_dir.to_path_buf();
    joined.extend(parts);
    Ok(joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn changes(pairs: &[(&str, &str)]) -> Changes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn apply_changes_in_order() {
        let out = apply_changes(
            "image:\n  repository: nginx\n  tag: old\n",
            &changes(&[("image.tag", "1.19.0"), ("image.repository", "docker.io/library/nginx")]),
        )
        .unwrap();
        assert_eq!(
            out,
            "image:\n  repository: docker.io/library/nginx\n  tag: 1.19.0\n"
        );
    }

    #[test]
    fn apply_changes_rejects_bad_key() {
        let err = apply_changes("a: 1\n", &changes(&[("a..b", "x")])).unwrap_err();
        assert!(matches!(err, PatchError::InvalidPath(_)));
    }

    #[test]
    fn secure_join_normalizes() {
        let dir = Path::new("/work");
        assert_eq!(
            secure_join(dir, "charts/app/./values.yaml").unwrap(),
            PathBuf::from("/work/charts/app/values.yaml")
        );
        assert_eq!(
            secure_join(dir, "charts/../values.yaml").unwrap(),
            PathBuf::from("/work/values.yaml")
        );
    }

    #[test]
    fn secure_join_rejects_escapes() {
        let dir = Path::new("/work");
        assert!(matches!(
            secure_join(dir, "../values.yaml"),
            Err(PatchError::PathEscapesWorkDir { .. })
        ));
        assert!(matches!(
            secure_join(dir, "a/../../values.yaml"),
            Err(PatchError::PathEscapesWorkDir { .. })
        ));
        assert!(matches!(
            secure_join(dir, "/etc/passwd"),
            Err(PatchError::PathEscapesWorkDir { .. })
        ));
    }
}

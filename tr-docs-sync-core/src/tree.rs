//! Local tree walking and local→remote path mapping.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::PipelineError;

#[derive(Clone, Copy)]
enum EntryKind {
    Dir,
    File,
}

/// Every directory below `root` (not `root` itself), parents before children.
pub fn local_directories(root: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    collect(root, EntryKind::Dir)
}

/// Every regular file below `root`, in a stable order.
pub fn local_files(root: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    collect(root, EntryKind::File)
}

fn collect(root: &Path, kind: EntryKind) -> Result<Vec<PathBuf>, PipelineError> {
    if !root.is_dir() {
        warn!(path = %root.display(), "Local tree does not exist, nothing to walk");
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| PipelineError::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        let file_type = entry.file_type();
        let wanted = match kind {
            EntryKind::Dir => file_type.is_dir(),
            EntryKind::File => file_type.is_file(),
        };
        if wanted {
            found.push(entry.into_path());
        }
    }
    debug!(path = %root.display(), count = found.len(), "Walked local tree");
    Ok(found)
}

/// `path` relative to `root`.
pub fn relative_to(root: &Path, path: &Path) -> Result<PathBuf, PipelineError> {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .map_err(|_| PipelineError::OutsideRoot {
            path: path.to_path_buf(),
            root: root.to_path_buf(),
        })
}

/// Join a local relative path onto a remote base folder using `/`.
///
/// Backslashes are normalised to `/` and duplicate separators collapse, so
/// `TR/Docs` + `2024/doc1.pdf` gives `TR/Docs/2024/doc1.pdf` on any platform.
pub fn remote_path_for(remote_base: &str, relative: &Path) -> String {
    let mut segments: Vec<String> = remote_base
        .replace('\\', "/")
        .split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    for component in relative.components() {
        if let Component::Normal(part) = component {
            let part = part.to_string_lossy().replace('\\', "/");
            segments.extend(part.split('/').filter(|s| !s.is_empty()).map(str::to_string));
        }
    }

    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_relative_path_onto_remote_base() {
        assert_eq!(
            remote_path_for("TR/Docs", Path::new("2024/doc1.pdf")),
            "TR/Docs/2024/doc1.pdf"
        );
    }

    #[test]
    fn normalises_backslashes_and_stray_separators() {
        assert_eq!(
            remote_path_for("TR\\Docs/", Path::new("2024\\doc1.pdf")),
            "TR/Docs/2024/doc1.pdf"
        );
        assert_eq!(remote_path_for("/TR//Docs", Path::new("a.pdf")), "TR/Docs/a.pdf");
    }

    #[test]
    fn empty_relative_path_maps_to_base() {
        assert_eq!(remote_path_for("TR/Docs", Path::new("")), "TR/Docs");
    }

    #[test]
    fn relative_to_strips_the_root() {
        let rel =
            relative_to(Path::new("downloads"), Path::new("downloads/2024/doc1.pdf")).unwrap();
        assert_eq!(rel, PathBuf::from("2024/doc1.pdf"));
        assert!(relative_to(Path::new("downloads"), Path::new("elsewhere/x.pdf")).is_err());
    }
}

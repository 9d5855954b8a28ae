//! Discovery of serialized markup documents under a resource root.

use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Every file below `root` whose name ends with `suffix`, sorted.
///
/// Symbolic links are followed. Unreadable entries are skipped with a warning.
pub fn find_documents(root: &Path, suffix: &str) -> Vec<PathBuf> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(root).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                warn!(%error, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .file_name()
            .to_str()
            .map(|name| name.ends_with(suffix) && name.len() > suffix.len())
            .unwrap_or(false);
        if matches {
            documents.push(entry.into_path());
        }
    }

    documents.sort();
    documents
}

/// `path` relative to `root`, or `path` itself when it lies elsewhere.
pub fn relative_path(path: &Path, root: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

//! Two-level directory walker
//!
//! Layout: `root/<subdirectory>/<document>.json`. Plain files at the top
//! level and non-JSON files at the second level are ignored. Entries are
//! visited in file-name order so repeated runs submit the same sequence.

use super::queue::WorkSender;
use super::{ErrorPolicy, FileFailure, IngestError, IngestResult};
use std::fs::DirEntry;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Extension of ingestible documents
pub const DOCUMENT_EXTENSION: &str = ".json";

/// What the walk submitted
#[derive(Debug, Default)]
pub struct WalkSummary {
    /// Subdirectories listed
    pub directories: usize,

    /// Documents handed to the queue
    pub submitted: usize,

    /// Subdirectories that could not be listed (skip policy only)
    pub failures: Vec<FileFailure>,
}

/// Enumerates the document tree and feeds the work queue
pub struct DirectoryWalker {
    root: PathBuf,
    policy: ErrorPolicy,
    shutdown: Arc<AtomicBool>,
}

impl DirectoryWalker {
    pub fn new(root: impl AsRef<Path>, policy: ErrorPolicy, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            policy,
            shutdown,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Submit every document under the root.
    ///
    /// Takes the sender by value: it is dropped on return, which closes the
    /// queue from the walker's side.
    pub fn walk(&self, sender: WorkSender) -> IngestResult<WalkSummary> {
        let top = sorted_entries(&self.root).map_err(|source| IngestError::RootUnreadable {
            path: self.root.clone(),
            source,
        })?;

        info!(root = %self.root.display(), "Walking document tree");

        let mut summary = WalkSummary::default();
        let subdirectories = top
            .into_iter()
            .filter(is_directory)
            .map(|entry| entry.path());
        for dir in subdirectories {
            if self.shutdown.load(Ordering::SeqCst) {
                debug!("Shutdown requested, stopping walk");
                break;
            }

            let files = match sorted_entries(&dir) {
                Ok(files) => files,
                Err(source) => {
                    let error = IngestError::DirectoryUnreadable {
                        path: dir.clone(),
                        source,
                    };
                    if self.policy == ErrorPolicy::Abort {
                        return Err(error);
                    }
                    warn!(path = %dir.display(), %error, "Skipping directory");
                    summary.failures.push(FileFailure { path: dir, error });
                    continue;
                }
            };
            summary.directories += 1;

            let documents = files
                .into_iter()
                .map(|entry| entry.path())
                .filter(|path| is_document(path));
            for file in documents {
                sender
                    .submit(file)
                    .map_err(|_| IngestError::Interrupted)?;
                summary.submitted += 1;
            }
        }

        info!(
            directories = summary.directories,
            documents = summary.submitted,
            "Walk complete"
        );
        Ok(summary)
    }
}

fn is_document(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(DOCUMENT_EXTENSION))
        .unwrap_or(false)
}

/// Symlinked directories are not followed
fn is_directory(entry: &DirEntry) -> bool {
    entry.file_type().map(|t| t.is_dir()).unwrap_or(false)
}

fn sorted_entries(dir: &Path) -> std::io::Result<Vec<DirEntry>> {
    let mut entries = std::fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|entry| entry.file_name());
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::WorkQueue;
    use std::fs;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let root = TempDir::new().unwrap();
        let p = root.path();
        fs::create_dir(p.join("beta")).unwrap();
        fs::create_dir(p.join("alpha")).unwrap();
        fs::write(p.join("top.json"), "{}").unwrap();
        fs::write(p.join("alpha/2.json"), "{}").unwrap();
        fs::write(p.join("alpha/1.json"), "{}").unwrap();
        fs::write(p.join("alpha/notes.txt"), "").unwrap();
        fs::write(p.join("beta/3.json"), "{}").unwrap();
        root
    }

    fn walker(root: &Path, policy: ErrorPolicy) -> DirectoryWalker {
        DirectoryWalker::new(root, policy, Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn test_walk_submits_second_level_json_in_order() {
        let root = tree();
        let queue = WorkQueue::new();
        let receiver = queue.receiver();

        let summary = walker(root.path(), ErrorPolicy::Skip)
            .walk(queue.sender())
            .unwrap();
        queue.close();

        assert_eq!(summary.directories, 2);
        assert_eq!(summary.submitted, 3);

        let mut names = Vec::new();
        while let Some(task) = receiver.next() {
            let rel = task.path.strip_prefix(root.path()).unwrap().to_path_buf();
            names.push((task.seq, rel));
        }
        assert_eq!(
            names,
            vec![
                (0, PathBuf::from("alpha/1.json")),
                (1, PathBuf::from("alpha/2.json")),
                (2, PathBuf::from("beta/3.json")),
            ]
        );
    }

    #[test]
    fn test_missing_root_is_fatal() {
        let root = TempDir::new().unwrap();
        let missing = root.path().join("nope");
        let queue = WorkQueue::new();

        let err = walker(&missing, ErrorPolicy::Skip)
            .walk(queue.sender())
            .unwrap_err();
        assert!(matches!(err, IngestError::RootUnreadable { .. }));
    }

    #[test]
    fn test_shutdown_stops_walk() {
        let root = tree();
        let queue = WorkQueue::new();
        let flag = Arc::new(AtomicBool::new(true));

        let summary = DirectoryWalker::new(root.path(), ErrorPolicy::Skip, flag)
            .walk(queue.sender())
            .unwrap();
        assert_eq!(summary.submitted, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_directory_not_followed() {
        let root = tree();
        std::os::unix::fs::symlink(root.path().join("alpha"), root.path().join("gamma")).unwrap();
        let queue = WorkQueue::new();

        let summary = walker(root.path(), ErrorPolicy::Skip)
            .walk(queue.sender())
            .unwrap();
        assert_eq!(summary.directories, 2);
        assert_eq!(summary.submitted, 3);
    }

    /// Make `dir` unlistable; `None` when permissions are not enforced (root)
    #[cfg(unix)]
    fn lock(dir: &Path) -> Option<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read_dir(dir).is_ok() {
            unlock(dir);
            return None;
        }
        Some(())
    }

    #[cfg(unix)]
    fn unlock(dir: &Path) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_skipped() {
        let root = tree();
        let locked = root.path().join("alpha");
        if lock(&locked).is_none() {
            return;
        }
        let queue = WorkQueue::new();

        let result = walker(root.path(), ErrorPolicy::Skip).walk(queue.sender());
        unlock(&locked);
        let summary = result.unwrap();

        assert_eq!(summary.directories, 1);
        assert_eq!(summary.submitted, 1);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].path, locked);
        assert!(matches!(
            summary.failures[0].error,
            IngestError::DirectoryUnreadable { .. }
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_aborts() {
        let root = tree();
        let locked = root.path().join("beta");
        if lock(&locked).is_none() {
            return;
        }
        let queue = WorkQueue::new();

        let result = walker(root.path(), ErrorPolicy::Abort).walk(queue.sender());
        unlock(&locked);

        assert!(matches!(
            result,
            Err(IngestError::DirectoryUnreadable { .. })
        ));
    }

    #[test]
    fn test_is_document() {
        assert!(is_document(Path::new("a/b.json")));
        assert!(!is_document(Path::new("a/b.json.bak")));
        assert!(!is_document(Path::new("a/b.txt")));
    }
}

//! Filesystem snapshots kept as JSON files, one per filesystem.
//!
//! `apply` routes the request through an [`InMemoryEngine`] loaded with the
//! stored snapshot and writes the result back, so the on-disk store follows
//! the same register decoding as any other engine.

use std::path::{Path, PathBuf};

use samqfs_mount::{
    ApplyOutcome, ApplyRequest, InMemoryEngine, MountApplier, MountError, MountResult, MountValues, SnapshotSource,
};
use tracing::info;

/// Snapshot store rooted at a directory.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Store rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding the snapshots.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Snapshot path of `fs_name`. The name must stay a single file name
    /// inside the root.
    fn path_for(&self, fs_name: &str) -> MountResult<PathBuf> {
        let valid = !fs_name.is_empty()
            && !fs_name.starts_with('.')
            && !fs_name.contains(['/', '\\', '\0'])
            && !fs_name.contains("..");
        if !valid {
            return Err(MountError::InvalidFilesystemName {
                fs_name: fs_name.to_string(),
            });
        }
        Ok(self.root.join(format!("{}.json", fs_name)))
    }

    /// Writes (or replaces) the snapshot of `fs_name`.
    pub fn save(&self, fs_name: &str, values: &MountValues) -> MountResult<()> {
        let path = self.path_for(fs_name)?;
        std::fs::create_dir_all(&self.root)?;
        std::fs::write(path, values.to_json()?)?;
        Ok(())
    }

    /// Names of stored filesystems, sorted.
    pub fn list(&self) -> MountResult<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

impl SnapshotSource for DirStore {
    fn snapshot(&self, fs_name: &str) -> MountResult<MountValues> {
        let path = self.path_for(fs_name)?;
        if !path.exists() {
            return Err(MountError::FilesystemNotFound {
                fs_name: fs_name.to_string(),
            });
        }
        let json = std::fs::read_to_string(path)?;
        MountValues::from_json(&json)
    }
}

impl MountApplier for DirStore {
    fn apply(&self, request: &ApplyRequest) -> MountResult<ApplyOutcome> {
        let engine = InMemoryEngine::default();
        engine.insert(request.fs_name.clone(), self.snapshot(&request.fs_name)?);
        let outcome = engine.apply(request)?;
        self.save(&request.fs_name, &engine.snapshot(&request.fs_name)?)?;
        info!(fs = %request.fs_name, dir = %self.root.display(), "snapshot updated");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use samqfs_mount::{load_options, Field, MountOptions};

    #[test]
    fn test_save_and_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        let mut values = MountValues::default();
        values.sam.high = 90;
        store.save("samfs1", &values).unwrap();
        assert_eq!(store.snapshot("samfs1").unwrap(), values);
    }

    #[test]
    fn test_missing_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        assert!(matches!(
            store.snapshot("nope"),
            Err(MountError::FilesystemNotFound { .. })
        ));
    }

    #[test]
    fn test_rejects_names_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("snapshots");
        let store = DirStore::new(&root);
        std::fs::write(dir.path().join("x.json"), "{}").unwrap();

        for name in ["../x", "a/b", "a\\b", "..", ".hidden", ""] {
            assert!(
                matches!(store.snapshot(name), Err(MountError::InvalidFilesystemName { .. })),
                "{:?} accepted",
                name
            );
            assert!(matches!(
                store.save(name, &MountValues::default()),
                Err(MountError::InvalidFilesystemName { .. })
            ));
        }
        assert_eq!(std::fs::read_to_string(dir.path().join("x.json")).unwrap(), "{}");
        assert!(!root.exists());
    }

    #[test]
    fn test_apply_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path().join("snapshots"));
        std::fs::write(dir.path().join("x.json"), "{}").unwrap();
        let mut opts = MountOptions::new();
        opts.set_hwm(85);
        let err = store.apply(&opts.into_apply_request("../x")).unwrap_err();
        assert!(matches!(err, MountError::InvalidFilesystemName { .. }));
        assert_eq!(std::fs::read_to_string(dir.path().join("x.json")).unwrap(), "{}");
    }

    #[test]
    fn test_list_sorted_json_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        store.save("qfs2", &MountValues::default()).unwrap();
        store.save("qfs1", &MountValues::default()).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();
        assert_eq!(store.list().unwrap(), vec!["qfs1", "qfs2"]);
    }

    #[test]
    fn test_list_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path().join("absent"));
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_apply_writes_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirStore::new(dir.path());
        store.save("samfs1", &MountValues::default()).unwrap();

        let mut opts = load_options(&store, "samfs1").unwrap();
        opts.set_hwm(85);
        opts.set_trace(false);
        let outcome = store.apply(&opts.into_apply_request("samfs1")).unwrap();

        assert_eq!(outcome.applied, vec![Field::Trace, Field::High]);
        let after = store.snapshot("samfs1").unwrap();
        assert_eq!(after.sam.high, 85);
        assert!(!after.basic.trace);
    }
}

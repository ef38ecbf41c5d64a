//! Local directory backend (a vault synced by a desktop client)

use super::{Entry, EntryKind, StorageError, StorageGateway, StorageResult};
use crate::path::VaultPath;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Vault rooted at a local directory
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn local(&self, path: &VaultPath) -> PathBuf {
        path.to_local(&self.root)
    }
}

impl StorageGateway for LocalStore {
    fn exists(&self, path: &VaultPath) -> StorageResult<bool> {
        self.local(path)
            .try_exists()
            .map_err(|e| StorageError::backend("exists", path, e))
    }

    /// Write to a temp file next to the target, then link it into place
    /// without clobbering; a crash mid-write leaves only the temp file.
    fn create(&self, path: &VaultPath, content: &str) -> StorageResult<()> {
        let target = self.local(path);
        let parent = target
            .parent()
            .ok_or_else(|| StorageError::backend("create", path, "path has no parent"))?;

        fs::create_dir_all(parent)
            .map_err(|e| StorageError::backend("create parent folders", path, e))?;

        let mut temp_file = NamedTempFile::new_in(parent)
            .map_err(|e| StorageError::backend("create temp file", path, e))?;
        temp_file
            .write_all(content.as_bytes())
            .map_err(|e| StorageError::backend("write temp file", path, e))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| StorageError::backend("sync temp file", path, e))?;

        temp_file.persist_noclobber(&target).map_err(|e| {
            if e.error.kind() == ErrorKind::AlreadyExists {
                StorageError::AlreadyExists(path.clone())
            } else {
                StorageError::backend("persist", path, e.error)
            }
        })?;

        // Fsync parent directory for durability (Unix only)
        #[cfg(unix)]
        {
            fs::File::open(parent)
                .and_then(|dir| dir.sync_all())
                .map_err(|e| StorageError::backend("sync parent folder", path, e))?;
        }

        Ok(())
    }

    fn read(&self, path: &VaultPath) -> StorageResult<String> {
        fs::read_to_string(self.local(path)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.clone()),
            _ => StorageError::backend("read", path, e),
        })
    }

    fn list_children(&self, path: &VaultPath) -> StorageResult<Vec<Entry>> {
        let dir = fs::read_dir(self.local(path)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.clone()),
            _ => StorageError::backend("list", path, e),
        })?;

        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| StorageError::backend("list", path, e))?;
            let file_type = entry
                .file_type()
                .map_err(|e| StorageError::backend("list", path, e))?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::debug!("Skipping non UTF-8 entry {:?}", entry.path());
                continue;
            };
            let kind = if file_type.is_dir() {
                EntryKind::Folder
            } else {
                EntryKind::File
            };
            entries.push(Entry { name, kind });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }
}

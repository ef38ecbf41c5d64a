//! In-memory backends: a plain map, and a dry-run overlay over a real store

use super::{Entry, EntryKind, StorageError, StorageGateway, StorageResult};
use crate::path::VaultPath;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tree {
    files: BTreeMap<VaultPath, String>,
    folders: BTreeSet<VaultPath>,
}

impl Tree {
    fn is_folder(&self, path: &VaultPath) -> bool {
        path.is_root()
            || self.folders.contains(path)
            || self.files.keys().chain(self.folders.iter()).any(|p| is_below(p, path))
    }

    fn children(&self, folder: &VaultPath) -> BTreeMap<String, EntryKind> {
        let mut children = BTreeMap::new();
        for (path, kind) in self
            .files
            .keys()
            .map(|p| (p, EntryKind::File))
            .chain(self.folders.iter().map(|p| (p, EntryKind::Folder)))
        {
            if !is_below(path, folder) {
                continue;
            }
            let rest: Vec<&str> = path.segments().skip(folder.segments().count()).collect();
            match rest.as_slice() {
                [name] => {
                    children.entry(name.to_string()).or_insert(kind);
                }
                [name, ..] => {
                    children.insert(name.to_string(), EntryKind::Folder);
                }
                [] => {}
            }
        }
        children
    }
}

/// `path` lies strictly inside `folder`
fn is_below(path: &VaultPath, folder: &VaultPath) -> bool {
    if folder.is_root() {
        return !path.is_root();
    }
    path.as_str()
        .strip_prefix(folder.as_str())
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Vault held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tree: Mutex<Tree>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seed of an existing file
    pub fn with_file(self, path: &str, content: &str) -> Self {
        if let Ok(path) = VaultPath::parse(path) {
            self.lock().files.insert(path, content.to_string());
        }
        self
    }

    /// Builder-style seed of an empty folder
    pub fn with_folder(self, path: &str) -> Self {
        if let Ok(path) = VaultPath::parse(path) {
            self.lock().folders.insert(path);
        }
        self
    }

    /// Snapshot of every stored file
    pub fn files(&self) -> BTreeMap<String, String> {
        self.lock()
            .files
            .iter()
            .map(|(p, c)| (p.as_str().to_string(), c.clone()))
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StorageGateway for MemoryStore {
    fn exists(&self, path: &VaultPath) -> StorageResult<bool> {
        let tree = self.lock();
        Ok(tree.files.contains_key(path) || tree.is_folder(path))
    }

    fn create(&self, path: &VaultPath, content: &str) -> StorageResult<()> {
        let mut tree = self.lock();
        if tree.files.contains_key(path) || tree.is_folder(path) {
            return Err(StorageError::AlreadyExists(path.clone()));
        }
        tree.files.insert(path.clone(), content.to_string());
        Ok(())
    }

    fn read(&self, path: &VaultPath) -> StorageResult<String> {
        self.lock()
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.clone()))
    }

    fn list_children(&self, path: &VaultPath) -> StorageResult<Vec<Entry>> {
        let tree = self.lock();
        if !tree.is_folder(path) {
            return Err(StorageError::NotFound(path.clone()));
        }
        Ok(tree
            .children(path)
            .into_iter()
            .map(|(name, kind)| Entry { name, kind })
            .collect())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Reads through to a real store; writes land in memory only
pub struct DryRunStore {
    inner: Box<dyn StorageGateway>,
    overlay: MemoryStore,
}

impl DryRunStore {
    pub fn new(inner: Box<dyn StorageGateway>) -> Self {
        Self {
            inner,
            overlay: MemoryStore::new(),
        }
    }
}

impl StorageGateway for DryRunStore {
    fn exists(&self, path: &VaultPath) -> StorageResult<bool> {
        if self.overlay.lock().files.contains_key(path) {
            return Ok(true);
        }
        self.inner.exists(path)
    }

    fn create(&self, path: &VaultPath, content: &str) -> StorageResult<()> {
        // Held across the inner check so concurrent creates see one winner
        let mut tree = self.overlay.lock();
        if tree.files.contains_key(path) || self.inner.exists(path)? {
            return Err(StorageError::AlreadyExists(path.clone()));
        }
        tree.files.insert(path.clone(), content.to_string());
        Ok(())
    }

    fn read(&self, path: &VaultPath) -> StorageResult<String> {
        match self.overlay.read(path) {
            Ok(content) => Ok(content),
            Err(StorageError::NotFound(_)) => self.inner.read(path),
            Err(e) => Err(e),
        }
    }

    fn list_children(&self, path: &VaultPath) -> StorageResult<Vec<Entry>> {
        let mut merged: BTreeMap<String, EntryKind> = match self.inner.list_children(path) {
            Ok(entries) => entries.into_iter().map(|e| (e.name, e.kind)).collect(),
            Err(StorageError::NotFound(_)) if self.overlay.lock().is_folder(path) => {
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        merged.extend(self.overlay.lock().children(path));
        Ok(merged
            .into_iter()
            .map(|(name, kind)| Entry { name, kind })
            .collect())
    }

    fn describe(&self) -> String {
        format!("dry-run over {}", self.inner.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn path(raw: &str) -> VaultPath {
        VaultPath::parse(raw).unwrap()
    }

    #[test]
    fn test_create_is_conditional() {
        let store = MemoryStore::new();
        store.create(&path("a/b.md"), "one").unwrap();
        let err = store.create(&path("a/b.md"), "two").unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
        assert_eq!(store.read(&path("a/b.md")).unwrap(), "one");
    }

    #[test]
    fn test_folders_are_implied_by_files() {
        let store = MemoryStore::new()
            .with_file("10_Weekly/_Weeks/w1.md", "")
            .with_file("10_Weekly/notes.md", "")
            .with_folder("20_Daily");

        assert!(store.exists(&path("10_Weekly")).unwrap());
        assert!(store.exists(&path("10_Weekly/_Weeks")).unwrap());
        assert!(!store.exists(&path("10_Week")).unwrap());

        let root = store.list_children(&VaultPath::root()).unwrap();
        assert_eq!(
            root,
            vec![Entry::folder("10_Weekly"), Entry::folder("20_Daily")]
        );

        let weekly = store.list_children(&path("10_Weekly")).unwrap();
        assert_eq!(
            weekly,
            vec![Entry::folder("_Weeks"), Entry::file("notes.md")]
        );

        assert!(matches!(
            store.list_children(&path("30_Monthly")),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_dry_run_never_writes_through() {
        let inner = MemoryStore::new().with_file("_Daily/_Journal/old.md", "old");
        let dry = DryRunStore::new(Box::new(inner));

        dry.create(&path("_Daily/_Journal/new.md"), "new").unwrap();
        assert!(dry.exists(&path("_Daily/_Journal/new.md")).unwrap());
        assert_eq!(dry.read(&path("_Daily/_Journal/old.md")).unwrap(), "old");

        let err = dry.create(&path("_Daily/_Journal/old.md"), "x").unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));

        let names: Vec<_> = dry
            .list_children(&path("_Daily/_Journal"))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["new.md", "old.md"]);
        assert_eq!(dry.describe(), "dry-run over memory");
    }

    #[test]
    fn test_dry_run_create_has_one_winner() {
        const THREADS: usize = 8;
        let dry = Arc::new(DryRunStore::new(Box::new(MemoryStore::new())));
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let dry = Arc::clone(&dry);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    dry.create(&path("race.md"), &i.to_string())
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(winners, 1);
        assert!(results
            .iter()
            .filter_map(|r| r.as_ref().err())
            .all(|e| matches!(e, StorageError::AlreadyExists(_))));
    }
}

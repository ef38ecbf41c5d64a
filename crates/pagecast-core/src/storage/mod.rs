//! Storage gateway - the only way the pipeline touches the vault
//!
//! The gateway is deliberately small: existence checks, conditional creation,
//! reads and folder listings. There is no overwrite and no delete; a page,
//! once created, is never touched again by this crate.
//!
//! `create` must fail with [`StorageError::AlreadyExists`] when the target is
//! occupied. Two invocations racing for the same period can both pass an
//! `exists` check; the conditional create is what keeps the loser from
//! clobbering the winner.

pub mod dropbox;
pub mod local;
pub mod memory;

pub use dropbox::DropboxStore;
pub use local::LocalStore;
pub use memory::{DryRunStore, MemoryStore};

use crate::path::VaultPath;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("'{0}' does not exist")]
    NotFound(VaultPath),

    #[error("'{0}' already exists")]
    AlreadyExists(VaultPath),

    #[error("timed out during {operation} on '{path}'")]
    Timeout { operation: String, path: VaultPath },

    #[error("{operation} failed on '{path}': {reason}")]
    Backend {
        operation: String,
        path: VaultPath,
        reason: String,
    },
}

impl StorageError {
    pub(crate) fn backend(operation: &str, path: &VaultPath, reason: impl ToString) -> Self {
        StorageError::Backend {
            operation: operation.to_string(),
            path: path.clone(),
            reason: reason.to_string(),
        }
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// One child of a listed folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

impl Entry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Folder,
        }
    }
}

/// Capability set the pipeline needs from a vault backend
pub trait StorageGateway: Send + Sync {
    /// Whether a file or folder exists at `path`
    fn exists(&self, path: &VaultPath) -> StorageResult<bool>;

    /// Create a file; fails with `AlreadyExists` rather than overwriting
    ///
    /// Creation is all-or-nothing: on any error no partial file is left at
    /// `path`.
    fn create(&self, path: &VaultPath, content: &str) -> StorageResult<()>;

    /// Read a file as UTF-8; `NotFound` if absent
    fn read(&self, path: &VaultPath) -> StorageResult<String>;

    /// Direct children of a folder; `NotFound` if the folder is absent
    fn list_children(&self, path: &VaultPath) -> StorageResult<Vec<Entry>>;

    /// Short label for logs
    fn describe(&self) -> String;
}

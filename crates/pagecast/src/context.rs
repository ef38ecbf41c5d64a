//! Global context for CLI commands

use crate::cli::GlobalArgs;
use anyhow::{Result, anyhow, bail};
use pagecast_core::Orchestrator;
use pagecast_core::config::{BackendKind, Config, find_config};
use pagecast_core::storage::{DropboxStore, DryRunStore, LocalStore, StorageGateway};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Loaded configuration plus the storage overrides given on the command line
pub struct Context {
    pub config_path: PathBuf,
    pub config: Config,
    vault: Option<String>,
    dropbox_token: Option<String>,
}

impl Context {
    /// Load `pagecast.toml` from `--config`, or the nearest one above the
    /// current directory
    ///
    /// # Errors
    ///
    /// Returns an error if no config file is found or it fails validation
    pub fn new(args: &GlobalArgs) -> Result<Self> {
        let config_path = match &args.config {
            Some(path) => path.clone(),
            None => find_config(&env::current_dir()?)?,
        };
        let config = Config::from_file(&config_path)?;
        tracing::debug!("Loaded config from '{}'", config_path.display());

        Ok(Self {
            config_path,
            config,
            vault: args.vault.clone(),
            dropbox_token: args.dropbox_token.clone(),
        })
    }

    /// Directory holding the config file
    pub fn config_dir(&self) -> &Path {
        self.config_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// The backend named in `[storage]`, rooted at `--vault` when given
    ///
    /// A relative local root is taken relative to the config file; without
    /// any root the config file's directory is the vault.
    pub fn storage(&self) -> Result<Box<dyn StorageGateway>> {
        let root = self
            .vault
            .clone()
            .or_else(|| self.config.storage.root.clone());

        match self.config.storage.backend {
            BackendKind::Local => {
                let root = match root {
                    Some(root) => self.config_dir().join(root),
                    None => self.config_dir().to_path_buf(),
                };
                if !root.is_dir() {
                    bail!("Vault root '{}' is not a directory", root.display());
                }
                tracing::debug!("Using local vault at '{}'", root.display());
                Ok(Box::new(LocalStore::new(root)))
            }
            BackendKind::Dropbox => {
                let token = self.dropbox_token.clone().ok_or_else(|| {
                    anyhow!("DROPBOX_ACCESS_TOKEN is not set (required by the dropbox backend)")
                })?;
                let root = root.unwrap_or_default();
                let timeout = Duration::from_secs(self.config.storage.timeout_secs);
                tracing::debug!("Using Dropbox vault at '{}'", root);
                Ok(Box::new(DropboxStore::new(token, &root, timeout)?))
            }
        }
    }

    /// An orchestrator over the configured storage; `dry_run` keeps every
    /// write in memory
    pub fn orchestrator(&self, dry_run: bool) -> Result<Orchestrator> {
        let storage = self.storage()?;
        let storage: Arc<dyn StorageGateway> = if dry_run {
            Arc::new(DryRunStore::new(storage))
        } else {
            Arc::from(storage)
        };
        Ok(Orchestrator::new(self.config.clone(), storage)?)
    }
}

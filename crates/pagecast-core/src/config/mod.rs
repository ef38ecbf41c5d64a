//! `pagecast.toml` loading and discovery

pub mod model;

pub use model::{
    BackendKind, CadenceKind, Config, PriorConfig, SequenceConfig, StorageConfig, TemplateConfig,
    VaultConfig,
};

use crate::error::{PagecastError, Result};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "pagecast.toml";

/// Find `pagecast.toml` in `start` or the nearest ancestor holding one
pub fn find_config(start: &Path) -> Result<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
        .ok_or(PagecastError::ConfigNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagecast_testkit::temp_dir_in_workspace;

    #[test]
    fn test_find_config_walks_ancestors() {
        let temp = temp_dir_in_workspace();
        let nested = temp.path().join("a/b/c");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "").unwrap();

        let found = find_config(&nested).unwrap();
        assert_eq!(found, temp.path().join(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_find_config_prefers_nearest() {
        let temp = temp_dir_in_workspace();
        let nested = temp.path().join("vault");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "").unwrap();
        std::fs::write(nested.join(CONFIG_FILE_NAME), "").unwrap();

        assert_eq!(find_config(&nested).unwrap(), nested.join(CONFIG_FILE_NAME));
    }
}

//! Vault-relative path handling
//!
//! Every storage backend addresses pages by a [`VaultPath`]: a relative path
//! with `/` separators, validated once at construction so that no backend ever
//! sees an absolute path, an empty segment, or a `.`/`..` traversal.
//!
//! ```rust
//! use pagecast_core::path::VaultPath;
//!
//! let folder = VaultPath::parse("10_Weekly/_Weekly-Maps").unwrap();
//! let page = folder.join("Weekly Map 2026-10-25.md").unwrap();
//! assert_eq!(page.as_str(), "10_Weekly/_Weekly-Maps/Weekly Map 2026-10-25.md");
//! assert_eq!(page.file_stem(), Some("Weekly Map 2026-10-25"));
//!
//! assert!(VaultPath::parse("/etc/passwd").is_err());
//! assert!(VaultPath::parse("notes/../../secrets").is_err());
//! ```

use crate::error::{PagecastError, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Validated vault-relative path. The empty path is the vault root.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VaultPath {
    inner: String,
}

impl VaultPath {
    /// The vault root
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a `/` separated relative path
    ///
    /// A single trailing `/` is tolerated; anything else that would make the
    /// path ambiguous is rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.strip_suffix('/').unwrap_or(raw);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        if trimmed.starts_with('/') || has_drive_prefix(trimmed) {
            return Err(invalid(raw, "path cannot be absolute or rooted"));
        }

        for segment in trimmed.split('/') {
            validate_segment(segment).map_err(|reason| invalid(raw, reason))?;
        }

        Ok(Self {
            inner: trimmed.to_string(),
        })
    }

    /// Append a single segment (a file or folder name)
    pub fn join(&self, segment: &str) -> Result<Self> {
        validate_segment(segment).map_err(|reason| invalid(segment, reason))?;

        let inner = if self.inner.is_empty() {
            segment.to_string()
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Ok(Self { inner })
    }

    pub fn is_root(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|s| !s.is_empty())
    }

    /// Parent folder; `None` for the root
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        match self.inner.rfind('/') {
            Some(idx) => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            None => Some(Self::root()),
        }
    }

    /// Last segment; `None` for the root
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.inner.rsplit('/').next()
    }

    /// Last segment without its final extension
    pub fn file_stem(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rfind('.') {
            Some(0) | None => Some(name),
            Some(idx) => Some(&name[..idx]),
        }
    }

    /// Map onto a local directory tree
    pub fn to_local(&self, root: &Path) -> PathBuf {
        self.segments().fold(root.to_path_buf(), |acc, s| acc.join(s))
    }
}

impl fmt::Display for VaultPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.inner)
        }
    }
}

impl Serialize for VaultPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.inner)
    }
}

/// Check that a string is usable as one path segment
///
/// Rejects empty names, `.`/`..`, separators of either platform, and NUL.
pub fn validate_segment(segment: &str) -> std::result::Result<(), &'static str> {
    if segment.is_empty() {
        return Err("path cannot contain empty segments");
    }
    if segment == "." {
        return Err("path cannot contain current directory (.)");
    }
    if segment == ".." {
        return Err("path cannot contain parent directory (..)");
    }
    if segment.contains('/') || segment.contains('\\') {
        return Err("segment cannot contain path separators");
    }
    if segment.contains('\0') {
        return Err("segment cannot contain NUL");
    }
    Ok(())
}

/// `C:` style prefixes are absolute on Windows even without a separator
fn has_drive_prefix(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

fn invalid(path: &str, reason: &str) -> PagecastError {
    PagecastError::InvalidPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relative() {
        let path = VaultPath::parse("a/b/c.md").unwrap();
        assert_eq!(path.as_str(), "a/b/c.md");
        assert_eq!(path.segments().collect::<Vec<_>>(), vec!["a", "b", "c.md"]);
    }

    #[test]
    fn test_parse_trailing_slash() {
        assert_eq!(VaultPath::parse("a/b/").unwrap().as_str(), "a/b");
    }

    #[test]
    fn test_parse_empty_is_root() {
        assert!(VaultPath::parse("").unwrap().is_root());
        assert!(VaultPath::parse("/").unwrap().is_root());
    }

    #[test]
    fn test_dangerous_path_matrix() {
        let cases = vec![
            ("/tmp", "absolute or rooted"),
            ("/etc/passwd", "absolute or rooted"),
            ("C:/Windows", "absolute or rooted"),
            ("../foo", "parent directory"),
            ("foo/../bar", "parent directory"),
            ("./foo", "current directory"),
            ("foo//bar", "empty segments"),
            ("foo\\bar", "separators"),
        ];

        for (raw, expected) in cases {
            let err = VaultPath::parse(raw).unwrap_err().to_string();
            assert!(
                err.contains(expected),
                "'{}' should be rejected with '{}', got: {}",
                raw,
                expected,
                err
            );
        }
    }

    #[test]
    fn test_join_rejects_separator() {
        let root = VaultPath::root();
        assert!(root.join("a/b").is_err());
        assert!(root.join("..").is_err());
        assert_eq!(root.join("a").unwrap().as_str(), "a");
    }

    #[test]
    fn test_parent_and_names() {
        let path = VaultPath::parse("_Daily/_Journal/Oct 18, 2026.md").unwrap();
        assert_eq!(path.parent().unwrap().as_str(), "_Daily/_Journal");
        assert_eq!(path.file_name(), Some("Oct 18, 2026.md"));
        assert_eq!(path.file_stem(), Some("Oct 18, 2026"));

        let top = VaultPath::parse("page.md").unwrap();
        assert!(top.parent().unwrap().is_root());
        assert!(VaultPath::root().parent().is_none());
    }

    #[test]
    fn test_file_stem_dotfile() {
        let path = VaultPath::parse(".obsidian").unwrap();
        assert_eq!(path.file_stem(), Some(".obsidian"));
    }

    #[test]
    fn test_to_local() {
        let path = VaultPath::parse("a/b.md").unwrap();
        assert_eq!(
            path.to_local(Path::new("/vault")),
            Path::new("/vault").join("a").join("b.md")
        );
    }
}

//! Destination paths for rendered pages
//!
//! A page's location is the template's folder resolved against the vault,
//! plus its file-name rule rendered for one period. Folder resolution may
//! list the vault; [`compute_path`] itself is pure, so the same template and
//! period always yield the same location.
//!
//! Sequenced templates name pages `<prefix><N><rest>`. The running number is
//! the only part of such a name that depends on vault contents, so a page is
//! found again by matching every other part.

use crate::error::{PagecastError, Result};
use crate::path::{validate_segment, VaultPath};
use crate::period::Period;
use crate::storage::{EntryKind, StorageError, StorageGateway};
use crate::template::{resolve, Block, RenderContext, TemplatePage};
use std::fmt;

/// Placeholder that receives a sequenced template's running number
pub const SEQUENCE: &str = "sequence";

/// One segment of a folder spec
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderSegment {
    /// Folder with exactly this name (created on demand)
    Exact(String),
    /// The one existing child folder whose name ends with this suffix
    Suffix(String),
}

/// Folder location of a template, e.g. `*_Weekly/_Weekly-Maps`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FolderSpec {
    segments: Vec<FolderSegment>,
}

impl FolderSpec {
    /// Parse a `/` separated spec; the empty spec is the vault root
    pub fn parse(raw: &str) -> std::result::Result<Self, String> {
        let trimmed = raw.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        let mut segments = Vec::new();
        for segment in trimmed.split('/') {
            match segment.strip_prefix('*') {
                Some(suffix) => {
                    if suffix.contains('*') {
                        return Err(format!("'{}': only a leading '*' is supported", segment));
                    }
                    if !suffix.is_empty() {
                        validate_segment(suffix).map_err(|e| format!("'{}': {}", segment, e))?;
                    }
                    segments.push(FolderSegment::Suffix(suffix.to_string()));
                }
                None => {
                    validate_segment(segment).map_err(|e| format!("'{}': {}", segment, e))?;
                    segments.push(FolderSegment::Exact(segment.to_string()));
                }
            }
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[FolderSegment] {
        &self.segments
    }
}

impl fmt::Display for FolderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "/");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            match segment {
                FolderSegment::Exact(name) => write!(f, "{}", name)?,
                FolderSegment::Suffix(suffix) => write!(f, "*{}", suffix)?,
            }
        }
        Ok(())
    }
}

/// Resolve `spec` to a concrete folder, listing the vault for `*` segments
///
/// Exact segments are taken as written and need not exist yet.
pub fn resolve_folder(storage: &dyn StorageGateway, spec: &FolderSpec) -> Result<VaultPath> {
    let mut current = VaultPath::root();

    for segment in &spec.segments {
        current = match segment {
            FolderSegment::Exact(name) => current.join(name)?,
            FolderSegment::Suffix(suffix) => {
                let pattern = format!("*{}", suffix);
                let children = match storage.list_children(&current) {
                    Ok(children) => children,
                    Err(StorageError::NotFound(_)) => {
                        return Err(PagecastError::FolderNotFound {
                            parent: current.to_string(),
                            pattern,
                        });
                    }
                    Err(e) => return Err(e.into()),
                };

                let mut matches: Vec<String> = children
                    .into_iter()
                    .filter(|entry| entry.kind == EntryKind::Folder && entry.name.ends_with(suffix.as_str()))
                    .map(|entry| entry.name)
                    .collect();

                match matches.len() {
                    0 => {
                        return Err(PagecastError::FolderNotFound {
                            parent: current.to_string(),
                            pattern,
                        });
                    }
                    1 => current.join(&matches.remove(0))?,
                    _ => {
                        return Err(PagecastError::FolderAmbiguous {
                            pattern,
                            candidates: matches,
                        });
                    }
                }
            }
        };
        tracing::debug!("Resolved folder segment to '{}'", current);
    }

    Ok(current)
}

/// Values a file-name rule may reference: `template`, `period.*`, `fields.*`
pub fn path_context(page: &TemplatePage, period: &Period) -> RenderContext {
    let mut context = RenderContext::new();
    context.insert("template", page.name.as_str());
    context.insert_period("period", period);
    for (key, value) in &page.fields {
        context.insert(format!("fields.{}", key), value.as_str());
    }
    context
}

/// Rendered file name of one period's page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileName {
    Fixed(String),
    /// `<head><N><tail>` for a running number `N`
    Numbered { head: String, tail: String },
}

impl FileName {
    /// The name for running number `number`; fixed names ignore it
    pub fn with_number(&self, number: u32) -> String {
        match self {
            FileName::Fixed(name) => name.clone(),
            FileName::Numbered { head, tail } => format!("{}{}{}", head, number, tail),
        }
    }

    /// Whether `name` is this file name for some running number
    pub fn matches(&self, name: &str) -> bool {
        match self {
            FileName::Fixed(fixed) => fixed == name,
            FileName::Numbered { head, tail } => name
                .strip_prefix(head.as_str())
                .and_then(|rest| rest.strip_suffix(tail.as_str()))
                .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())),
        }
    }
}

impl fmt::Display for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileName::Fixed(name) => write!(f, "{}", name),
            FileName::Numbered { head, tail } => write!(f, "{}<N>{}", head, tail),
        }
    }
}

/// Folder and file name of one period's page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    pub folder: VaultPath,
    pub file_name: FileName,
}

impl PageLocation {
    /// Path of the page numbered `number` (fixed names ignore the number)
    pub fn path(&self, number: u32) -> Result<VaultPath> {
        self.folder.join(&self.file_name.with_number(number))
    }

    /// The page already stored at this location, if any
    pub fn find_existing(&self, storage: &dyn StorageGateway) -> Result<Option<VaultPath>> {
        match &self.file_name {
            FileName::Fixed(name) => {
                let path = self.folder.join(name)?;
                Ok(storage.exists(&path)?.then_some(path))
            }
            FileName::Numbered { .. } => {
                let children = match storage.list_children(&self.folder) {
                    Ok(children) => children,
                    Err(StorageError::NotFound(_)) => return Ok(None),
                    Err(e) => return Err(e.into()),
                };
                let mut names: Vec<String> = children
                    .into_iter()
                    .filter(|entry| entry.kind == EntryKind::File && self.file_name.matches(&entry.name))
                    .map(|entry| entry.name)
                    .collect();
                names.sort();
                names
                    .first()
                    .map(|name| self.folder.join(name))
                    .transpose()
            }
        }
    }
}

impl fmt::Display for PageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.folder.is_root() {
            write!(f, "{}", self.file_name)
        } else {
            write!(f, "{}/{}", self.folder, self.file_name)
        }
    }
}

/// Location of `page` for `period` inside the resolved `folder`
pub fn compute_path(page: &TemplatePage, folder: &VaultPath, period: &Period) -> Result<PageLocation> {
    let context = path_context(page, period);
    let render = |blocks: &[Block]| -> Result<String> {
        let resolution = resolve(blocks, &context);
        if !resolution.is_complete() {
            return Err(PagecastError::UnresolvedRequiredPlaceholders {
                template: page.name.clone(),
                names: resolution.unresolved_required.into_iter().collect(),
            });
        }
        Ok(resolution.text)
    };

    let number_at = page
        .file_name
        .iter()
        .position(|block| block.as_placeholder().is_some_and(|p| p.name == SEQUENCE));
    let file_name = match number_at {
        None => FileName::Fixed(render(&page.file_name)?.trim().to_string()),
        Some(at) => FileName::Numbered {
            head: render(&page.file_name[..at])?.trim_start().to_string(),
            tail: render(&page.file_name[at + 1..])?.trim_end().to_string(),
        },
    };

    let sample = file_name.with_number(1);
    validate_segment(&sample).map_err(|reason| PagecastError::InvalidPath {
        path: sample.clone(),
        reason: format!("file name of template '{}' {}", page.name, reason),
    })?;

    Ok(PageLocation {
        folder: folder.clone(),
        file_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::period::Cadence;
    use crate::storage::MemoryStore;
    use crate::template::TemplateRegistry;
    use chrono::NaiveDate;

    fn load(toml: &str, name: &str) -> TemplatePage {
        let config = Config::from_toml_str(toml).unwrap();
        let storage = MemoryStore::new();
        TemplateRegistry::new(&config, &storage).load(name).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_folder_spec_parse() {
        let spec = FolderSpec::parse("*_Weekly/_Weekly-Maps").unwrap();
        assert_eq!(
            spec.segments(),
            &[
                FolderSegment::Suffix("_Weekly".to_string()),
                FolderSegment::Exact("_Weekly-Maps".to_string()),
            ]
        );
        assert_eq!(spec.to_string(), "*_Weekly/_Weekly-Maps");

        assert!(FolderSpec::parse("").unwrap().segments().is_empty());
        assert!(FolderSpec::parse("a/../b").is_err());
        assert!(FolderSpec::parse("a*b").is_ok());
        assert!(FolderSpec::parse("*a*b").is_err());
    }

    #[test]
    fn test_resolve_folder_by_suffix() {
        let storage = MemoryStore::new()
            .with_folder("10_Weekly/_Weekly-Maps")
            .with_folder("20_Daily");
        let spec = FolderSpec::parse("*_Weekly/_Weekly-Maps").unwrap();

        let folder = resolve_folder(&storage, &spec).unwrap();
        assert_eq!(folder.as_str(), "10_Weekly/_Weekly-Maps");
    }

    #[test]
    fn test_resolve_folder_not_found_and_ambiguous() {
        let storage = MemoryStore::new()
            .with_folder("10_Weekly")
            .with_folder("11_Weekly")
            .with_file("30_Weekly", "a file, not a folder");

        let missing = FolderSpec::parse("*_Monthly").unwrap();
        assert!(matches!(
            resolve_folder(&storage, &missing),
            Err(PagecastError::FolderNotFound { .. })
        ));

        let ambiguous = FolderSpec::parse("*_Weekly").unwrap();
        match resolve_folder(&storage, &ambiguous) {
            Err(PagecastError::FolderAmbiguous { candidates, .. }) => {
                assert_eq!(candidates, vec!["10_Weekly", "11_Weekly"]);
            }
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_folder_below_missing_parent() {
        let storage = MemoryStore::new();
        let spec = FolderSpec::parse("Journal/*_Daily").unwrap();
        assert!(matches!(
            resolve_folder(&storage, &spec),
            Err(PagecastError::FolderNotFound { .. })
        ));
    }

    #[test]
    fn test_compute_path_is_deterministic() {
        let page = load(
            r#"
[fields]
owner = "sam"

[templates.weekly-map]
cadence = "weekly"
week_start = "sunday"
file_name = "Weekly Map {{ period.end | %Y-%m-%d }} ({{fields.owner}}).md"
body = "x"
"#,
            "weekly-map",
        );
        assert_eq!(
            page.cadence,
            Cadence::Weekly {
                starts_on: chrono::Weekday::Sun
            }
        );

        let folder = VaultPath::parse("10_Weekly/_Weekly-Maps").unwrap();
        // Sun 2026-10-18 .. Sat 2026-10-24
        let wednesday = Period::containing(page.cadence, date(2026, 10, 21));
        let saturday = Period::containing(page.cadence, date(2026, 10, 24));

        let a = compute_path(&page, &folder, &wednesday).unwrap();
        let b = compute_path(&page, &folder, &saturday).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.path(0).unwrap().as_str(),
            "10_Weekly/_Weekly-Maps/Weekly Map 2026-10-24 (sam).md"
        );

        let next = Period::containing(page.cadence, date(2026, 10, 25));
        assert_ne!(compute_path(&page, &folder, &next).unwrap(), a);
    }

    #[test]
    fn test_compute_path_rejects_separator_from_values() {
        let page = load(
            r#"
[fields]
owner = "a/b"

[templates.journal]
cadence = "daily"
file_name = "{{fields.owner}}.md"
body = "x"
"#,
            "journal",
        );
        let period = Period::containing(page.cadence, date(2026, 10, 18));
        let err = compute_path(&page, &VaultPath::root(), &period).unwrap_err();
        assert!(matches!(err, PagecastError::InvalidPath { .. }));
    }

    const CYCLE: &str = r#"
[templates.cycle]
cadence = "weekly"
folder = "Cycles"
file_name = "Cycle {{ sequence }} ({{ period.start | %Y.%m.%d }}).md"
body = "x"

[templates.cycle.sequence]
prefix = "Cycle "
"#;

    #[test]
    fn test_numbered_file_name() {
        let page = load(CYCLE, "cycle");
        let folder = VaultPath::parse("Cycles").unwrap();
        let period = Period::containing(page.cadence, date(2026, 10, 14));

        let location = compute_path(&page, &folder, &period).unwrap();
        assert_eq!(
            location.file_name,
            FileName::Numbered {
                head: "Cycle ".to_string(),
                tail: " (2026.10.12).md".to_string(),
            }
        );
        assert_eq!(location.path(7).unwrap().as_str(), "Cycles/Cycle 7 (2026.10.12).md");
        assert_eq!(location.to_string(), "Cycles/Cycle <N> (2026.10.12).md");

        assert!(location.file_name.matches("Cycle 12 (2026.10.12).md"));
        assert!(!location.file_name.matches("Cycle  (2026.10.12).md"));
        assert!(!location.file_name.matches("Cycle 12 (2026.10.19).md"));
        assert!(!location.file_name.matches("Cycle x1 (2026.10.12).md"));
    }

    #[test]
    fn test_find_existing_numbered_page() {
        let page = load(CYCLE, "cycle");
        let folder = VaultPath::parse("Cycles").unwrap();
        let period = Period::containing(page.cadence, date(2026, 10, 14));
        let location = compute_path(&page, &folder, &period).unwrap();

        assert_eq!(location.find_existing(&MemoryStore::new()).unwrap(), None);

        let storage = MemoryStore::new()
            .with_file("Cycles/Cycle 3 (2026.10.05).md", "")
            .with_file("Cycles/Cycle 4 (2026.10.12).md", "");
        assert_eq!(
            location.find_existing(&storage).unwrap().unwrap().as_str(),
            "Cycles/Cycle 4 (2026.10.12).md"
        );
    }

    #[test]
    fn test_find_existing_fixed_page() {
        let page = load(
            "[templates.journal]\ncadence = \"daily\"\nfile_name = \"{{ period.key }}.md\"\nbody = \"x\"\n",
            "journal",
        );
        let period = Period::containing(page.cadence, date(2026, 10, 18));
        let location = compute_path(&page, &VaultPath::root(), &period).unwrap();
        let storage = MemoryStore::new().with_file("2026-10-18.md", "");

        assert_eq!(
            location.find_existing(&storage).unwrap().unwrap().as_str(),
            "2026-10-18.md"
        );
        assert_eq!(location.to_string(), "2026-10-18.md");
    }
}

//! Prior-period page lookup

use crate::error::{PagecastError, Result};
use crate::naming::{compute_path, resolve_folder};
use crate::path::VaultPath;
use crate::period::Period;
use crate::storage::{StorageError, StorageGateway};
use crate::template::{PriorRef, RenderContext, TemplateRegistry};

/// Keys every prior page binds; header lines never override them
const RESERVED: &[&str] = &["path", "title", "content", "period"];

/// Locate the page `prior` refers to and bind `prior.<name>.*`
///
/// The referenced template's own cadence and path rule decide where its page
/// for the period preceding `current.start` lives. Returns whether the page
/// was found.
pub(crate) fn bind_prior(
    registry: &TemplateRegistry<'_>,
    storage: &dyn StorageGateway,
    template: &str,
    prior: &PriorRef,
    current: &Period,
    context: &mut RenderContext,
) -> Result<bool> {
    let target = registry.load_path_rule(&prior.template)?;

    let missing = |path: String| -> Result<bool> {
        if prior.required {
            Err(PagecastError::MissingPriorPeriodData {
                template: template.to_string(),
                reference: prior.name.clone(),
                path,
            })
        } else {
            tracing::warn!(
                "Prior page '{}' of '{}' not found at '{}', leaving it out",
                prior.name,
                template,
                path
            );
            Ok(false)
        }
    };

    let Some(period) = Period::containing(target.cadence, current.start).previous() else {
        return missing(format!("the period before {}", current.start));
    };
    let folder = match resolve_folder(storage, &target.folder) {
        Ok(folder) => folder,
        Err(PagecastError::FolderNotFound { .. }) => {
            return missing(target.folder.to_string());
        }
        Err(e) => return Err(e),
    };
    let location = compute_path(&target, &folder, &period)?;
    let Some(path) = location.find_existing(storage)? else {
        return missing(location.to_string());
    };

    let content = match storage.read(&path) {
        Ok(content) => content,
        Err(StorageError::NotFound(_)) => return missing(path.to_string()),
        Err(e) => return Err(e.into()),
    };

    tracing::debug!("Prior page '{}' found at '{}'", prior.name, path);
    bind_page(context, &prior.name, &path, &period, &content);
    Ok(true)
}

fn bind_page(
    context: &mut RenderContext,
    name: &str,
    path: &VaultPath,
    period: &Period,
    content: &str,
) {
    let prefix = format!("prior.{}", name);

    for (key, value) in header_fields(content) {
        if !RESERVED.contains(&key.as_str()) {
            context.insert(format!("{}.{}", prefix, key), value);
        }
    }

    context.insert(format!("{}.path", prefix), path.as_str());
    context.insert(
        format!("{}.title", prefix),
        path.file_stem().unwrap_or_default(),
    );
    context.insert(format!("{}.content", prefix), content);
    context.insert_period(&format!("{}.period", prefix), period);
}

/// `Key: value` pairs at the top of a page
///
/// Reads a YAML-style front-matter block if the page opens with `---`,
/// otherwise the run of `Key: value` lines at the very top. Keys are
/// lowercased with every other character folded to `_`.
pub(crate) fn header_fields(content: &str) -> Vec<(String, String)> {
    let mut lines = content.lines().peekable();
    let front_matter = lines.peek().is_some_and(|l| l.trim_end() == "---");
    if front_matter {
        lines.next();
    }

    let mut fields = Vec::new();
    for line in lines {
        if front_matter && line.trim_end() == "---" {
            break;
        }
        match parse_header_line(line) {
            Some(pair) => fields.push(pair),
            None if front_matter => continue,
            None => break,
        }
    }
    fields
}

fn parse_header_line(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if !(value.is_empty() || value.starts_with(char::is_whitespace))
        || key.is_empty()
        || !key
            .chars()
            .all(|c| c.is_alphanumeric() || c == ' ' || c == '_' || c == '-')
    {
        return None;
    }

    let normalized: String = key
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    Some((normalized, value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_key_value_lines() {
        let content = "Week Ending: 2026-10-24\nTop Goal: Ship it\n\n# Notes\nLater: ignored\n";
        assert_eq!(
            header_fields(content),
            vec![
                ("week_ending".to_string(), "2026-10-24".to_string()),
                ("top_goal".to_string(), "Ship it".to_string()),
            ]
        );
    }

    #[test]
    fn test_front_matter() {
        let content = "---\ntags: weekly\n- list item\nEnergy-Level: 7\n---\nBody: not a header\n";
        assert_eq!(
            header_fields(content),
            vec![
                ("tags".to_string(), "weekly".to_string()),
                ("energy_level".to_string(), "7".to_string()),
            ]
        );
    }

    #[test]
    fn test_no_header() {
        assert!(header_fields("# Title\nKey: value\n").is_empty());
        assert!(header_fields("").is_empty());
    }

    #[test]
    fn test_urls_are_not_headers() {
        assert!(header_fields("https://example.com: x\n").is_empty());
    }
}

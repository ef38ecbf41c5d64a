//! Template registry: logical names → parsed templates

use super::parse::{is_valid_name, parse};
use super::{Block, Placeholder, PlaceholderClass};
use crate::config::{Config, TemplateConfig};
use crate::error::{PagecastError, Result};
use crate::naming::{FolderSpec, SEQUENCE};
use crate::path::VaultPath;
use crate::period::Cadence;
use crate::storage::{StorageError, StorageGateway};
use std::collections::{BTreeMap, BTreeSet};

/// Names a file-name rule may reference besides `period.*` and `fields.*`
const PATH_NAMES: &[&str] = &["template"];

/// A loaded template, immutable for the rest of the invocation
#[derive(Debug, Clone)]
pub struct TemplatePage {
    pub name: String,
    pub cadence: Cadence,
    /// Target period relative to the invocation's
    pub offset: i32,
    pub folder: FolderSpec,
    pub file_name: Vec<Block>,
    pub body: Vec<Block>,
    pub priors: Vec<PriorRef>,
    pub sequence: Option<SequenceRule>,
    /// Global fields overlaid with the template's own
    pub fields: BTreeMap<String, String>,
    pub schedule: Option<String>,
}

impl TemplatePage {
    /// Every placeholder of the body, in order of appearance
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.body.iter().filter_map(Block::as_placeholder)
    }
}

/// Page of a preceding period whose data feeds `prior.<name>.*`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorRef {
    pub name: String,
    pub template: String,
    pub required: bool,
}

/// `sequence` = 1 + highest `<prefix><N>` in the destination folder
///
/// The file name must start with `prefix` immediately followed by
/// `{{ sequence }}`, so numbered pages are what the rule counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRule {
    pub prefix: String,
    pub start: u32,
}

/// Resolves template names against pagecast.toml, reading bodies from the vault
pub struct TemplateRegistry<'a> {
    config: &'a Config,
    storage: &'a dyn StorageGateway,
}

impl<'a> TemplateRegistry<'a> {
    pub fn new(config: &'a Config, storage: &'a dyn StorageGateway) -> Self {
        Self { config, storage }
    }

    pub fn names(&self) -> impl Iterator<Item = &'a str> {
        self.config.templates.keys().map(String::as_str)
    }

    /// Load and parse the template registered as `name`
    pub fn load(&self, name: &str) -> Result<TemplatePage> {
        let config = self.template_config(name)?;
        let body = self.read_body(name, config)?;
        self.build(name, config, &body)
    }

    /// Load everything but the body (for locating pages of other templates)
    pub(crate) fn load_path_rule(&self, name: &str) -> Result<TemplatePage> {
        let config = self.template_config(name)?;
        self.build(name, config, "")
    }

    fn template_config(&self, name: &str) -> Result<&'a TemplateConfig> {
        self.config
            .templates
            .get(name)
            .ok_or_else(|| PagecastError::TemplateNotFound(name.to_string()))
    }

    fn read_body(&self, name: &str, config: &TemplateConfig) -> Result<String> {
        if let Some(body) = &config.body {
            return Ok(body.clone());
        }

        let raw = config.body_file.as_deref().unwrap_or_default();
        let path = VaultPath::parse(raw)
            .map_err(|e| PagecastError::malformed(name, format!("body_file: {}", e)))?;
        if path.is_root() {
            return Err(PagecastError::malformed(name, "body_file must name a file"));
        }

        tracing::debug!("Reading body of '{}' from '{}'", name, path);
        self.storage.read(&path).map_err(|e| match e {
            StorageError::NotFound(_) => PagecastError::TemplateBodyMissing {
                template: name.to_string(),
                path: path.to_string(),
            },
            other => other.into(),
        })
    }

    fn build(&self, name: &str, config: &TemplateConfig, body: &str) -> Result<TemplatePage> {
        let optional: BTreeSet<String> = config.optional.iter().cloned().collect();
        if let Some(bad) = optional.iter().find(|n| !is_valid_name(n)) {
            return Err(PagecastError::malformed(
                name,
                format!("optional entry '{}' is not a valid placeholder name", bad),
            ));
        }

        let mut fields = self.config.fields.clone();
        fields.extend(config.fields.clone());
        for (key, value) in &fields {
            if !is_valid_name(key) || key.contains('.') {
                return Err(PagecastError::malformed(
                    name,
                    format!("field name '{}' is not a valid identifier", key),
                ));
            }
            if value.contains("{{") {
                return Err(PagecastError::malformed(
                    name,
                    format!("field '{}' contains a placeholder marker", key),
                ));
            }
        }

        let mut body =
            parse(body, &optional).map_err(|e| PagecastError::malformed(name, e.to_string()))?;

        let folder = FolderSpec::parse(&config.folder)
            .map_err(|e| PagecastError::malformed(name, format!("folder {}", e)))?;

        let priors = config
            .prior
            .iter()
            .map(|prior| {
                let template = prior.template.clone().unwrap_or_else(|| name.to_string());
                if !self.config.templates.contains_key(&template) {
                    return Err(PagecastError::malformed(
                        name,
                        format!(
                            "prior reference '{}' names unknown template '{}'",
                            prior.name, template
                        ),
                    ));
                }
                Ok(PriorRef {
                    name: prior.name.clone(),
                    template,
                    required: prior.required,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        // Pages of an optional prior may be absent, and so may their values
        let optional_priors: Vec<String> = priors
            .iter()
            .filter(|prior| !prior.required)
            .map(|prior| format!("prior.{}.", prior.name))
            .collect();
        for block in &mut body {
            if let Block::Placeholder(p) = block {
                if optional_priors.iter().any(|prefix| p.name.starts_with(prefix.as_str())) {
                    p.class = PlaceholderClass::Optional;
                }
            }
        }

        let sequence = config.sequence.as_ref().map(|s| SequenceRule {
            prefix: s.prefix.clone(),
            start: s.start,
        });

        let file_name = parse(&config.file_name, &BTreeSet::new())
            .map_err(|e| PagecastError::malformed(name, format!("file_name: {}", e)))?;
        check_file_name_rule(name, &file_name, &fields, sequence.as_ref())?;

        Ok(TemplatePage {
            name: name.to_string(),
            cadence: config.cadence(),
            offset: config.offset,
            folder,
            file_name,
            body,
            priors,
            sequence,
            fields,
            schedule: config.schedule.clone(),
        })
    }
}

/// A file-name rule sees only static values, so paths never depend on vault
/// contents beyond a sequenced template's running number
fn check_file_name_rule(
    name: &str,
    blocks: &[Block],
    fields: &BTreeMap<String, String>,
    sequence: Option<&SequenceRule>,
) -> Result<()> {
    for block in blocks {
        match block {
            Block::Literal(text) if text.contains('/') || text.contains('\\') => {
                return Err(PagecastError::malformed(
                    name,
                    "file_name must not contain path separators",
                ));
            }
            Block::Literal(_) => {}
            Block::Placeholder(p) => {
                let allowed = PATH_NAMES.contains(&p.name.as_str())
                    || (p.name == SEQUENCE && sequence.is_some())
                    || p.name.starts_with("period.")
                    || p
                        .name
                        .strip_prefix("fields.")
                        .is_some_and(|key| fields.contains_key(key));
                if !allowed {
                    return Err(PagecastError::malformed(
                        name,
                        format!(
                            "file_name placeholder '{}' must be 'template', 'period.*', a defined 'fields.*' or 'sequence' with a sequence rule",
                            p.name
                        ),
                    ));
                }
            }
        }
    }

    let Some(rule) = sequence else {
        return Ok(());
    };

    let numbered: Vec<usize> = blocks
        .iter()
        .enumerate()
        .filter(|(_, block)| block.as_placeholder().is_some_and(|p| p.name == SEQUENCE))
        .map(|(i, _)| i)
        .collect();
    let starts_with_prefix = matches!(
        (numbered.as_slice(), blocks.first()),
        ([1], Some(Block::Literal(head))) if *head == rule.prefix
    );
    if !starts_with_prefix {
        return Err(PagecastError::malformed(
            name,
            format!(
                "file_name must start with the sequence prefix '{}' followed by {{{{ sequence }}}}, once",
                rule.prefix
            ),
        ));
    }

    let tail_has_period = blocks[2..]
        .iter()
        .filter_map(Block::as_placeholder)
        .any(|p| p.name.starts_with("period."));
    if !tail_has_period {
        return Err(PagecastError::malformed(
            name,
            "a numbered file_name must also reference 'period.*' so each period gets its own page",
        ));
    }

    Ok(())
}

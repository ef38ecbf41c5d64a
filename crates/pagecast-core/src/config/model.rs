use crate::error::{PagecastError, Result};
use crate::period::{Cadence, VaultZone};
use chrono::{FixedOffset, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// pagecast.toml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    /// User-specific values, exposed to templates as `fields.<key>`
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub templates: BTreeMap<String, TemplateConfig>,
}

/// Wall clock that decides which day an instant falls on (UTC when unset)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultConfig {
    /// IANA zone name such as `Europe/Berlin`, daylight saving included
    #[serde(default)]
    pub timezone: Option<String>,
    /// Fixed offset such as `-05:00`
    #[serde(default)]
    pub utc_offset: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Local,
    Dropbox,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendKind,
    /// Local directory, or folder inside Dropbox
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            root: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CadenceKind {
    Daily,
    Weekly,
    Monthly,
}

/// Largest `offset` magnitude a template may ask for, in periods
pub const MAX_OFFSET: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    pub cadence: CadenceKind,
    /// First day of the week (weekly only); Monday when absent
    #[serde(default)]
    pub week_start: Option<Weekday>,
    /// Target period relative to the one containing the invocation
    #[serde(default)]
    pub offset: i32,
    /// Destination folder; segments starting with `*` match by suffix
    #[serde(default)]
    pub folder: String,
    pub file_name: String,
    #[serde(default)]
    pub body: Option<String>,
    /// Vault-relative path of the template body
    #[serde(default)]
    pub body_file: Option<String>,
    /// Placeholders that may stay unresolved
    #[serde(default)]
    pub optional: Vec<String>,
    /// Cron expression used by `pagecast crontab`
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default)]
    pub prior: Vec<PriorConfig>,
    #[serde(default)]
    pub sequence: Option<SequenceConfig>,
    /// Template-local values; override global `[fields]`
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl TemplateConfig {
    pub fn cadence(&self) -> Cadence {
        match self.cadence {
            CadenceKind::Daily => Cadence::Daily,
            CadenceKind::Weekly => Cadence::Weekly {
                starts_on: self.week_start.unwrap_or(Weekday::Mon),
            },
            CadenceKind::Monthly => Cadence::Monthly,
        }
    }
}

/// Reference to the page of a preceding period
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriorConfig {
    /// Exposed as `prior.<name>.*`
    pub name: String,
    /// Referenced template; the declaring template when absent
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub required: bool,
}

/// Running number derived from existing pages in the destination folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequenceConfig {
    pub prefix: String,
    #[serde(default = "default_sequence_start")]
    pub start: u32,
}

fn default_sequence_start() -> u32 {
    1
}

impl Config {
    /// Read and validate pagecast.toml
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| PagecastError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| PagecastError::ConfigParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn zone(&self) -> Result<VaultZone> {
        match (&self.vault.timezone, &self.vault.utc_offset) {
            (Some(_), Some(_)) => Err(invalid(
                "vault.timezone",
                "set either timezone or utc_offset, not both",
            )),
            (Some(name), None) => name
                .parse::<Tz>()
                .map(VaultZone::Named)
                .map_err(|e| invalid("vault.timezone", format!("'{}': {}", name, e))),
            (None, Some(offset)) => offset
                .parse::<FixedOffset>()
                .map(VaultZone::Fixed)
                .map_err(|e| invalid("vault.utc_offset", format!("'{}': {}", offset, e))),
            (None, None) => Ok(VaultZone::utc()),
        }
    }

    /// Semantic checks serde cannot express
    pub fn validate(&self) -> Result<()> {
        self.zone()?;

        if self.storage.timeout_secs == 0 {
            return Err(invalid("storage.timeout_secs", "must be at least 1"));
        }

        for (name, template) in &self.templates {
            let field = |key: &str| format!("templates.{}.{}", name, key);

            if !is_identifier(name) {
                return Err(invalid(
                    &format!("templates.{}", name),
                    "template names may only use letters, digits, '_' and '-'",
                ));
            }

            if template.offset.unsigned_abs() > MAX_OFFSET {
                return Err(invalid(
                    &field("offset"),
                    format!("must be between -{0} and {0}", MAX_OFFSET),
                ));
            }

            if template.week_start.is_some() && template.cadence != CadenceKind::Weekly {
                return Err(invalid(&field("week_start"), "only valid for weekly cadence"));
            }

            match (&template.body, &template.body_file) {
                (Some(_), Some(_)) => {
                    return Err(invalid(&field("body"), "set either body or body_file, not both"));
                }
                (None, None) => {
                    return Err(invalid(&field("body"), "one of body or body_file is required"));
                }
                _ => {}
            }

            if template.file_name.trim().is_empty() {
                return Err(invalid(&field("file_name"), "must not be empty"));
            }

            let mut prior_names = std::collections::BTreeSet::new();
            for prior in &template.prior {
                if !is_identifier(&prior.name) {
                    return Err(invalid(
                        &field("prior"),
                        format!("invalid reference name '{}'", prior.name),
                    ));
                }
                if !prior_names.insert(prior.name.as_str()) {
                    return Err(invalid(
                        &field("prior"),
                        format!("duplicate reference name '{}'", prior.name),
                    ));
                }
            }

            if let Some(sequence) = &template.sequence {
                if sequence.prefix.is_empty() {
                    return Err(invalid(&field("sequence.prefix"), "must not be empty"));
                }
            }
        }

        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn invalid(field: &str, reason: impl Into<String>) -> PagecastError {
    PagecastError::ConfigInvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let toml = r##"
[templates.journal]
cadence = "daily"
file_name = "{{period.key}}.md"
body = "# {{today}}"
"##;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(config.zone().unwrap(), VaultZone::utc());
        assert_eq!(config.storage.backend, BackendKind::Local);
        assert_eq!(config.storage.timeout_secs, 30);
        assert_eq!(config.templates["journal"].cadence(), Cadence::Daily);
        assert_eq!(config.templates["journal"].offset, 0);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r##"
[vault]
utc_offset = "-05:00"

[storage]
backend = "dropbox"
root = "/Obsidian/Vault"
timeout_secs = 10

[fields]
author = "Sam"

[templates.weekly-map]
cadence = "weekly"
week_start = "sunday"
offset = 2
folder = "*_Weekly/_Weekly-Maps"
file_name = "Weekly Map {{period.end}}.md"
body_file = "_Templates/weekly_map.md"
optional = ["intention"]
schedule = "0 22 * * 6"

[[templates.weekly-map.prior]]
name = "last"
required = true

[templates.weekly-map.sequence]
prefix = "Map "

[templates.weekly-map.fields]
author = "Samantha"
"##;
        let config = Config::from_toml_str(toml).unwrap();
        assert_eq!(
            config.zone().unwrap(),
            VaultZone::Fixed(FixedOffset::west_opt(5 * 3600).unwrap())
        );
        assert_eq!(config.storage.backend, BackendKind::Dropbox);
        assert_eq!(config.fields["author"], "Sam");

        let map = &config.templates["weekly-map"];
        assert_eq!(
            map.cadence(),
            Cadence::Weekly {
                starts_on: Weekday::Sun
            }
        );
        assert_eq!(map.offset, 2);
        assert_eq!(map.prior[0].name, "last");
        assert!(map.prior[0].required);
        assert!(map.prior[0].template.is_none());
        assert_eq!(map.sequence.as_ref().unwrap().start, 1);
        assert_eq!(map.fields["author"], "Samantha");
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = Config::from_toml_str("[templates.x\ncadence = ").unwrap_err();
        assert!(matches!(err, PagecastError::ConfigParseError(_)));
    }

    #[test]
    fn test_unknown_cadence_is_parse_error() {
        let toml = r##"
[templates.x]
cadence = "hourly"
file_name = "x.md"
body = ""
"##;
        let err = Config::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, PagecastError::ConfigParseError(_)));
    }

    #[test]
    fn test_semantic_errors_are_invalid_value() {
        let cases = [
            (
                "[vault]\nutc_offset = \"EST\"\n",
                "vault.utc_offset",
            ),
            (
                "[vault]\ntimezone = \"Mars/Olympus\"\n",
                "vault.timezone",
            ),
            (
                "[vault]\ntimezone = \"UTC\"\nutc_offset = \"+00:00\"\n",
                "vault.timezone",
            ),
            (
                "[templates.x]\ncadence = \"weekly\"\noffset = 2000000000\nfile_name = \"x.md\"\nbody = \"\"\n",
                "templates.x.offset",
            ),
            (
                "[templates.x]\ncadence = \"daily\"\nweek_start = \"monday\"\nfile_name = \"x.md\"\nbody = \"\"\n",
                "templates.x.week_start",
            ),
            (
                "[templates.x]\ncadence = \"daily\"\nfile_name = \"x.md\"\n",
                "templates.x.body",
            ),
            (
                "[templates.x]\ncadence = \"daily\"\nfile_name = \"x.md\"\nbody = \"\"\nbody_file = \"t.md\"\n",
                "templates.x.body",
            ),
            (
                "[templates.\"bad name\"]\ncadence = \"daily\"\nfile_name = \"x.md\"\nbody = \"\"\n",
                "templates.bad name",
            ),
            (
                "[templates.x]\ncadence = \"daily\"\nfile_name = \"x.md\"\nbody = \"\"\n[[templates.x.prior]]\nname = \"a\"\n[[templates.x.prior]]\nname = \"a\"\n",
                "templates.x.prior",
            ),
        ];

        for (toml, expected_field) in cases {
            match Config::from_toml_str(toml) {
                Err(PagecastError::ConfigInvalidValue { field, .. }) => {
                    assert_eq!(field, expected_field, "for config:\n{}", toml)
                }
                other => panic!("expected invalid value for:\n{}\ngot {:?}", toml, other),
            }
        }
    }

    #[test]
    fn test_named_timezone() {
        let config = Config::from_toml_str("[vault]\ntimezone = \"US/Eastern\"\n").unwrap();
        assert_eq!(config.zone().unwrap(), VaultZone::Named(chrono_tz::US::Eastern));
    }

    #[test]
    fn test_offset_bounds() {
        let at_limit = format!(
            "[templates.x]\ncadence = \"monthly\"\noffset = -{}\nfile_name = \"x.md\"\nbody = \"\"\n",
            MAX_OFFSET
        );
        assert!(Config::from_toml_str(&at_limit).is_ok());

        let past_limit = format!(
            "[templates.x]\ncadence = \"monthly\"\noffset = -{}\nfile_name = \"x.md\"\nbody = \"\"\n",
            MAX_OFFSET + 1
        );
        assert!(matches!(
            Config::from_toml_str(&past_limit),
            Err(PagecastError::ConfigInvalidValue { .. })
        ));
    }
}

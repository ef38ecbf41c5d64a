//! Page creation: one template, one period, at most one new page
//!
//! A run is stateless. It decides the target period from the instant it is
//! given, skips when the destination already exists, and otherwise renders
//! and creates the page in a single conditional write. Two runs racing for the
//! same period both reach `create`; the storage backend lets exactly one win
//! and the other reports [`SkipReason::LostRace`].

mod prior;
mod sequence;


use crate::config::Config;
use crate::error::{PagecastError, Result};
use crate::naming::{compute_path, path_context, resolve_folder, PageLocation, SEQUENCE};
use crate::path::VaultPath;
use crate::period::{Period, VaultZone};
use crate::storage::{StorageError, StorageGateway};
use crate::template::{resolve, ContextValue, TemplatePage, TemplateRegistry};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;

/// A page written by this run
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPage {
    pub template: String,
    pub period: Period,
    pub path: VaultPath,
    pub content: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The page was already there before rendering
    Exists,
    /// Another run created the page between our check and our write
    LostRace,
}

/// A run that found its page already present
#[derive(Debug, Clone, Serialize)]
pub struct SkippedPage {
    pub template: String,
    pub period: Period,
    pub path: VaultPath,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunOutcome {
    Created(RenderedPage),
    Skipped(SkippedPage),
}

impl RunOutcome {
    pub fn path(&self) -> &VaultPath {
        match self {
            RunOutcome::Created(page) => &page.path,
            RunOutcome::Skipped(page) => &page.path,
        }
    }

    pub fn period(&self) -> &Period {
        match self {
            RunOutcome::Created(page) => &page.period,
            RunOutcome::Skipped(page) => &page.period,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, RunOutcome::Created(_))
    }
}

/// Where a run would write, without writing
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub template: String,
    pub period: Period,
    pub path: VaultPath,
    pub exists: bool,
}

pub struct Orchestrator {
    config: Config,
    storage: Arc<dyn StorageGateway>,
    zone: VaultZone,
}

impl Orchestrator {
    /// Fails with `CONFIG_INVALID_VALUE` unless `config` passes validation
    pub fn new(config: Config, storage: Arc<dyn StorageGateway>) -> Result<Self> {
        config.validate()?;
        let zone = config.zone()?;
        tracing::debug!("Vault clock {}, storage {}", zone, storage.describe());
        Ok(Self {
            config,
            storage,
            zone,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> TemplateRegistry<'_> {
        TemplateRegistry::new(&self.config, self.storage.as_ref())
    }

    /// Period and destination of `template` for a run at `instant`
    ///
    /// A sequenced page that does not exist yet is shown with the number a
    /// run would give it now.
    pub fn plan(&self, template: &str, instant: DateTime<Utc>) -> Result<Plan> {
        let page = self.registry().load_path_rule(template)?;
        let (period, location) = self.locate(&page, instant)?;

        let (path, exists) = match location.find_existing(self.storage.as_ref())? {
            Some(path) => (path, true),
            None => {
                let number = self.next_number(&page, &location)?;
                (location.path(number.unwrap_or_default())?, false)
            }
        };

        Ok(Plan {
            template: template.to_string(),
            period,
            path,
            exists,
        })
    }

    /// Create the page of `template` for the period containing `instant`
    pub fn run(&self, template: &str, instant: DateTime<Utc>) -> Result<RunOutcome> {
        let storage = self.storage.as_ref();
        let registry = self.registry();
        let page = registry.load(template)?;

        let (period, location) = self.locate(&page, instant)?;
        tracing::debug!(
            "Template '{}' targets {} period {} at '{}'",
            template,
            page.cadence,
            period.key,
            location
        );

        let skipped = |path: VaultPath, reason| {
            RunOutcome::Skipped(SkippedPage {
                template: template.to_string(),
                period,
                path,
                reason,
            })
        };

        if let Some(existing) = location.find_existing(storage)? {
            tracing::info!("Page '{}' already exists, skipping", existing);
            return Ok(skipped(existing, SkipReason::Exists));
        }

        let local = self.zone.localize(&instant);
        let mut context = path_context(&page, &period);
        context.insert("today", ContextValue::Date(local.date_naive()));
        context.insert("now", local.to_rfc3339_opts(SecondsFormat::Secs, false));

        for reference in &page.priors {
            prior::bind_prior(&registry, storage, template, reference, &period, &mut context)?;
        }

        let number = self.next_number(&page, &location)?;
        if let Some(number) = number {
            context.insert(SEQUENCE, number.to_string());
        }
        let path = location.path(number.unwrap_or_default())?;

        let resolution = resolve(&page.body, &context);
        if !resolution.is_complete() {
            return Err(PagecastError::UnresolvedRequiredPlaceholders {
                template: template.to_string(),
                names: resolution.unresolved_required.into_iter().collect(),
            });
        }

        match storage.create(&path, &resolution.text) {
            Ok(()) => {
                tracing::info!("Created '{}' for {}", path, period.key);
                Ok(RunOutcome::Created(RenderedPage {
                    template: template.to_string(),
                    period,
                    path,
                    content: resolution.text,
                }))
            }
            Err(StorageError::AlreadyExists(_)) => {
                tracing::info!("Page '{}' was created concurrently, skipping", path);
                Ok(skipped(path, SkipReason::LostRace))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Target period of `page` at `instant` and where its page lives
    fn locate(&self, page: &TemplatePage, instant: DateTime<Utc>) -> Result<(Period, PageLocation)> {
        let current = Period::at_instant(page.cadence, &instant, &self.zone);
        let period = current.shift(page.offset).ok_or_else(|| {
            PagecastError::malformed(
                &page.name,
                format!("offset {} leaves the supported calendar range", page.offset),
            )
        })?;
        let folder = resolve_folder(self.storage.as_ref(), &page.folder)?;
        let location = compute_path(page, &folder, &period)?;
        Ok((period, location))
    }

    /// Running number a new page of `page` gets, for sequenced templates
    fn next_number(&self, page: &TemplatePage, location: &PageLocation) -> Result<Option<u32>> {
        page.sequence
            .as_ref()
            .map(|rule| sequence::next_sequence(self.storage.as_ref(), &location.folder, rule))
            .transpose()
    }
}

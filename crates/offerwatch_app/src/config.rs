//! The configuration bundle for one check, loaded from a JSON file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use thiserror::Error;

use offerwatch_core::{fill_date_template, shift_months, TemplateError};
use offerwatch_engine::{FieldMapping, PageStep, ReadyCondition, RunSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("selector `{selector}` has date placeholders but no month_offset is configured")]
    UnexpandedPlaceholder { selector: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum StepConfig {
    Click { selector: String },
    WaitFor { selector: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    /// WebDriver endpoint provided by the execution environment.
    #[serde(default = "defaults::webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "defaults::headless")]
    pub headless: bool,
    #[serde(default = "defaults::launch_timeout_secs")]
    pub launch_timeout_secs: u64,

    pub target_url: String,
    pub ready_selector: String,
    #[serde(default = "defaults::ready_timeout_secs")]
    pub ready_timeout_secs: u64,
    #[serde(default = "defaults::nav_retry_limit")]
    pub nav_retry_limit: u32,
    #[serde(default = "defaults::nav_retry_backoff_secs")]
    pub nav_retry_backoff_secs: u64,
    #[serde(default)]
    pub setup_steps: Vec<StepConfig>,
    #[serde(default = "defaults::step_timeout_secs")]
    pub step_timeout_secs: u64,

    /// When set, `{year}`/`{month}`/`{day}` placeholders in the ready
    /// selector and setup steps are expanded against today shifted by
    /// this many months. Calendar-style pages expose future listings
    /// under date-addressed elements.
    #[serde(default)]
    pub month_offset: Option<u32>,

    pub mapping: FieldMapping,

    #[serde(default = "defaults::state_path")]
    pub state_path: PathBuf,
    #[serde(default)]
    pub trust_empty_results: bool,

    /// Notification webhook; when absent, new offers only go to the log.
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default = "defaults::webhook_timeout_secs")]
    pub webhook_timeout_secs: u64,
}

mod defaults {
    use std::path::PathBuf;

    pub fn webdriver_url() -> String {
        "http://localhost:9515".to_owned()
    }
    pub fn headless() -> bool {
        true
    }
    pub fn launch_timeout_secs() -> u64 {
        20
    }
    pub fn ready_timeout_secs() -> u64 {
        30
    }
    pub fn nav_retry_limit() -> u32 {
        3
    }
    pub fn nav_retry_backoff_secs() -> u64 {
        2
    }
    pub fn step_timeout_secs() -> u64 {
        10
    }
    pub fn webhook_timeout_secs() -> u64 {
        10
    }
    pub fn state_path() -> PathBuf {
        PathBuf::from("offerwatch_state.json")
    }
}

impl WatchConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    /// Resolve the run settings, expanding any date-templated selectors.
    pub fn run_settings(&self) -> Result<RunSettings, ConfigError> {
        let target_date = self
            .month_offset
            .map(|offset| shift_months(Local::now().date_naive(), offset));

        let ready_selector = expand_selector(&self.ready_selector, target_date)?;
        let mut setup_steps = Vec::with_capacity(self.setup_steps.len());
        for step in &self.setup_steps {
            setup_steps.push(match step {
                StepConfig::Click { selector } => PageStep::Click {
                    selector: expand_selector(selector, target_date)?,
                },
                StepConfig::WaitFor { selector } => PageStep::WaitFor {
                    selector: expand_selector(selector, target_date)?,
                },
            });
        }

        Ok(RunSettings {
            target_url: self.target_url.clone(),
            ready: ReadyCondition {
                selector: ready_selector,
                timeout: Duration::from_secs(self.ready_timeout_secs),
            },
            nav_retry_limit: self.nav_retry_limit,
            nav_retry_backoff: Duration::from_secs(self.nav_retry_backoff_secs),
            setup_steps,
            step_timeout: Duration::from_secs(self.step_timeout_secs),
            trust_empty_results: self.trust_empty_results,
        })
    }
}

/// Fill only the placeholders the selector actually contains, so plain
/// selectors pass through untouched even when a target date is set. A
/// selector with placeholders but no date to fill them from would reach
/// the page as a literal `{year}` and never match, so that is rejected
/// up front.
fn expand_selector(selector: &str, date: Option<NaiveDate>) -> Result<String, ConfigError> {
    let has_placeholder = ["{year}", "{month}", "{day}"]
        .iter()
        .any(|p| selector.contains(p));
    let Some(date) = date else {
        if has_placeholder {
            return Err(ConfigError::UnexpandedPlaceholder {
                selector: selector.to_owned(),
            });
        }
        return Ok(selector.to_owned());
    };
    let filled = fill_date_template(
        selector,
        selector.contains("{year}").then(|| date.year()),
        selector.contains("{month}").then(|| date.month()),
        selector.contains("{day}").then(|| date.day()),
    )?;
    Ok(filled)
}

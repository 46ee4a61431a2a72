//! Run-scoped context.
//!
//! A [`RunContext`] owns the session and settings of one test run, creates
//! its timestamped report directory, and hands out engines. Scenario data
//! shared between steps lives in a [`ScenarioContext`] on the run instead of
//! in process-wide statics.

use crate::config::Settings;
use crate::driver::Driver;
use crate::engine::InteractionEngine;
use crate::result::{SteadyError, SteadyResult};
use crate::sink::InteractionSink;
use chrono::{DateTime, Local};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Key/value store shared by the steps of one scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioContext {
    data: BTreeMap<String, Value>,
}

impl ScenarioContext {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous value
    pub fn set(&mut self, key: impl Into<String>, value: impl Serialize) -> SteadyResult<()> {
        self.data.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Raw value under `key`
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Value under `key` decoded as `T`
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> SteadyResult<Option<T>> {
        self.data
            .get(key)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(SteadyError::from)
    }

    /// Value under `key`, or `default`
    #[must_use]
    pub fn get_or<'a>(&'a self, key: &str, default: &'a Value) -> &'a Value {
        self.data.get(key).unwrap_or(default)
    }

    /// Whether `key` is set
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Remove and return the value under `key`
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// All keys, sorted
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }
}

/// Metadata written to `run.json` when a run is released
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// `report.name`
    pub name: String,
    /// `report.title`
    pub title: String,
    /// When the run was acquired
    pub started: DateTime<Local>,
    /// When the run was released
    pub finished: DateTime<Local>,
    /// Report directory
    pub report_dir: PathBuf,
    /// Scenario data at release
    pub scenario: ScenarioContext,
}

/// One test run over a borrowed session
pub struct RunContext<D: Driver + ?Sized> {
    settings: Settings,
    driver: Arc<D>,
    report_dir: PathBuf,
    started: DateTime<Local>,
    sinks: Vec<Arc<dyn InteractionSink>>,
    scenario: ScenarioContext,
}

impl<D: Driver + ?Sized> std::fmt::Debug for RunContext<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("report_dir", &self.report_dir)
            .field("started", &self.started)
            .field("sinks", &self.sinks.len())
            .field("scenario", &self.scenario)
            .finish_non_exhaustive()
    }
}

impl<D: Driver + ?Sized> RunContext<D> {
    /// Start a run: create `<report.dir>/<report.name>_<timestamp>/`
    pub async fn acquire(settings: Settings, driver: Arc<D>) -> SteadyResult<Self> {
        let started = Local::now();
        let report_dir = settings.report_dir().join(format!(
            "{}_{}",
            sanitize(&settings.report_name()),
            started.format("%Y%m%d_%H%M%S")
        ));
        tokio::fs::create_dir_all(&report_dir).await?;
        info!(dir = %report_dir.display(), title = %settings.report_title(), "run started");
        Ok(Self {
            settings,
            driver,
            report_dir,
            started,
            sinks: Vec::new(),
            scenario: ScenarioContext::new(),
        })
    }

    /// Attach a sink to every engine handed out afterwards
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn InteractionSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Engine over the run's session, configured from its settings
    pub async fn engine(&self) -> SteadyResult<InteractionEngine<D>> {
        let mut engine = InteractionEngine::from_settings(Arc::clone(&self.driver), &self.settings).await?;
        for sink in &self.sinks {
            engine = engine.with_sink(Arc::clone(sink));
        }
        Ok(engine)
    }

    /// Settings of the run
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Report directory of the run
    #[must_use]
    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    /// Path for a screenshot named `name` inside the report directory
    #[must_use]
    pub fn screenshot_path(&self, name: &str) -> PathBuf {
        self.report_dir.join(format!("{}.png", sanitize(name)))
    }

    /// Scenario data
    #[must_use]
    pub const fn scenario(&self) -> &ScenarioContext {
        &self.scenario
    }

    /// Scenario data, mutable
    pub fn scenario_mut(&mut self) -> &mut ScenarioContext {
        &mut self.scenario
    }

    /// End the run, writing `run.json` into the report directory
    pub async fn release(self) -> SteadyResult<RunSummary> {
        let summary = RunSummary {
            name: self.settings.report_name(),
            title: self.settings.report_title(),
            started: self.started,
            finished: Local::now(),
            report_dir: self.report_dir.clone(),
            scenario: self.scenario,
        };
        let json = serde_json::to_string_pretty(&summary)?;
        tokio::fs::write(self.report_dir.join("run.json"), json).await?;
        info!(dir = %self.report_dir.display(), "run released");
        Ok(summary)
    }
}

/// File-system safe form of a name
fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::driver::mock::MockDriver;
    use crate::sink::MemorySink;
    use serde_json::json;

    fn settings_in(dir: &Path) -> Settings {
        Settings::from_yaml_str(&format!(
            "report:\n  dir: '{}'\n  name: nightly smoke\nwait:\n  timeout: 2\n",
            dir.display()
        ))
        .unwrap()
    }

    mod scenario_tests {
        use super::*;

        #[test]
        fn test_set_get_and_decode() {
            let mut ctx = ScenarioContext::new();
            ctx.set("order_id", "PO-1042").unwrap();
            ctx.set("lines", vec![1, 2, 3]).unwrap();

            assert_eq!(ctx.get("order_id"), Some(&json!("PO-1042")));
            assert_eq!(ctx.get_as::<Vec<u32>>("lines").unwrap(), Some(vec![1, 2, 3]));
            assert_eq!(ctx.get_as::<String>("missing").unwrap(), None);
            assert!(ctx.get_as::<u32>("order_id").is_err());
        }

        #[test]
        fn test_defaults_and_keys() {
            let mut ctx = ScenarioContext::new();
            ctx.set("b", 2).unwrap();
            ctx.set("a", 1).unwrap();
            let fallback = json!("none");
            assert_eq!(ctx.get_or("zzz", &fallback), &fallback);
            assert_eq!(ctx.keys().collect::<Vec<_>>(), vec!["a", "b"]);
            assert!(ctx.contains("a"));
            assert_eq!(ctx.remove("a"), Some(json!(1)));
            assert!(!ctx.contains("a"));
        }
    }

    mod run_tests {
        use super::*;

        #[test]
        fn test_sanitize() {
            assert_eq!(sanitize("nightly smoke"), "nightly_smoke");
            assert_eq!(sanitize("a/b:c"), "a_b_c");
            assert_eq!(sanitize("  "), "unnamed");
        }

        #[tokio::test]
        async fn test_acquire_creates_timestamped_dir() {
            let tmp = tempfile::tempdir().unwrap();
            let run = RunContext::acquire(settings_in(tmp.path()), Arc::new(MockDriver::new()))
                .await
                .unwrap();

            assert!(run.report_dir().is_dir());
            assert!(run.report_dir().starts_with(tmp.path()));
            let dir_name = run.report_dir().file_name().unwrap().to_string_lossy().to_string();
            assert!(dir_name.starts_with("nightly_smoke_"));
            assert_eq!(
                run.screenshot_path("after save"),
                run.report_dir().join("after_save.png")
            );
        }

        #[tokio::test]
        async fn test_engine_uses_run_settings_and_sinks() {
            let tmp = tempfile::tempdir().unwrap();
            let memory = Arc::new(MemorySink::new());
            let run = RunContext::acquire(settings_in(tmp.path()), Arc::new(MockDriver::new()))
                .await
                .unwrap()
                .with_sink(memory.clone());

            let mut engine = run.engine().await.unwrap();
            assert_eq!(engine.policy().timeout_ms(), 2000);
            engine.navigate_to("https://example.com").await.unwrap();
            assert_eq!(memory.events().len(), 1);
        }

        #[tokio::test]
        async fn test_release_writes_summary() {
            let tmp = tempfile::tempdir().unwrap();
            let mut run = RunContext::acquire(settings_in(tmp.path()), Arc::new(MockDriver::new()))
                .await
                .unwrap();
            run.scenario_mut().set("invoice", "INV-7").unwrap();
            let dir = run.report_dir().to_path_buf();

            let summary = run.release().await.unwrap();
            assert_eq!(summary.title, "nightly smoke");
            assert!(summary.finished >= summary.started);

            let written = std::fs::read_to_string(dir.join("run.json")).unwrap();
            let parsed: RunSummary = serde_json::from_str(&written).unwrap();
            assert_eq!(parsed.scenario.get("invoice"), Some(&json!("INV-7")));
        }
    }
}

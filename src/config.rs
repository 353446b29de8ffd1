use crate::board::TaskBoard;
use crate::error::StoreError;
use crate::lookup::RetryPolicy;
use crate::store::{read_json, write_json};
use crate::task::{CategoryId, StateCode, Task, TaskState};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "taskcard_config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tasks_path: PathBuf,
    pub categories_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_file: String,
    pub resolver: ResolverConfig,
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tasks_path: PathBuf::from("tasks.json"),
            categories_path: PathBuf::from("categories.json"),
            log_dir: PathBuf::from("."),
            log_file: "taskcard.log".to_string(),
            resolver: ResolverConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Artificial delay added to every category lookup.
    pub latency_ms: u64,
    pub cache_capacity: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            latency_ms: 300,
            cache_capacity: 256,
        }
    }
}

impl ResolverConfig {
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_backoff_ms: policy.initial_backoff.as_millis() as u64,
            max_backoff_ms: policy.max_backoff.as_millis() as u64,
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl Config {
    /// Reads `path`, falling back to defaults when it does not exist.
    /// Relative paths inside are taken relative to the file's directory.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        if !path.exists() {
            return Ok(Self::default().rebase(base));
        }
        let config: Self = read_json(path)?;
        Ok(config.rebase(base))
    }

    fn rebase(mut self, base: &Path) -> Self {
        for path in [
            &mut self.tasks_path,
            &mut self.categories_path,
            &mut self.log_dir,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.retry)
    }

    /// Seeds `dir` with a config and sample data. Returns `false` without
    /// touching anything if a config is already there.
    pub fn init(dir: &Path) -> Result<bool, StoreError> {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Ok(false);
        }
        fs::create_dir_all(dir).map_err(|source| StoreError::Write {
            path: dir.to_path_buf(),
            source,
        })?;

        let config = Self::default();
        write_json(&config_path, &config)?;
        TaskBoard::new(sample_tasks()).save_to_file(&dir.join(&config.tasks_path))?;
        write_json(&dir.join(&config.categories_path), &sample_categories())?;
        Ok(true)
    }
}

fn sample_tasks() -> Vec<Task> {
    let mut unknown_state = Task::new(45, TaskState::Pending, "Triage imported ticket", "cat-1");
    unknown_state.state = StateCode::Ordinal(-1);
    vec![
        Task::new(42, TaskState::Pending, "Write spec", "cat-7"),
        Task::new(43, TaskState::InProgress, "Review pull request", "cat-1"),
        Task::new(44, TaskState::Done, "Archive old boards", "cat-404"),
        unknown_state,
    ]
}

fn sample_categories() -> BTreeMap<CategoryId, String> {
    BTreeMap::from([
        (CategoryId::from("cat-1"), "Work".to_string()),
        (CategoryId::from("cat-7"), "Docs".to_string()),
    ])
}

//! Run tracking and best-run selection
//!
//! Each training run records its hyperparameters, final metrics, and
//! artifact file names as a `run.json` beside the artifacts, under
//! `<root>/<run_id>/`. The serving layer scans these records to pick the
//! run to load.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

/// The file name of a run record within its run directory
pub static RUN_FILE: &str = "run.json";

/// Status of a training run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Run is still in progress
    Active,

    /// Run completed successfully
    Completed,

    /// Run failed before producing usable artifacts
    Failed,
}

/// The direction in which a metric is compared when selecting runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Lower values are better (e.g., loss)
    Minimize,

    /// Higher values are better (e.g., accuracy)
    Maximize,
}

impl TryFrom<&str> for Objective {
    type Error = TrackingError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "minimize" => Ok(Objective::Minimize),
            "maximize" => Ok(Objective::Maximize),
            _ => Err(TrackingError::UnknownObjective(value.to_string())),
        }
    }
}

/// A single training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier for the run
    pub run_id: String,

    /// The dataset the run trained on
    pub dataset: String,

    /// Current status
    pub status: RunStatus,

    /// Hyperparameters, string-encoded
    pub params: HashMap<String, String>,

    /// Final metrics recorded after training
    pub metrics: HashMap<String, f64>,

    /// Artifact file names within the run directory
    pub artifacts: Vec<String>,

    /// Unix timestamp (ms) when the run started
    pub start_time_ms: u64,

    /// Unix timestamp (ms) when the run ended
    pub end_time_ms: Option<u64>,
}

impl Run {
    /// Create a new active run, stamped with the current time
    pub fn new(run_id: String, dataset: String) -> Self {
        Self {
            run_id,
            dataset,
            status: RunStatus::Active,
            params: HashMap::new(),
            metrics: HashMap::new(),
            artifacts: Vec::new(),
            start_time_ms: now_ms(),
            end_time_ms: None,
        }
    }

    /// Record a string-encoded hyperparameter
    pub fn log_param(&mut self, key: &str, value: impl Into<String>) {
        self.params.insert(key.to_string(), value.into());
    }

    /// Record a final metric value
    pub fn log_metric(&mut self, key: &str, value: f64) {
        self.metrics.insert(key.to_string(), value);
    }

    /// Record an artifact file name within the run directory
    pub fn log_artifact(&mut self, name: &str) {
        self.artifacts.push(name.to_string());
    }

    /// Mark the run as completed and stamp its end time
    pub fn complete(&mut self) {
        self.status = RunStatus::Completed;
        self.end_time_ms = Some(now_ms());
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Errors from run tracking operations
#[derive(thiserror::Error, Debug)]
pub enum TrackingError {
    /// A run directory or record could not be read or written
    #[error("unable to access run store: {0}")]
    Io(#[from] std::io::Error),

    /// A run record could not be serialized or parsed
    #[error("invalid run record: {0}")]
    Record(#[from] serde_json::Error),

    /// No run matches the requested id
    #[error("run not found: {0}")]
    RunNotFound(String),

    /// No completed run carries the requested metric
    #[error("no completed run with metric {0}")]
    NoMatchingRun(String),

    /// No completed runs have been recorded yet
    #[error("no completed runs recorded")]
    NoRuns,

    /// The objective string is not recognized
    #[error("no objective found for {0}")]
    UnknownObjective(String),
}

/// A directory of runs, one subdirectory per run
#[derive(Clone)]
pub struct RunStore {
    root: String,
}

impl RunStore {
    /// Create a store rooted at the given directory
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }

    /// The directory holding a run's record and artifacts
    pub fn run_dir(&self, run_id: &str) -> String {
        format!("{}/{}", self.root, run_id)
    }

    /// Write a run record beside its artifacts
    pub fn save(&self, run: &Run) -> Result<(), TrackingError> {
        let dir = PathBuf::from(self.run_dir(&run.run_id));
        fs::create_dir_all(&dir)?;

        let json = serde_json::to_string_pretty(run)?;
        fs::write(dir.join(RUN_FILE), json)?;

        Ok(())
    }

    /// Load a run record by id
    pub fn load(&self, run_id: &str) -> Result<Run, TrackingError> {
        let path = Path::new(&self.root).join(run_id).join(RUN_FILE);

        if !path.exists() {
            return Err(TrackingError::RunNotFound(run_id.to_string()));
        }

        let json = fs::read_to_string(path)?;

        Ok(serde_json::from_str(&json)?)
    }

    /// List every readable run record under the store
    pub fn list(&self) -> Result<Vec<Run>, TrackingError> {
        let mut runs = Vec::new();

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(runs),
            Err(e) => return Err(e.into()),
        };

        for entry in entries {
            let path = entry?.path().join(RUN_FILE);

            if !path.exists() {
                continue;
            }

            let json = fs::read_to_string(path)?;
            runs.push(serde_json::from_str(&json)?);
        }

        Ok(runs)
    }

    /// Select the completed run with the best value for a metric
    pub fn best(&self, metric: &str, objective: Objective) -> Result<Run, TrackingError> {
        let best = self
            .list()?
            .into_iter()
            .filter(|run| run.status == RunStatus::Completed)
            .filter_map(|run| run.metrics.get(metric).copied().map(|value| (run, value)))
            .reduce(|best, candidate| {
                let better = match objective {
                    Objective::Minimize => candidate.1 < best.1,
                    Objective::Maximize => candidate.1 > best.1,
                };

                if better {
                    candidate
                } else {
                    best
                }
            });

        best.map(|(run, _)| run)
            .ok_or_else(|| TrackingError::NoMatchingRun(metric.to_string()))
    }

    /// Select the most recently started completed run
    pub fn latest(&self) -> Result<Run, TrackingError> {
        self.list()?
            .into_iter()
            .filter(|run| run.status == RunStatus::Completed)
            .max_by_key(|run| run.start_time_ms)
            .ok_or(TrackingError::NoRuns)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn completed(store: &RunStore, run_id: &str, test_loss: f64, start_time_ms: u64) -> Run {
        let mut run = Run::new(run_id.to_string(), "projects".to_string());
        run.log_metric("test_loss", test_loss);
        run.complete();
        run.start_time_ms = start_time_ms;

        store.save(&run).unwrap();

        run
    }

    #[test]
    fn saves_and_reloads_a_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path().to_str().unwrap());

        let mut run = Run::new("abc123".to_string(), "projects".to_string());
        run.log_param("batch_size", "32");
        run.log_metric("test_loss", 0.42);
        run.log_artifact("model.mpk");
        run.complete();

        store.save(&run).unwrap();

        let loaded = store.load("abc123").unwrap();

        assert_eq!(loaded.run_id, "abc123");
        assert_eq!(loaded.status, RunStatus::Completed);
        assert_eq!(loaded.params.get("batch_size"), Some(&"32".to_string()));
        assert_eq!(loaded.metrics.get("test_loss"), Some(&0.42));
        assert_eq!(loaded.artifacts, vec!["model.mpk".to_string()]);
    }

    #[test]
    fn loading_a_missing_run_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path().to_str().unwrap());

        assert!(matches!(
            store.load("missing"),
            Err(TrackingError::RunNotFound(_))
        ));
    }

    #[test]
    fn selects_the_best_run_by_objective() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path().to_str().unwrap());

        completed(&store, "first", 0.5, 1);
        completed(&store, "second", 0.3, 2);
        completed(&store, "third", 0.9, 3);

        let best = store.best("test_loss", Objective::Minimize).unwrap();
        assert_eq!(best.run_id, "second");

        let best = store.best("test_loss", Objective::Maximize).unwrap();
        assert_eq!(best.run_id, "third");
    }

    #[test]
    fn skips_runs_without_the_metric_or_completion() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path().to_str().unwrap());

        // Completed, but tracks a different metric
        let mut other = Run::new("other".to_string(), "projects".to_string());
        other.log_metric("test_accuracy", 0.99);
        other.complete();
        store.save(&other).unwrap();

        // Best on the metric, but never completed
        let mut active = Run::new("active".to_string(), "projects".to_string());
        active.log_metric("test_loss", 0.01);
        store.save(&active).unwrap();

        completed(&store, "done", 0.5, 1);

        let best = store.best("test_loss", Objective::Minimize).unwrap();
        assert_eq!(best.run_id, "done");
    }

    #[test]
    fn best_fails_with_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path().join("runs").to_str().unwrap());

        assert!(matches!(
            store.best("test_loss", Objective::Minimize),
            Err(TrackingError::NoMatchingRun(_))
        ));
    }

    #[test]
    fn selects_the_latest_completed_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunStore::new(dir.path().to_str().unwrap());

        completed(&store, "older", 0.5, 100);
        completed(&store, "newer", 0.9, 200);

        let latest = store.latest().unwrap();
        assert_eq!(latest.run_id, "newer");
    }

    #[test]
    fn parses_objectives() {
        assert!(matches!(
            Objective::try_from("minimize"),
            Ok(Objective::Minimize)
        ));
        assert!(matches!(
            Objective::try_from("maximize"),
            Ok(Objective::Maximize)
        ));
        assert!(matches!(
            Objective::try_from("sideways"),
            Err(TrackingError::UnknownObjective(_))
        ));
    }
}

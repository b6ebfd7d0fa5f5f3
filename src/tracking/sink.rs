use crate::tracking::record::RunRecord;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

//records a finished run for later inspection, returns the run id
pub trait ExperimentSink: Send + Sync {
    fn log_run(&self, record: &RunRecord) -> Result<String>;
}

//writes each run under <root>/<run_id>/: params.json, metrics.json, artifacts/<name>
#[derive(Debug)]
pub struct FileExperimentSink {
    root: PathBuf,
    sequence: AtomicU64,
}

impl FileExperimentSink {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        FileExperimentSink {
            root: root.into(),
            sequence: AtomicU64::new(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn next_run_id(&self, run_name: &str) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        let name: String = run_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        format!("{}-{}-{:04}", name, Utc::now().format("%Y%m%dT%H%M%S"), seq)
    }
}

impl ExperimentSink for FileExperimentSink {
    fn log_run(&self, record: &RunRecord) -> Result<String> {
        //artifacts are plain file names inside the run directory
        for artifact in record.artifacts() {
            let file_name = Path::new(&artifact.name).file_name();
            if file_name.map_or(true, |name| name != artifact.name.as_str()) {
                bail!("Invalid artifact name: {:?}", artifact.name);
            }
        }

        fs::create_dir_all(&self.root)
            .context(format!("Failed to create output directory {:?}", self.root))?;

        //another sink may share the root, never reuse an existing run directory
        let (run_id, run_dir) = loop {
            let run_id = self.next_run_id(record.run_name());
            let run_dir = self.root.join(&run_id);
            match fs::create_dir(&run_dir) {
                Ok(()) => break (run_id, run_dir),
                Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
                Err(err) => {
                    return Err(err)
                        .context(format!("Failed to create run directory {:?}", run_dir))
                }
            }
        };

        let artifact_dir = run_dir.join("artifacts");
        fs::create_dir(&artifact_dir)
            .context(format!("Failed to create artifact directory {:?}", artifact_dir))?;

        let params = serde_json::to_string_pretty(record.params())?;
        fs::write(run_dir.join("params.json"), params)
            .context(format!("Failed to write params for run {}", run_id))?;

        let metrics = serde_json::to_string_pretty(record.metrics())?;
        fs::write(run_dir.join("metrics.json"), metrics)
            .context(format!("Failed to write metrics for run {}", run_id))?;

        for artifact in record.artifacts() {
            fs::write(artifact_dir.join(&artifact.name), &artifact.contents).context(format!(
                "Failed to write artifact {} for run {}",
                artifact.name, run_id
            ))?;
        }

        Ok(run_id)
    }
}

//keeps logged runs in memory
#[derive(Debug, Default)]
pub struct InMemoryExperimentSink {
    runs: Mutex<Vec<(String, RunRecord)>>,
}

impl InMemoryExperimentSink {
    pub fn new() -> Self {
        Self::default()
    }

    //logged runs with their ids, in logging order
    pub fn runs(&self) -> Vec<(String, RunRecord)> {
        self.runs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl ExperimentSink for InMemoryExperimentSink {
    fn log_run(&self, record: &RunRecord) -> Result<String> {
        let mut runs = self
            .runs
            .lock()
            .map_err(|_| anyhow::anyhow!("experiment sink lock poisoned"))?;
        let run_id = format!("run-{}", runs.len() + 1);
        runs.push((run_id.clone(), record.clone()));
        Ok(run_id)
    }
}

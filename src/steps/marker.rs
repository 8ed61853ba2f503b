//! On-disk step completion markers.
//!
//! A step is complete when `<state_dir>/<step>.done` exists. The file holds
//! a small JSON record for humans and `hskc status`; its content is never
//! needed to decide whether a step runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{HskcError, Result};

const MARKER_EXTENSION: &str = "done";

/// What a marker file records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepMarker {
    pub step: String,
    pub completed_at: DateTime<Utc>,
    /// hskc version that completed the step.
    pub version: String,
}

/// The marker directory.
#[derive(Debug, Clone)]
pub struct StepMarkers {
    dir: PathBuf,
}

impl StepMarkers {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Marker file for `step`.
    pub fn path(&self, step: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", step, MARKER_EXTENSION))
    }

    pub fn is_complete(&self, step: &str) -> bool {
        self.path(step).exists()
    }

    /// The recorded marker, or `None` if absent or unreadable.
    pub fn read(&self, step: &str) -> Option<StepMarker> {
        let content = fs::read_to_string(self.path(step)).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Record `step` as complete.
    ///
    /// Written to a temp file and renamed so a crash never leaves a
    /// half-written marker behind.
    pub fn mark_complete(&self, step: &str) -> Result<StepMarker> {
        fs::create_dir_all(&self.dir)?;

        let marker = StepMarker {
            step: step.to_string(),
            completed_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        };
        let content = serde_json::to_string_pretty(&marker)
            .map_err(|e| HskcError::Other(anyhow::Error::new(e).context("serializing marker")))?;

        let path = self.path(step);
        let temp_path = path.with_extension("done.tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Marked step {} complete at {}", step, path.display());
        Ok(marker)
    }

    /// Remove the marker for `step`. Returns `false` if there was none.
    pub fn clear(&self, step: &str) -> Result<bool> {
        let path = self.path(step);
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)?;
        Ok(true)
    }

    /// Remove every marker, returning how many were removed.
    pub fn clear_all(&self) -> Result<usize> {
        let steps = self.list()?;
        for step in &steps {
            self.clear(step)?;
        }
        Ok(steps.len())
    }

    /// Names of completed steps, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut steps = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == MARKER_EXTENSION) && path.is_file() {
                if let Some(stem) = path.file_stem() {
                    steps.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        steps.sort();
        Ok(steps)
    }
}

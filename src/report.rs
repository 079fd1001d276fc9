//! Machine-readable session report written alongside the stdout contract.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const SESSION_REPORT_SCHEMA_VERSION: u32 = 1;

/// Full record of one grading session.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionReport {
    pub schema_version: u32,
    /// Scenario family graded (`signals`, `hunt`, `cgi`).
    pub family: String,
    pub scenarios: Vec<ScenarioResult>,
    pub passed_points: u32,
    pub total_points: u32,
}

/// Outcome of one scenario within the session.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub id: u32,
    pub pass: bool,
    /// False when the subject never ran (launch error); such a scenario
    /// scores zero but is distinct from a graded FAIL.
    pub graded: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_secs: Option<f64>,
    pub weight: u32,
}

impl SessionReport {
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize session report")?;
        std::fs::write(path, json.as_bytes())
            .with_context(|| format!("write session report {}", path.display()))?;
        Ok(())
    }
}

//! Data model for audit logging and run manifests.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const MANIFEST_VERSION: &str = "1.0.0";

/// Command-line invocation. `cwd` is a basename only, for privacy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandInfo {
    pub argv: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub rust_version: String,
    pub platform: String,
    pub package_version: String,
    pub dependencies: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    pub name: String,
    pub format: String,
    pub bytes: u64,
    pub sha256: String,
    pub records_extracted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtime: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputsInfo {
    pub root: String,
    pub files: Vec<FileInfo>,
    pub total_records_extracted: u64,
}

impl Default for InputsInfo {
    fn default() -> Self {
        InputsInfo { root: String::new(), files: Vec::new(), total_records_extracted: 0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub path: String,
    pub sha256: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_count: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageInfo {
    pub name: String,
    pub started_at: String,
    #[serde(default)]
    pub counters: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub timestamp: String,
    pub exception_class: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputsInfo {
    pub artifacts: Vec<ArtifactInfo>,
}

/// Complete run manifest, written atomically to `run.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestData {
    pub manifest_version: String,
    pub run_id: String,
    pub created_at: String,
    pub status: String,
    pub transform_version: String,
    pub command: CommandInfo,
    pub environment: EnvironmentInfo,
    pub inputs: InputsInfo,
    pub parameters: serde_json::Value,
    pub stages: Vec<StageInfo>,
    pub outputs: OutputsInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub errors: Vec<ErrorInfo>,
}

/// A single structured audit event, one JSON object per `events.jsonl` line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEvent {
    pub ts: String,
    pub run_id: String,
    pub level: String,
    pub event: String,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rid: Option<String>,
}

//! Atomic run-manifest writer with O(1) stage lookup.
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::AuditError;
use crate::helpers::iso_timestamp;
use crate::models::{
    ArtifactInfo, CommandInfo, EnvironmentInfo, ErrorInfo, InputsInfo, ManifestData, OutputsInfo,
    StageInfo, MANIFEST_VERSION,
};

struct ManifestState {
    manifest: ManifestData,
    stage_index: BTreeMap<String, usize>,
}

/// Builds a run manifest incrementally and writes it atomically (temp file,
/// fsync, rename) so a reader never observes a partially-written
/// `run.json`.
pub struct ManifestWriter {
    manifest_path: PathBuf,
    state: Mutex<ManifestState>,
}

impl ManifestWriter {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        run_id: impl Into<String>,
        output_dir: &Path,
        command: CommandInfo,
        environment: EnvironmentInfo,
        transform_version: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        let manifest = ManifestData {
            manifest_version: MANIFEST_VERSION.to_string(),
            run_id: run_id.into(),
            created_at: iso_timestamp(),
            status: "partial".to_string(),
            transform_version: transform_version.into(),
            command,
            environment,
            inputs: InputsInfo::default(),
            parameters,
            stages: Vec::new(),
            outputs: OutputsInfo::default(),
            finished_at: None,
            duration_seconds: None,
            errors: Vec::new(),
        };

        ManifestWriter {
            manifest_path: output_dir.join("run.json"),
            state: Mutex::new(ManifestState { manifest, stage_index: BTreeMap::new() }),
        }
    }

    pub fn set_inputs(&self, inputs: InputsInfo) {
        self.state.lock().expect("manifest lock poisoned").manifest.inputs = inputs;
    }

    pub fn add_stage(&self, stage: StageInfo) {
        let mut state = self.state.lock().expect("manifest lock poisoned");
        state.stage_index.insert(stage.name.clone(), state.manifest.stages.len());
        state.manifest.stages.push(stage);
    }

    pub fn update_stage_counters(&self, stage_name: &str, counters: BTreeMap<String, u64>) -> Result<(), AuditError> {
        let mut state = self.state.lock().expect("manifest lock poisoned");
        let idx = *state
            .stage_index
            .get(stage_name)
            .ok_or_else(|| AuditError::StageNotFound { stage: stage_name.to_string() })?;
        state.manifest.stages[idx].counters.extend(counters);
        Ok(())
    }

    pub fn finish_stage(&self, stage_name: &str, finished_at: Option<String>, duration_seconds: Option<f64>) -> Result<(), AuditError> {
        let mut state = self.state.lock().expect("manifest lock poisoned");
        let idx = *state
            .stage_index
            .get(stage_name)
            .ok_or_else(|| AuditError::StageNotFound { stage: stage_name.to_string() })?;
        let stage = &mut state.manifest.stages[idx];
        stage.finished_at = Some(finished_at.unwrap_or_else(iso_timestamp));
        stage.duration_seconds = duration_seconds;
        Ok(())
    }

    pub fn add_output_artifact(&self, artifact: ArtifactInfo) {
        self.state.lock().expect("manifest lock poisoned").manifest.outputs.artifacts.push(artifact);
    }

    pub fn add_error(&self, error: ErrorInfo) {
        self.state.lock().expect("manifest lock poisoned").manifest.errors.push(error);
    }

    /// Hashes `events.jsonl` and registers it as an output artifact. Call
    /// after the audit logger has been closed so the file is complete.
    pub fn compute_output_artifacts(&self, output_dir: &Path) -> Result<(), AuditError> {
        let events_path = output_dir.join("events.jsonl");
        if !events_path.exists() {
            return Ok(());
        }
        let bytes = fs::read(&events_path)
            .map_err(|e| AuditError::Io { path: events_path.display().to_string(), message: e.to_string() })?;
        let sha256 = srdedupe_ids::sha256_hex(&bytes);
        self.add_output_artifact(ArtifactInfo {
            path: "events.jsonl".to_string(),
            sha256,
            bytes: Some(bytes.len() as u64),
            record_count: None,
        });
        Ok(())
    }

    pub fn finish(&self, status: &str, finished_at: Option<String>, duration_seconds: Option<f64>) -> Result<(), AuditError> {
        {
            let mut state = self.state.lock().expect("manifest lock poisoned");
            state.manifest.status = status.to_string();
            state.manifest.finished_at = Some(finished_at.unwrap_or_else(iso_timestamp));
            state.manifest.duration_seconds = duration_seconds;
        }
        self.write_atomic()
    }

    pub fn to_value(&self) -> serde_json::Value {
        let state = self.state.lock().expect("manifest lock poisoned");
        serde_json::to_value(&state.manifest).expect("ManifestData serializes infallibly")
    }

    fn write_atomic(&self) -> Result<(), AuditError> {
        let state = self.state.lock().expect("manifest lock poisoned");
        let pretty = serde_json::to_string_pretty(&state.manifest)
            .map_err(|e| AuditError::Io { path: self.manifest_path.display().to_string(), message: e.to_string() })?;

        let temp_path = self.manifest_path.with_extension("tmp");
        {
            let mut file = File::create(&temp_path)
                .map_err(|e| AuditError::Io { path: temp_path.display().to_string(), message: e.to_string() })?;
            file.write_all(pretty.as_bytes())
                .map_err(|e| AuditError::Io { path: temp_path.display().to_string(), message: e.to_string() })?;
            file.write_all(b"\n")
                .map_err(|e| AuditError::Io { path: temp_path.display().to_string(), message: e.to_string() })?;
            file.sync_all()
                .map_err(|e| AuditError::Io { path: temp_path.display().to_string(), message: e.to_string() })?;
        }

        fs::rename(&temp_path, &self.manifest_path)
            .map_err(|e| AuditError::Io { path: self.manifest_path.display().to_string(), message: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn writer(dir: &Path) -> ManifestWriter {
        ManifestWriter::new(
            "run-1",
            dir,
            CommandInfo { argv: vec!["srdedupe".to_string()], cwd: None },
            EnvironmentInfo {
                rust_version: "1.80.0".to_string(),
                platform: "linux-x86_64".to_string(),
                package_version: "0.1.0".to_string(),
                dependencies: Default::default(),
            },
            "0.1.0",
            serde_json::json!({}),
        )
    }

    #[test]
    fn finish_stage_requires_started_stage() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path());
        let err = writer.finish_stage("missing", None, None).unwrap_err();
        assert!(matches!(err, AuditError::StageNotFound { .. }));
    }

    #[test]
    fn writes_run_json_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let writer = writer(dir.path());
        writer.add_stage(StageInfo { name: "ingest".to_string(), started_at: iso_timestamp(), ..Default::default() });
        writer.finish_stage("ingest", None, Some(1.0)).unwrap();
        writer.finish("success", None, Some(1.0)).unwrap();

        let manifest_path = dir.path().join("run.json");
        assert!(manifest_path.exists());
        assert!(!dir.path().join("run.tmp").exists());
        let content = fs::read_to_string(&manifest_path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["status"], "success");
    }
}

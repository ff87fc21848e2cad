//! Ties [`AuditLogger`] and [`ManifestWriter`] to a single pipeline run.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use tracing::instrument;

use crate::error::AuditError;
use crate::helpers::{generate_run_id, iso_timestamp};
use crate::logger::AuditLogger;
use crate::manifest::ManifestWriter;
use crate::models::{CommandInfo, EnvironmentInfo, ErrorInfo, InputsInfo, StageInfo};

/// Lifecycle manager for a single pipeline run: creates the output
/// directory layout, opens the event log, and builds the run manifest.
pub struct RunContext {
    pub run_id: String,
    pub output_dir: PathBuf,
    pub audit_logger: AuditLogger,
    pub manifest_writer: ManifestWriter,
    start_time: Instant,
    stage_start_times: Mutex<BTreeMap<String, Instant>>,
}

impl RunContext {
    /// Creates `output_dir/{artifacts,reports}`, opens `events.jsonl`, and
    /// logs `run_started`.
    pub fn start(
        output_dir: &Path,
        parameters: serde_json::Value,
        command_argv: Vec<String>,
        environment: EnvironmentInfo,
        transform_version: String,
    ) -> Result<RunContext, AuditError> {
        let run_id = generate_run_id();

        fs::create_dir_all(output_dir)
            .map_err(|e| AuditError::Io { path: output_dir.display().to_string(), message: e.to_string() })?;
        fs::create_dir_all(output_dir.join("artifacts"))
            .map_err(|e| AuditError::Io { path: output_dir.display().to_string(), message: e.to_string() })?;
        fs::create_dir_all(output_dir.join("reports"))
            .map_err(|e| AuditError::Io { path: output_dir.display().to_string(), message: e.to_string() })?;

        let cwd = std::env::current_dir()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()));
        let command = CommandInfo { argv: command_argv.clone(), cwd };

        let audit_logger = AuditLogger::new(run_id.clone(), output_dir.join("events.jsonl"))?;

        let manifest_writer = ManifestWriter::new(
            run_id.clone(),
            output_dir,
            command,
            environment,
            transform_version,
            parameters.clone(),
        );

        audit_logger.run_started(&command_argv, &parameters);

        Ok(RunContext {
            run_id,
            output_dir: output_dir.to_path_buf(),
            audit_logger,
            manifest_writer,
            start_time: Instant::now(),
            stage_start_times: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn set_inputs(&self, inputs: InputsInfo) {
        self.manifest_writer.set_inputs(inputs);
    }

    #[instrument(skip(self))]
    pub fn start_stage(&self, stage_name: &str, expected_records: Option<u64>) {
        self.stage_start_times
            .lock()
            .expect("run context stage-timer lock poisoned")
            .insert(stage_name.to_string(), Instant::now());

        self.manifest_writer.add_stage(StageInfo { name: stage_name.to_string(), started_at: iso_timestamp(), ..Default::default() });
        self.audit_logger.stage_started(stage_name, expected_records);
    }

    #[instrument(skip(self, counters))]
    pub fn finish_stage(&self, stage_name: &str, counters: BTreeMap<String, u64>) -> Result<(), AuditError> {
        let start = self
            .stage_start_times
            .lock()
            .expect("run context stage-timer lock poisoned")
            .remove(stage_name)
            .ok_or_else(|| AuditError::StageNotStarted { stage: stage_name.to_string() })?;

        let duration = start.elapsed().as_secs_f64();
        self.manifest_writer.finish_stage(stage_name, Some(iso_timestamp()), Some(duration))?;
        if !counters.is_empty() {
            self.manifest_writer.update_stage_counters(stage_name, counters.clone())?;
        }
        self.audit_logger.stage_finished(stage_name, duration, &counters);
        Ok(())
    }

    pub fn record_error(&self, exception_class: &str, message: &str, stage: Option<&str>, rid: Option<&str>, traceback: Option<&str>) {
        self.manifest_writer.add_error(ErrorInfo {
            timestamp: iso_timestamp(),
            exception_class: exception_class.to_string(),
            message: message.to_string(),
            stage: stage.map(String::from),
            traceback: traceback.map(String::from),
            rid: rid.map(String::from),
        });
        self.audit_logger.error(exception_class, message, stage, rid, traceback);
    }

    /// Finishes the run: logs `run_finished`, closes the event log (so it
    /// is complete before being hashed), then finalizes `run.json`.
    pub fn finish(&self, status: &str, records_processed: Option<u64>) -> Result<(), AuditError> {
        let duration = self.start_time.elapsed().as_secs_f64();

        self.audit_logger.run_finished(status, duration, records_processed);
        self.audit_logger.close()?;

        self.manifest_writer.compute_output_artifacts(&self.output_dir)?;
        self.manifest_writer.finish(status, Some(iso_timestamp()), Some(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment() -> EnvironmentInfo {
        EnvironmentInfo {
            rust_version: "1.80.0".to_string(),
            platform: crate::helpers::platform_info(),
            package_version: "0.1.0".to_string(),
            dependencies: BTreeMap::new(),
        }
    }

    #[test]
    fn full_run_writes_events_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::start(
            dir.path(),
            serde_json::json!({"alpha": 0.05}),
            vec!["srdedupe".to_string(), "run".to_string()],
            environment(),
            "0.1.0".to_string(),
        )
        .unwrap();

        ctx.start_stage("ingest", Some(5));
        ctx.finish_stage("ingest", BTreeMap::from([("records_in".to_string(), 5u64)])).unwrap();
        ctx.finish("success", Some(5)).unwrap();

        assert!(dir.path().join("events.jsonl").exists());
        assert!(dir.path().join("run.json").exists());
        assert!(dir.path().join("artifacts").is_dir());
        assert!(dir.path().join("reports").is_dir());

        let manifest: serde_json::Value = serde_json::from_str(&fs::read_to_string(dir.path().join("run.json")).unwrap()).unwrap();
        assert_eq!(manifest["status"], "success");
        assert_eq!(manifest["stages"][0]["name"], "ingest");
    }

    #[test]
    fn finishing_unstarted_stage_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RunContext::start(dir.path(), serde_json::json!({}), vec![], environment(), "0.1.0".to_string()).unwrap();
        let err = ctx.finish_stage("never_started", BTreeMap::new()).unwrap_err();
        assert!(matches!(err, AuditError::StageNotStarted { .. }));
    }
}

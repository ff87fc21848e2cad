//! `srdedupe`: a deterministic, auditable deduplication engine for
//! bibliographic reference records (RIS, PubMed/MEDLINE, BibTeX, Web of
//! Science, EndNote Tagged).
//!
//! [`run_pipeline`] drives the six-stage linkage pipeline end to end:
//! ingest+normalize, candidate generation, pairwise scoring, three-way
//! decision, transitive clustering, and canonical merge. Each stage
//! persists its own JSONL artifact under `output_dir` so a run can be
//! inspected or resumed from disk, while [`run_pipeline`] also threads the
//! in-memory `Vec<CanonicalRecord>` between stages so later stages never
//! need to re-read earlier JSONL.
//!
//! ## Observability
//!
//! Every stage both emits a `tracing` span/event and appends a structured
//! line to `events.jsonl` via [`srdedupe_audit::RunContext`]. A
//! [`PipelineEventLogger`] hook (with a [`KeyValueLogger`] default
//! implementation) can additionally be installed with
//! [`set_pipeline_logger`] for callers that want a synchronous, in-process
//! view of stage outcomes without parsing `events.jsonl`.
//!
//! ## Errors
//!
//! Per-record failures (a malformed tag, a record missing required fields)
//! are isolated: the stage continues, and the failure surfaces as a
//! warning in `reports/ingestion_report.json` or a safety-gate reason
//! rather than aborting the run. Only stage-level and pre-pipeline
//! failures converge on [`PipelineError`], which mirrors the seven error
//! kinds of the original design (ingestion, parse, calibration, merge
//! conflict, configuration, I/O) while preserving the originating crate's
//! error as `source()`.

pub mod config;

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use std::time::Instant;

use tracing::instrument;

pub use config::{ConfigLoadError, SrdedupeConfig};

use srdedupe_audit::{
    ArtifactInfo, AuditError, EnvironmentInfo, FileInfo, InputsInfo, RunContext,
};
use srdedupe_blocking::{create_blockers, generate_candidates, BlockingError, GenerationStats};
use srdedupe_clustering::{build_clusters, Cluster, ClusteringError};
use srdedupe_decision::{
    calibrate_conformal_threshold, calibrate_np_threshold, load_calibration_set,
    make_pair_decisions, write_conformal_calibration_report, write_decision_summary,
    ConfusionMatrix, DecisionError, DecisionSummary, NpCalibration, Thresholds,
};
use srdedupe_ids::sha256_hex;
use srdedupe_ingest::{ingest_file, ingest_folder, FileIngestionResult, IngestionReport};
use srdedupe_merge::{process_canonical_merge, MergeError, MergeSummary};
use srdedupe_model::{jsonl, CanonicalRecord};
use srdedupe_scoring::{load_model, score_all_pairs, ScoringError};

/// Bundled default Fellegi-Sunter model, embedded at compile time so the
/// binary works with no `fs_model_path` configured.
const DEFAULT_FS_MODEL: &str = include_str!("../models/fs_v1.yaml");

/// Aggregated error type for every stage-level and pre-pipeline failure.
/// Per-record failures never reach this type — see the module docs.
#[derive(Debug)]
pub enum PipelineError {
    Config(ConfigLoadError),
    Blocking(BlockingError),
    Scoring(ScoringError),
    Decision(DecisionError),
    Clustering(ClusteringError),
    Merge(MergeError),
    Audit(AuditError),
    Io { path: String, message: String },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Config(err) => write!(f, "configuration error: {err}"),
            PipelineError::Blocking(err) => write!(f, "candidate generation failed: {err}"),
            PipelineError::Scoring(err) => write!(f, "pairwise scoring failed: {err}"),
            PipelineError::Decision(err) => write!(f, "calibration/decision failed: {err}"),
            PipelineError::Clustering(err) => write!(f, "clustering failed: {err}"),
            PipelineError::Merge(err) => write!(f, "canonical merge failed: {err}"),
            PipelineError::Audit(err) => write!(f, "audit/manifest failure: {err}"),
            PipelineError::Io { path, message } => write!(f, "I/O failure at {path}: {message}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Config(err) => Some(err),
            PipelineError::Blocking(err) => Some(err),
            PipelineError::Scoring(err) => Some(err),
            PipelineError::Decision(err) => Some(err),
            PipelineError::Clustering(err) => Some(err),
            PipelineError::Merge(err) => Some(err),
            PipelineError::Audit(err) => Some(err),
            PipelineError::Io { .. } => None,
        }
    }
}

impl From<ConfigLoadError> for PipelineError {
    fn from(value: ConfigLoadError) -> Self {
        PipelineError::Config(value)
    }
}

impl From<BlockingError> for PipelineError {
    fn from(value: BlockingError) -> Self {
        PipelineError::Blocking(value)
    }
}

impl From<ScoringError> for PipelineError {
    fn from(value: ScoringError) -> Self {
        PipelineError::Scoring(value)
    }
}

impl From<DecisionError> for PipelineError {
    fn from(value: DecisionError) -> Self {
        PipelineError::Decision(value)
    }
}

impl From<ClusteringError> for PipelineError {
    fn from(value: ClusteringError) -> Self {
        PipelineError::Clustering(value)
    }
}

impl From<MergeError> for PipelineError {
    fn from(value: MergeError) -> Self {
        PipelineError::Merge(value)
    }
}

impl From<AuditError> for PipelineError {
    fn from(value: AuditError) -> Self {
        PipelineError::Audit(value)
    }
}

/// Outcome of a full pipeline run. Populated incrementally as stages
/// complete so a late-stage failure still reports what ran.
#[derive(Debug, Clone, Default)]
pub struct PipelineResult {
    pub success: bool,
    pub total_records: u64,
    pub total_candidates: u64,
    pub total_duplicates_auto: u64,
    pub total_review_records: u64,
    pub total_unique_records: u64,
    pub dedup_rate: f64,
    pub output_files: BTreeMap<String, String>,
    pub error_message: Option<String>,
}

/// Processing stage captured in observability events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Ingest,
    Blocking,
    Scoring,
    Decision,
    Clustering,
    Merge,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Ingest => "ingest",
            PipelineStage::Blocking => "blocking",
            PipelineStage::Scoring => "scoring",
            PipelineStage::Decision => "decision",
            PipelineStage::Clustering => "clustering",
            PipelineStage::Merge => "merge",
        };
        f.write_str(name)
    }
}

/// Outcome of a pipeline stage, for [`PipelineEventLogger`] consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineEventStatus {
    Success,
    Failure,
}

impl fmt::Display for PipelineEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineEventStatus::Success => "success",
            PipelineEventStatus::Failure => "failure",
        };
        f.write_str(label)
    }
}

/// Structured observation describing the outcome of a pipeline stage.
#[derive(Debug, Clone)]
pub struct PipelineEvent {
    pub stage: PipelineStage,
    pub status: PipelineEventStatus,
    pub duration: std::time::Duration,
    pub counters: BTreeMap<String, u64>,
    pub error: Option<String>,
}

impl PipelineEvent {
    fn format_key_values(&self) -> String {
        let mut parts = vec![
            format!("stage={}", self.stage),
            format!("status={}", self.status),
            format!("duration_us={}", self.duration.as_micros()),
        ];
        for (key, value) in &self.counters {
            parts.push(format!("{key}={value}"));
        }
        if let Some(error) = &self.error {
            parts.push(format!("error=\"{}\"", escape_kv(error)));
        }
        parts.join(" ")
    }
}

fn escape_kv(input: &str) -> String {
    input.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

/// Hook for emitting structured events per pipeline stage, in addition to
/// the `events.jsonl` audit trail every run always writes.
pub trait PipelineEventLogger: Send + Sync {
    fn log(&self, event: &PipelineEvent);
}

/// Key-value line logger, mirroring the audit crate's JSONL events in a
/// human-readable form for local/interactive use.
pub struct KeyValueLogger {
    writer: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl KeyValueLogger {
    pub fn stdout() -> Self {
        Self::new(Box::new(io::stdout()))
    }

    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer: Arc::new(Mutex::new(writer)) }
    }
}

impl PipelineEventLogger for KeyValueLogger {
    fn log(&self, event: &PipelineEvent) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "{}", event.format_key_values());
        }
    }
}

fn logger_lock() -> &'static RwLock<Option<Arc<dyn PipelineEventLogger>>> {
    static LOGGER: OnceLock<RwLock<Option<Arc<dyn PipelineEventLogger>>>> = OnceLock::new();
    LOGGER.get_or_init(|| RwLock::new(None))
}

/// Installs or clears the global structured pipeline event logger.
pub fn set_pipeline_logger(logger: Option<Arc<dyn PipelineEventLogger>>) {
    *logger_lock().write().expect("pipeline logger lock poisoned") = logger;
}

fn pipeline_logger() -> Option<Arc<dyn PipelineEventLogger>> {
    logger_lock().read().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
}

fn emit_stage_event(stage: PipelineStage, start: Instant, counters: BTreeMap<String, u64>, error: Option<String>) {
    if let Some(logger) = pipeline_logger() {
        let status = if error.is_some() { PipelineEventStatus::Failure } else { PipelineEventStatus::Success };
        logger.log(&PipelineEvent { stage, status, duration: start.elapsed(), counters, error });
    }
}

fn io_err(path: &Path, err: std::io::Error) -> PipelineError {
    PipelineError::Io { path: path.display().to_string(), message: err.to_string() }
}

fn write_jsonl_sorted<T: serde::Serialize>(path: &Path, items: &[T]) -> Result<(), PipelineError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let mut out = String::new();
    for item in items {
        let line = jsonl::to_sorted_line(item).map_err(|e| PipelineError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        out.push_str(&line);
        out.push('\n');
    }
    fs::write(path, out).map_err(|e| io_err(path, e))
}

fn artifact_info(path: &Path, record_count: Option<u64>) -> Result<ArtifactInfo, PipelineError> {
    let bytes = fs::read(path).map_err(|e| io_err(path, e))?;
    Ok(ArtifactInfo {
        path: path.display().to_string(),
        sha256: sha256_hex(&bytes),
        bytes: Some(bytes.len() as u64),
        record_count,
    })
}

/// Runs ingest (single file or a whole folder) followed by normalization,
/// returning records sorted by `rid` so downstream artifacts are
/// invariant under the caller's file ordering.
#[instrument(skip(input_path), fields(path = %input_path.display()))]
fn stage1_ingest_and_normalize(input_path: &Path) -> (Vec<CanonicalRecord>, IngestionReport) {
    let (raw_records, report) = if input_path.is_dir() {
        ingest_folder(input_path, true)
    } else {
        let (records, file_result) = ingest_file(input_path);
        let report = IngestionReport {
            tool_version: srdedupe_ingest::INGESTION_VERSION.to_string(),
            run_timestamp: srdedupe_audit::iso_timestamp(),
            total_files: 1,
            total_records: records.len(),
            total_errors: file_result.errors.len(),
            total_warnings: file_result.warnings.len(),
            file_results: vec![file_result],
        };
        (records, report)
    };

    let mut records: Vec<CanonicalRecord> =
        raw_records.into_iter().map(srdedupe_normalize::normalize).collect();
    records.sort_by(|a, b| a.rid.cmp(&b.rid));

    (records, report)
}

fn default_thresholds_and_calibration(
    decision_cfg: &config::DecisionYamlConfig,
) -> (Thresholds, NpCalibration, Option<srdedupe_decision::ConformalCalibration>) {
    let t_high = decision_cfg.resolved_t_high();
    let thresholds = Thresholds {
        t_high,
        t_low: decision_cfg.t_low,
        t_high_np: Some(t_high),
        t_high_conformal: None,
    };
    let np_calibration = NpCalibration {
        alpha: decision_cfg.fpr_alpha,
        calibration_set: "none".to_string(),
        method: "default_no_calibration_data".to_string(),
        calibration_size: 0,
        estimated_fpr: decision_cfg.fpr_alpha,
        confusion_matrix: ConfusionMatrix { tp: 0, fp: 0, tn: 0, fn_: 0 },
    };
    (thresholds, np_calibration, None)
}

fn calibrated_thresholds(
    decision_cfg: &config::DecisionYamlConfig,
    calibration_set_path: &Path,
) -> Result<(Thresholds, NpCalibration, Option<srdedupe_decision::ConformalCalibration>), PipelineError> {
    let pairs = load_calibration_set(calibration_set_path)?;
    let (t_high_np, np_calibration) = calibrate_np_threshold(
        &pairs,
        decision_cfg.fpr_alpha,
        &calibration_set_path.display().to_string(),
        decision_cfg.min_calibration_pairs,
    )?;

    let conformal = if decision_cfg.conformal.enabled {
        Some(calibrate_conformal_threshold(&pairs, decision_cfg.fpr_alpha, decision_cfg.conformal.delta, "p_match")?)
    } else {
        None
    };

    let (t_high_final, t_high_np_out, t_high_conformal_out) =
        srdedupe_decision::compute_final_threshold(t_high_np, conformal.as_ref());

    let t_high = t_high_final.unwrap_or_else(|| decision_cfg.resolved_t_high());
    let thresholds = Thresholds {
        t_high,
        t_low: decision_cfg.t_low,
        t_high_np: t_high_np_out,
        t_high_conformal: t_high_conformal_out,
    };
    Ok((thresholds, np_calibration, conformal))
}

/// Runs the full six-stage pipeline against `input_path` (a single file or
/// a folder of bibliographic export files), writing every intermediate
/// artifact under `config.output_dir` and returning a [`PipelineResult`]
/// with aggregate counters. Never panics on a data problem; stage-level
/// failures return `Err` with the run's partial artifacts preserved on
/// disk (matching the manifest's `"failed"` status).
pub fn run_pipeline(input_path: &Path, config: &SrdedupeConfig, command_argv: Vec<String>) -> Result<PipelineResult, PipelineError> {
    let output_dir = &config.output_dir;
    let environment = EnvironmentInfo {
        rust_version: "unknown".to_string(),
        platform: srdedupe_audit::platform_info(),
        package_version: env!("CARGO_PKG_VERSION").to_string(),
        dependencies: BTreeMap::new(),
    };
    let transform_version = srdedupe_audit::transform_version(env!("CARGO_PKG_VERSION"));
    let parameters = serde_json::json!({
        "fpr_alpha": config.decision.fpr_alpha,
        "t_low": config.decision.t_low,
        "t_high": config.decision.t_high,
        "candidate_blockers": config.blocking.blockers.iter().map(|b| b.blocker_type.clone()).collect::<Vec<_>>(),
        "output_dir": output_dir.display().to_string(),
    });

    let ctx = RunContext::start(output_dir, parameters, command_argv, environment, transform_version)?;

    match run_pipeline_inner(input_path, config, &ctx, output_dir) {
        Ok(result) => {
            ctx.finish("success", Some(result.total_records))?;
            Ok(result)
        }
        Err(err) => {
            ctx.record_error("PipelineError", &err.to_string(), None, None, None);
            let _ = ctx.finish("failed", None);
            Err(err)
        }
    }
}

fn run_pipeline_inner(
    input_path: &Path,
    config: &SrdedupeConfig,
    ctx: &RunContext,
    output_dir: &Path,
) -> Result<PipelineResult, PipelineError> {
    let mut result = PipelineResult::default();
    let stage1_dir = output_dir.join("stage1");
    let stage2_dir = output_dir.join("stage2");
    let stage3_dir = output_dir.join("stage3");
    let stage4_dir = output_dir.join("stage4");
    let stage5_dir = output_dir.join("stage5");
    let artifacts_dir = output_dir.join("artifacts");
    let reports_dir = output_dir.join("reports");

    // --- Stage 1: ingest + normalize ---
    let start = Instant::now();
    ctx.start_stage("ingest", None);
    let (records, ingestion_report) = stage1_ingest_and_normalize(input_path);
    result.total_records = records.len() as u64;

    let canonical_records_path = stage1_dir.join("canonical_records.jsonl");
    write_jsonl_sorted(&canonical_records_path, &records)?;

    let ingestion_report_path = reports_dir.join("ingestion_report.json");
    fs::create_dir_all(&reports_dir).map_err(|e| io_err(&reports_dir, e))?;
    let report_json = serde_json::to_string_pretty(&ingestion_report)
        .map_err(|e| PipelineError::Io { path: ingestion_report_path.display().to_string(), message: e.to_string() })?;
    fs::write(&ingestion_report_path, report_json).map_err(|e| io_err(&ingestion_report_path, e))?;

    let inputs = InputsInfo {
        root: input_path.display().to_string(),
        files: ingestion_report
            .file_results
            .iter()
            .map(|f: &FileIngestionResult| FileInfo {
                name: f.filename.clone(),
                format: f.format_detected.clone(),
                bytes: f.file_size,
                sha256: f.file_digest.clone(),
                records_extracted: f.records_parsed as u64,
                mtime: f.file_mtime.clone(),
            })
            .collect(),
        total_records_extracted: ingestion_report.total_records as u64,
    };
    ctx.set_inputs(inputs);

    let mut stage_counters = BTreeMap::new();
    stage_counters.insert("records_in".to_string(), result.total_records);
    stage_counters.insert("ingestion_errors".to_string(), ingestion_report.total_errors as u64);
    ctx.finish_stage("ingest", stage_counters.clone())?;
    emit_stage_event(PipelineStage::Ingest, start, stage_counters, None);
    result.output_files.insert("canonical_records".to_string(), canonical_records_path.display().to_string());
    result.output_files.insert("ingestion_report".to_string(), ingestion_report_path.display().to_string());

    if records.is_empty() {
        result.success = true;
        result.dedup_rate = 0.0;
        return Ok(result);
    }

    // --- Stage 2: candidate generation ---
    let start = Instant::now();
    ctx.start_stage("blocking", Some(records.len() as u64));
    let blockers = create_blockers(&config.blocking.blockers)?;
    let candidate_pairs_path = stage2_dir.join("candidate_pairs.jsonl");
    let generation_stats: GenerationStats =
        generate_candidates(blockers, &records, &candidate_pairs_path, config.blocking.max_block_size)?;
    result.total_candidates = generation_stats.global.pairs_total_unique;

    let mut stage_counters = BTreeMap::new();
    stage_counters.insert("candidates".to_string(), result.total_candidates);
    ctx.finish_stage("blocking", stage_counters.clone())?;
    emit_stage_event(PipelineStage::Blocking, start, stage_counters, None);
    result.output_files.insert("candidate_pairs".to_string(), candidate_pairs_path.display().to_string());

    if result.total_candidates == 0 {
        result.success = true;
        result.total_unique_records = result.total_records;
        result.dedup_rate = 0.0;
        return Ok(result);
    }

    // --- Stage 3: pairwise scoring ---
    let start = Instant::now();
    ctx.start_stage("scoring", Some(result.total_candidates));
    let model = match &config.scoring.fs_model_path {
        Some(path) => load_model(path)?,
        None => {
            let config_value: srdedupe_scoring::FSModelConfig = serde_yaml::from_str(DEFAULT_FS_MODEL)
                .expect("bundled default model is valid YAML");
            srdedupe_scoring::FSModel::new(config_value)
        }
    };
    let scored_pairs_path = stage3_dir.join("scored_pairs.jsonl");
    let scoring_stats = score_all_pairs(&candidate_pairs_path, &records, &scored_pairs_path, &model)?;

    let mut stage_counters = BTreeMap::new();
    stage_counters.insert("pairs_scored".to_string(), scoring_stats.pairs_scored);
    ctx.finish_stage("scoring", stage_counters.clone())?;
    emit_stage_event(PipelineStage::Scoring, start, stage_counters, None);
    result.output_files.insert("scored_pairs".to_string(), scored_pairs_path.display().to_string());

    // --- Stage 4: three-way decision ---
    let start = Instant::now();
    ctx.start_stage("decision", Some(scoring_stats.pairs_scored));
    let (thresholds, np_calibration, conformal) = match &config.decision.calibration_set_path {
        Some(path) => calibrated_thresholds(&config.decision, path)?,
        None => default_thresholds_and_calibration(&config.decision),
    };

    let pair_decisions_path = stage4_dir.join("pair_decisions.jsonl");
    let decision_summary: DecisionSummary = make_pair_decisions(
        &scored_pairs_path,
        &records,
        &thresholds,
        &np_calibration,
        &pair_decisions_path,
        conformal.as_ref(),
    )?;
    result.total_duplicates_auto = decision_summary.auto_dup;

    fs::create_dir_all(&reports_dir).map_err(|e| io_err(&reports_dir, e))?;
    let decision_summary_path = reports_dir.join("decision_summary.json");
    write_decision_summary(&decision_summary, &decision_summary_path)?;
    if let Some(conformal) = &conformal {
        write_conformal_calibration_report(conformal, &reports_dir.join("conformal_calibration.json"))?;
    }

    let mut stage_counters = BTreeMap::new();
    stage_counters.insert("auto_dup".to_string(), decision_summary.auto_dup);
    stage_counters.insert("review".to_string(), decision_summary.review);
    stage_counters.insert("auto_keep".to_string(), decision_summary.auto_keep);
    ctx.finish_stage("decision", stage_counters.clone())?;
    emit_stage_event(PipelineStage::Decision, start, stage_counters, None);
    result.output_files.insert("pair_decisions".to_string(), pair_decisions_path.display().to_string());

    // --- Stage 5: transitive clustering ---
    let start = Instant::now();
    ctx.start_stage("clustering", None);
    let clusters: Vec<Cluster> = build_clusters(&pair_decisions_path, &records, &config.clustering)?;
    let clusters_path = stage5_dir.join("clusters.jsonl");
    write_jsonl_sorted(&clusters_path, &clusters)?;

    let mut stage_counters = BTreeMap::new();
    stage_counters.insert("clusters".to_string(), clusters.len() as u64);
    ctx.finish_stage("clustering", stage_counters.clone())?;
    emit_stage_event(PipelineStage::Clustering, start, stage_counters, None);
    result.output_files.insert("clusters".to_string(), clusters_path.display().to_string());

    // --- Stage 6: canonical merge ---
    let start = Instant::now();
    ctx.start_stage("merge", None);
    let merge_summary: MergeSummary = process_canonical_merge(&clusters_path, &records, &artifacts_dir, &reports_dir)?;

    result.total_unique_records = merge_summary.records_out_unique_total;
    result.total_review_records = merge_summary.records_out_review_pending;
    result.dedup_rate = merge_summary.dedup_rate;

    let mut stage_counters = BTreeMap::new();
    stage_counters.insert("auto_clusters_merged".to_string(), merge_summary.auto_clusters_merged);
    stage_counters.insert("singletons".to_string(), merge_summary.singletons_count);
    ctx.finish_stage("merge", stage_counters.clone())?;
    emit_stage_event(PipelineStage::Merge, start, stage_counters, None);

    for (name, rel_path) in [
        ("merged_records", "merged_records.jsonl"),
        ("deduped_auto_ris", "deduped_auto.ris"),
        ("review_pending_ris", "review_pending.ris"),
        ("singletons_ris", "singletons.ris"),
        ("clusters_enriched", "clusters_enriched.jsonl"),
    ] {
        let path = artifacts_dir.join(rel_path);
        if path.exists() {
            result.output_files.insert(name.to_string(), path.display().to_string());
            if let Ok(info) = artifact_info(&path, None) {
                ctx.manifest_writer.add_output_artifact(info);
            }
        }
    }
    result.output_files.insert("merge_summary".to_string(), reports_dir.join("merge_summary.json").display().to_string());

    result.success = true;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn write_ris(dir: &Path, name: &str, contents: &str) {
        let mut file = fs::File::create(dir.join(name)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    const RECORD: &str = "TY  - JOUR\nTI  - A Study of Things\nDO  - 10.1/x\nPY  - 2020\nER  - \n\n";

    #[test]
    fn empty_input_folder_succeeds_with_zero_records() {
        let input_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let mut config = SrdedupeConfig::default();
        config.output_dir = out_dir.path().to_path_buf();

        let result = run_pipeline(input_dir.path(), &config, vec!["srdedupe".to_string()]).unwrap();
        assert!(result.success);
        assert_eq!(result.total_records, 0);
        assert_eq!(result.dedup_rate, 0.0);
    }

    #[test]
    fn single_record_input_produces_one_singleton() {
        let input_dir = tempfile::tempdir().unwrap();
        write_ris(input_dir.path(), "one.ris", RECORD);
        let out_dir = tempfile::tempdir().unwrap();
        let mut config = SrdedupeConfig::default();
        config.output_dir = out_dir.path().to_path_buf();

        let result = run_pipeline(input_dir.path(), &config, vec!["srdedupe".to_string()]).unwrap();
        assert!(result.success);
        assert_eq!(result.total_records, 1);
        assert_eq!(result.total_candidates, 0);
        assert_eq!(result.total_unique_records, 1);
    }

    #[test]
    fn doi_exact_triple_merges_into_one_record() {
        let input_dir = tempfile::tempdir().unwrap();
        write_ris(
            input_dir.path(),
            "a.ris",
            "TY  - JOUR\nTI  - First Title Variant\nDO  - 10.1/x\nPY  - 2019\nER  - \n\n",
        );
        write_ris(
            input_dir.path(),
            "b.ris",
            "TY  - JOUR\nTI  - Second Title Variant\nDO  - 10.1/x\nPY  - 2020\nER  - \n\n",
        );
        write_ris(
            input_dir.path(),
            "c.ris",
            "TY  - JOUR\nTI  - Third Title Variant\nDO  - 10.1/x\nPY  - 2021\nER  - \n\n",
        );
        let out_dir = tempfile::tempdir().unwrap();
        let mut config = SrdedupeConfig::default();
        config.output_dir = out_dir.path().to_path_buf();

        let result = run_pipeline(input_dir.path(), &config, vec!["srdedupe".to_string()]).unwrap();
        assert!(result.success);
        assert_eq!(result.total_records, 3);
        assert_eq!(result.total_unique_records, 1);
        assert!((result.dedup_rate - 0.6667).abs() < 0.001);
    }
}

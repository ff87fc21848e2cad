//! Multi-file ingestion orchestrator: reads a file, detects its encoding
//! and format, dispatches to the matching parser, and folds per-file stats
//! into a run-level [`IngestionReport`].

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{instrument, warn};

use crate::base::{
    decode_with, detect_encoding, format_for_extension, normalize_line_endings, sniff_format,
    FileContext, ParseResult,
};
use crate::{bibtex, endnote, pubmed, ris, wos};
use srdedupe_model::CanonicalRecord;

pub const INGESTION_VERSION: &str = "1.0.0";

/// Per-file ingestion outcome: identity, detected format/encoding, counts,
/// and any warnings/errors the parser raised.
#[derive(Debug, Clone, Serialize)]
pub struct FileIngestionResult {
    pub filename: String,
    pub filepath: String,
    pub file_size: u64,
    pub file_mtime: Option<String>,
    pub format_detected: String,
    pub source_ext: String,
    pub encoding_used: String,
    pub records_parsed: usize,
    pub tags_parsed: usize,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
    pub file_digest: String,
}

/// Run-level summary across every file in a folder ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestionReport {
    pub tool_version: String,
    pub run_timestamp: String,
    pub total_files: usize,
    pub total_records: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
    pub file_results: Vec<FileIngestionResult>,
}

fn dispatch(format: &str, lines: &[String], ctx: &FileContext) -> Option<ParseResult> {
    match format {
        "ris" => Some(ris::parse_ris(lines, ctx)),
        "pubmed" => Some(pubmed::parse_pubmed(lines, ctx)),
        "bibtex" => Some(bibtex::parse_bibtex(lines, ctx)),
        "wos" => Some(wos::parse_wos(lines, ctx)),
        "endnote_tagged" => Some(endnote::parse_endnote(lines, ctx)),
        _ => None,
    }
}

fn file_mtime(path: &Path) -> Option<DateTime<Utc>> {
    fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

fn empty_result(
    filename: String,
    filepath: String,
    file_size: u64,
    file_mtime: Option<String>,
    format_detected: &str,
    source_ext: String,
    encoding_used: String,
    error: String,
) -> FileIngestionResult {
    FileIngestionResult {
        filename,
        filepath,
        file_size,
        file_mtime,
        format_detected: format_detected.to_string(),
        source_ext,
        encoding_used,
        records_parsed: 0,
        tags_parsed: 0,
        warnings: Vec::new(),
        errors: vec![error],
        file_digest: String::new(),
    }
}

/// Ingests a single file: reads bytes, detects encoding and format, parses,
/// and returns both the records and a descriptive [`FileIngestionResult`].
/// Never returns `Err` — file-level failures are reported as a single
/// error string on the result so a folder ingestion can continue past them.
#[instrument(skip_all, fields(path = %file_path.display()))]
pub fn ingest_file(file_path: &Path) -> (Vec<CanonicalRecord>, FileIngestionResult) {
    let filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_path.to_string_lossy().into_owned());
    let filepath = file_path.to_string_lossy().into_owned();
    let extension = file_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
        .unwrap_or_default();

    let file_bytes = match fs::read(file_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "failed to read file");
            return (
                Vec::new(),
                empty_result(
                    filename,
                    filepath,
                    0,
                    None,
                    "unknown",
                    extension,
                    String::new(),
                    format!("Failed to read file: {e}"),
                ),
            );
        }
    };

    let mtime_utc = file_mtime(file_path);
    let mtime = mtime_utc.map(|t| t.to_rfc3339());
    let file_size = file_bytes.len() as u64;
    let encoding = detect_encoding(&file_bytes);
    let content = decode_with(encoding, &file_bytes);
    let content = normalize_line_endings(&content);
    let lines: Vec<String> = content.split('\n').map(str::to_string).collect();

    let format_detected = sniff_format(&lines);

    let ctx = FileContext::new(file_path, &file_bytes, mtime_utc);

    let Some(parse_result) = dispatch(format_detected, &lines, &ctx) else {
        return (
            Vec::new(),
            empty_result(
                filename,
                filepath,
                file_size,
                mtime,
                format_detected,
                extension,
                encoding.to_string(),
                format!("No parser available for format: {format_detected}"),
            ),
        );
    };

    let total_tags: usize = parse_result.records.iter().map(|r| r.raw.tags.len()).sum();
    let file_digest = parse_result
        .records
        .first()
        .map(|r| r.source_digest.clone())
        .unwrap_or_default();

    let result = FileIngestionResult {
        filename,
        filepath,
        file_size,
        file_mtime: mtime,
        format_detected: format_detected.to_string(),
        source_ext: extension,
        encoding_used: encoding.to_string(),
        records_parsed: parse_result.records.len(),
        tags_parsed: total_tags,
        warnings: parse_result.warnings,
        errors: parse_result.errors,
        file_digest,
    };

    (parse_result.records, result)
}

/// Ingests every file under `folder_path` whose extension is in
/// [`SUPPORTED_EXTENSIONS`], optionally recursing into subdirectories.
#[instrument(skip_all, fields(path = %folder_path.display(), recursive))]
pub fn ingest_folder(folder_path: &Path, recursive: bool) -> (Vec<CanonicalRecord>, IngestionReport) {
    let mut all_records = Vec::new();
    let mut file_results = Vec::new();

    let mut files = Vec::new();
    collect_files(folder_path, recursive, &mut files);
    files.sort();

    for file_path in files {
        let (records, result) = ingest_file(&file_path);
        all_records.extend(records);
        file_results.push(result);
    }

    let total_errors = file_results.iter().map(|r| r.errors.len()).sum();
    let total_warnings = file_results.iter().map(|r| r.warnings.len()).sum();
    let total_records = file_results.iter().map(|r| r.records_parsed).sum();

    let report = IngestionReport {
        tool_version: INGESTION_VERSION.to_string(),
        run_timestamp: Utc::now().to_rfc3339(),
        total_files: file_results.len(),
        total_records,
        total_errors,
        total_warnings,
        file_results,
    };

    (all_records, report)
}

fn collect_files(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if recursive {
                collect_files(&path, recursive, out);
            }
            continue;
        }

        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        if format_for_extension(&ext).is_some() {
            out.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::TempPath {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.into_temp_path()
    }

    #[test]
    fn ingests_a_single_ris_file() {
        let path = write_temp(".ris", "TY  - JOUR\nTI  - A Study\nER  - \n");
        let (records, result) = ingest_file(&path);
        assert_eq!(records.len(), 1);
        assert_eq!(result.format_detected, "ris");
        assert_eq!(result.records_parsed, 1);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn missing_file_reports_error_without_panicking() {
        let (records, result) = ingest_file(Path::new("/nonexistent/path/x.ris"));
        assert!(records.is_empty());
        assert_eq!(result.records_parsed, 0);
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn ingests_a_folder_of_mixed_formats() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.ris"), "TY  - JOUR\nTI  - One\nER  - \n").unwrap();
        std::fs::write(dir.path().join("b.bib"), "@article{k,\n  title = {Two}\n}\n").unwrap();
        std::fs::write(dir.path().join("c.dat"), "ignored").unwrap();

        let (records, report) = ingest_folder(dir.path(), false);
        assert_eq!(records.len(), 2);
        assert_eq!(report.total_files, 2);
        assert_eq!(report.total_records, 2);
    }
}

//! Shared infrastructure used by every format parser: file context,
//! encoding/line-ending normalization, format sniffing, and the
//! tag-list-to-[`CanonicalRecord`] assembly step.

use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use srdedupe_ids::{rid, source_digest, DigestTag};
use srdedupe_model::{Canon, CanonicalRecord, Flags, Keys, Meta, Provenance, Raw, RawTag};

/// Maps a lowercased file extension (with leading dot) to the format
/// identifier used throughout the pipeline.
pub fn format_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        ".ris" => Some("ris"),
        ".nbib" | ".txt" => Some("pubmed"),
        ".bib" => Some("bibtex"),
        ".ciw" => Some("wos"),
        ".enw" => Some("endnote_tagged"),
        _ => None,
    }
}

/// Every extension recognized by [`format_for_extension`], for folder globbing.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".ris", ".nbib", ".txt", ".bib", ".ciw", ".enw"];

/// Immutable metadata about the file being parsed, computed once per file.
#[derive(Debug, Clone)]
pub struct FileContext {
    pub file_name: String,
    pub file_digest: String,
    pub file_mtime: Option<String>,
    pub file_size: u64,
}

impl FileContext {
    pub fn new(file_path: &Path, file_bytes: &[u8], mtime: Option<DateTime<Utc>>) -> Self {
        Self {
            file_name: file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| file_path.to_string_lossy().into_owned()),
            file_digest: source_digest(file_bytes),
            file_mtime: mtime.map(|t| t.to_rfc3339()),
            file_size: file_bytes.len() as u64,
        }
    }
}

/// A single parsed tag before occurrence counting: `(tag, value_lines, line_start, line_end)`.
pub type RawTagSpan = (String, Vec<String>, u32, u32);

/// Records/warnings/errors produced by parsing one file. Supports tuple
/// destructuring at call sites, matching the shape callers expect.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub records: Vec<CanonicalRecord>,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Converts raw tag spans into [`RawTag`]s, assigning each repeated tag
/// name a 0-based occurrence index in document order.
pub fn build_raw_tags(tags: Vec<RawTagSpan>, value_join: &str) -> Vec<RawTag> {
    let mut raw_tags = Vec::with_capacity(tags.len());
    let mut counts: std::collections::HashMap<String, u32> = std::collections::HashMap::new();

    for (tag, value_lines, line_start, line_end) in tags {
        let occurrence = *counts.get(&tag).unwrap_or(&0);
        counts.insert(tag.clone(), occurrence + 1);

        let value_raw_joined = value_lines.join(value_join);
        raw_tags.push(RawTag {
            tag,
            value_lines,
            value_raw_joined,
            occurrence,
            line_start,
            line_end,
        });
    }

    raw_tags
}

/// Assembles a [`CanonicalRecord`] from a parsed tag list, computing
/// `record_digest` and `rid`. Returns `None` when `raw_tags` is empty — an
/// empty record carries no content identity and is dropped.
pub fn build_canonical_record(
    raw_tags: Vec<RawTag>,
    record_lines: Vec<String>,
    source_format: &str,
    file_ctx: &FileContext,
    record_index: u32,
    parser_version: &str,
) -> Option<CanonicalRecord> {
    if raw_tags.is_empty() {
        return None;
    }

    let digest_tags: Vec<DigestTag> = raw_tags
        .iter()
        .map(|t| DigestTag {
            tag: t.tag.clone(),
            value: t.value_raw_joined.clone(),
        })
        .collect();
    let record_digest = srdedupe_ids::record_digest(&digest_tags, source_format);
    let record_rid = rid(&file_ctx.file_digest, &record_digest);

    Some(CanonicalRecord {
        schema_version: srdedupe_model::SCHEMA_VERSION.to_string(),
        rid: record_rid.to_string(),
        record_digest,
        source_digest: file_ctx.file_digest.clone(),
        meta: Meta {
            source_file: file_ctx.file_name.clone(),
            source_format: source_format.to_string(),
            source_db: None,
            source_record_index: record_index,
            ingested_at: Utc::now().to_rfc3339(),
            source_file_mtime: file_ctx.file_mtime.clone(),
            source_file_size_bytes: Some(file_ctx.file_size),
            parser_version: Some(parser_version.to_string()),
        },
        raw: Raw {
            record_lines,
            tags: raw_tags,
            unknown_lines: Vec::new(),
        },
        canon: Canon::empty(),
        keys: Keys::empty(),
        flags: Flags::pre_normalization(),
        provenance: Provenance::new(),
    })
}

/// Detects the byte encoding of a file: UTF-8-with-BOM, then plain UTF-8,
/// falling back to Latin-1 (which can decode any byte sequence).
pub fn detect_encoding(file_bytes: &[u8]) -> &'static str {
    if file_bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return "utf-8-sig";
    }
    if std::str::from_utf8(file_bytes).is_ok() {
        return "utf-8";
    }
    "latin-1"
}

/// Decodes `file_bytes` using the encoding named by [`detect_encoding`].
pub fn decode_with(encoding: &str, file_bytes: &[u8]) -> String {
    match encoding {
        "utf-8-sig" => {
            let without_bom = &file_bytes[3..];
            String::from_utf8_lossy(without_bom).into_owned()
        }
        "utf-8" => String::from_utf8_lossy(file_bytes).into_owned(),
        _ => file_bytes.iter().map(|&b| b as char).collect(),
    }
}

/// Normalizes CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// First `max_chars` characters of `s`, respecting UTF-8 boundaries. Used
/// when truncating a line for a warning message.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn bibtex_start_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?m)^@\w+\s*\{").unwrap())
}

fn wos_start_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?m)^PT [JS]\b").unwrap())
}

fn ris_start_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?m)^TY  - ").unwrap())
}

fn pubmed_start_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?m)^PMID-? ").unwrap())
}

fn endnote_start_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?m)^%[A-Z0-9] ").unwrap())
}

/// Sniffs the bibliographic format from a 100-line sample window, tried in
/// priority order BibTeX -> WoS -> RIS -> PubMed -> EndNote. RIS detection
/// requires only the `TY` tag because the mandatory `ER` closer may fall
/// beyond the sample when the first record is large.
pub fn sniff_format(lines: &[String]) -> &'static str {
    let sample_len = lines.len().min(100);
    let sample_text = lines[..sample_len].join("\n");

    if bibtex_start_re().is_match(&sample_text) {
        return "bibtex";
    }
    if wos_start_re().is_match(&sample_text) {
        return "wos";
    }
    if ris_start_re().is_match(&sample_text) {
        return "ris";
    }
    if pubmed_start_re().is_match(&sample_text) {
        return "pubmed";
    }
    if endnote_start_re().is_match(&sample_text) {
        return "endnote_tagged";
    }
    "unknown"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(s: &str) -> Vec<String> {
        s.lines().map(str::to_string).collect()
    }

    #[test]
    fn sniffs_ris() {
        assert_eq!(sniff_format(&lines("TY  - JOUR\nTI  - Title\nER  - \n")), "ris");
    }

    #[test]
    fn sniffs_bibtex_before_wos() {
        assert_eq!(sniff_format(&lines("@article{key,\n  title={x}\n}\n")), "bibtex");
    }

    #[test]
    fn sniffs_pubmed() {
        assert_eq!(sniff_format(&lines("PMID- 12345\nTI  - Title\n")), "pubmed");
    }

    #[test]
    fn sniffs_wos() {
        assert_eq!(sniff_format(&lines("FN Thomson Reuters Web of Science\nVR 1.0\nPT J\nER\n")), "wos");
    }

    #[test]
    fn sniffs_endnote() {
        assert_eq!(sniff_format(&lines("%0 Journal Article\n%T Title\n")), "endnote_tagged");
    }

    #[test]
    fn unknown_format_falls_through() {
        assert_eq!(sniff_format(&lines("just some text\nwith no tags\n")), "unknown");
    }

    #[test]
    fn detects_utf8_bom() {
        let bytes = [0xEF, 0xBB, 0xBF, b'h', b'i'];
        assert_eq!(detect_encoding(&bytes), "utf-8-sig");
    }

    #[test]
    fn falls_back_to_latin1_on_invalid_utf8() {
        let bytes = [0xFF, 0xFE];
        assert_eq!(detect_encoding(&bytes), "latin-1");
    }

    #[test]
    fn normalizes_crlf_and_cr() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n"), "a\nb\nc\n");
    }

    #[test]
    fn empty_tags_build_no_record() {
        let ctx = FileContext::new(Path::new("x.ris"), b"", None);
        let record = build_canonical_record(Vec::new(), Vec::new(), "ris", &ctx, 0, "1.0.0");
        assert!(record.is_none());
    }
}

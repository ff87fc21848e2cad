use serde::{Deserialize, Serialize};

/// A single raw tag exactly as extracted by a format parser, with enough
/// bookkeeping to explain provenance and to reconstruct `DigestTag` for
/// content hashing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTag {
    pub tag: String,
    pub value_lines: Vec<String>,
    pub value_raw_joined: String,
    /// 0-based occurrence count among repeated tags with the same name.
    pub occurrence: u32,
    pub line_start: u32,
    pub line_end: u32,
}

/// Lossless capture of a record's original text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Raw {
    pub record_lines: Vec<String>,
    pub tags: Vec<RawTag>,
    /// Lines that could not be attributed to a tag.
    pub unknown_lines: Vec<String>,
}

impl Raw {
    /// Tag/value pairs in document order, suitable for `record_digest`.
    pub fn digest_tags(&self) -> Vec<srdedupe_ids::DigestTag> {
        self.tags
            .iter()
            .map(|t| srdedupe_ids::DigestTag {
                tag: t.tag.clone(),
                value: t.value_raw_joined.clone(),
            })
            .collect()
    }
}

/// Run-independent metadata about a record's origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    pub source_file: String,
    pub source_format: String,
    pub source_db: Option<String>,
    /// 0-based position in source file.
    pub source_record_index: u32,
    /// ISO-8601 UTC ingestion timestamp.
    pub ingested_at: String,
    pub source_file_mtime: Option<String>,
    pub source_file_size_bytes: Option<u64>,
    pub parser_version: Option<String>,
}

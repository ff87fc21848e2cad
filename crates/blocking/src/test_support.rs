//! Test-only helper for building minimal `CanonicalRecord`s.
#![cfg(test)]

use std::sync::atomic::{AtomicU64, Ordering};

use srdedupe_model::{CanonicalRecord, Flags, Meta, Raw};

static COUNTER: AtomicU64 = AtomicU64::new(0);

fn next_rid() -> String {
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("rid-{n}")
}

pub fn record_with(f: impl FnOnce(&mut CanonicalRecord)) -> CanonicalRecord {
    let mut record = CanonicalRecord::from_ingested(
        next_rid(),
        "sha256:0".to_string(),
        "sha256:0".to_string(),
        Meta {
            source_file: "test.ris".to_string(),
            source_format: "ris".to_string(),
            source_db: None,
            source_record_index: 0,
            ingested_at: "2024-01-01T00:00:00Z".to_string(),
            source_file_mtime: None,
            source_file_size_bytes: None,
            parser_version: None,
        },
        Raw {
            record_lines: Vec::new(),
            tags: Vec::new(),
            unknown_lines: Vec::new(),
        },
    );
    record.flags = Flags::pre_normalization();
    f(&mut record);
    record
}

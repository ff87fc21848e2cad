//! RIS format writer for merged and canonical records.
use std::fs;
use std::path::Path;

use srdedupe_model::{Canon, CanonicalRecord};

use crate::error::MergeError;
use crate::models::MergedRecord;

/// Formats `Canon` fields as a single RIS record (no trailing line ending).
pub fn format_canon_as_ris(canon: &Canon) -> String {
    let mut lines = vec!["TY  - JOUR".to_string()];

    if let Some(title) = &canon.title_raw {
        lines.push(format!("TI  - {title}"));
    }
    if let Some(abstract_raw) = &canon.abstract_raw {
        lines.push(format!("AB  - {abstract_raw}"));
    }
    if let Some(authors) = &canon.authors_parsed {
        for author in authors {
            if let Some(family) = &author.family {
                let name = match &author.given {
                    Some(given) => format!("{family}, {given}"),
                    None => family.clone(),
                };
                lines.push(format!("AU  - {name}"));
            } else if !author.raw.is_empty() {
                lines.push(format!("AU  - {}", author.raw));
            }
        }
    }
    if let Some(year) = canon.year_norm {
        lines.push(format!("PY  - {year}"));
    }
    if let Some(journal) = &canon.journal_full {
        lines.push(format!("T2  - {journal}"));
    }
    if let Some(volume) = &canon.volume {
        lines.push(format!("VL  - {volume}"));
    }
    if let Some(issue) = &canon.issue {
        lines.push(format!("IS  - {issue}"));
    }
    if let Some(page_first) = &canon.page_first {
        lines.push(format!("SP  - {page_first}"));
    }
    if let Some(page_last) = &canon.page_last {
        lines.push(format!("EP  - {page_last}"));
    }
    if let Some(doi) = &canon.doi_norm {
        lines.push(format!("DO  - {doi}"));
    }
    if let Some(doi_url) = &canon.doi_url {
        lines.push(format!("UR  - {doi_url}"));
    }
    if let Some(language) = &canon.language {
        lines.push(format!("LA  - {language}"));
    }

    lines.push("ER  -".to_string());
    lines.join("\r\n")
}

pub fn format_ris_record(merged_record: &MergedRecord) -> String {
    format_canon_as_ris(&merged_record.canon)
}

/// Writes merged records as an RIS file. `line_ending` separates records
/// (doubled, i.e. `\r\n\r\n` between entries by default) — individual
/// record lines always use `\r\n` per [`format_canon_as_ris`].
pub fn write_ris_file(merged_records: &[MergedRecord], output_path: &Path, line_ending: &str) -> Result<(), MergeError> {
    let canons: Vec<&Canon> = merged_records.iter().map(|r| &r.canon).collect();
    write_ris(&canons, output_path, line_ending)
}

/// Writes canonical records (e.g. REVIEW-pending or singleton records not
/// merged) as an RIS file.
pub fn write_ris_from_records(records: &[CanonicalRecord], output_path: &Path, line_ending: &str) -> Result<(), MergeError> {
    let canons: Vec<&Canon> = records.iter().map(|r| &r.canon).collect();
    write_ris(&canons, output_path, line_ending)
}

fn write_ris(canons: &[&Canon], output_path: &Path, line_ending: &str) -> Result<(), MergeError> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| MergeError::Io { path: parent.display().to_string(), message: e.to_string() })?;
    }

    let mut out = String::new();
    for (i, canon) in canons.iter().enumerate() {
        out.push_str(&format_canon_as_ris(canon));
        if i < canons.len() - 1 {
            out.push_str(line_ending);
            out.push_str(line_ending);
        }
    }

    fs::write(output_path, out).map_err(|e| MergeError::Io { path: output_path.display().to_string(), message: e.to_string() })
}

//! RIS format parser.
//!
//! Two-letter tags, `TY  - ` starts a record, `ER  - ` ends it.
//! <https://refdb.sourceforge.net/manual-0.9.6/sect1-ris-format.html>

use std::sync::OnceLock;

use regex::Regex;

use crate::base::{
    build_canonical_record, build_raw_tags, truncate_chars, FileContext, ParseResult, RawTagSpan,
};

pub const PARSER_VERSION: &str = "1.0.0";

fn tag_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"^([A-Z0-9]{2})  - ?(.*)$").unwrap())
}

pub fn parse_ris(lines: &[String], ctx: &FileContext) -> ParseResult {
    let mut result = ParseResult::default();

    let mut record_index: u32 = 0;
    let mut in_record = false;
    let mut current_record_lines: Vec<String> = Vec::new();
    let mut current_tags: Vec<RawTagSpan> = Vec::new();
    let mut current_tag: Option<String> = None;
    let mut current_value_lines: Vec<String> = Vec::new();
    let mut current_tag_start: u32 = 0;

    for (line_num, line) in lines.iter().enumerate() {
        let line_num = line_num as u32;

        if let Some(caps) = tag_re().captures(line) {
            if let Some(tag) = current_tag.take() {
                current_tags.push((
                    tag,
                    std::mem::take(&mut current_value_lines),
                    current_tag_start,
                    line_num.saturating_sub(1),
                ));
            }

            let tag = caps.get(1).unwrap().as_str().to_string();
            let value = caps.get(2).unwrap().as_str().to_string();

            if tag == "TY" {
                if in_record {
                    result.warnings.push(format!(
                        "Line {line_num}: Found TY without closing ER for previous record"
                    ));
                    if !current_record_lines.is_empty() {
                        if let Some(rec) = build_record(
                            std::mem::take(&mut current_record_lines),
                            std::mem::take(&mut current_tags),
                            ctx,
                            record_index,
                        ) {
                            result.records.push(rec);
                            record_index += 1;
                        }
                    }
                }
                in_record = true;
                current_record_lines = vec![line.clone()];
                current_tags = Vec::new();
                current_tag = Some(tag);
                current_value_lines = vec![value];
                current_tag_start = line_num;
            } else if tag == "ER" {
                if !in_record {
                    result
                        .warnings
                        .push(format!("Line {line_num}: Found ER without opening TY"));
                } else {
                    current_record_lines.push(line.clone());
                    current_tags.push((tag, Vec::new(), line_num, line_num));

                    if let Some(rec) = build_record(
                        std::mem::take(&mut current_record_lines),
                        std::mem::take(&mut current_tags),
                        ctx,
                        record_index,
                    ) {
                        result.records.push(rec);
                        record_index += 1;
                    }

                    in_record = false;
                    current_record_lines = Vec::new();
                    current_tags = Vec::new();
                    current_value_lines = Vec::new();
                }
            } else if in_record {
                current_record_lines.push(line.clone());
                current_tag = Some(tag);
                current_value_lines = vec![value];
                current_tag_start = line_num;
            }
        } else if in_record {
            current_record_lines.push(line.clone());
            if line.chars().next().is_some_and(char::is_whitespace) && current_tag.is_some() {
                current_value_lines.push(line.clone());
            } else if !line.trim().is_empty() {
                result.warnings.push(format!(
                    "Line {line_num}: Unrecognized line in record: {}",
                    truncate_chars(line, 50)
                ));
            }
        }
    }

    if in_record && !current_record_lines.is_empty() {
        result
            .warnings
            .push("End of file reached without closing ER tag".to_string());
        if let Some(tag) = current_tag.take() {
            current_tags.push((
                tag,
                current_value_lines,
                current_tag_start,
                (lines.len() as u32).saturating_sub(1),
            ));
        }
        if let Some(rec) = build_record(current_record_lines, current_tags, ctx, record_index) {
            result.records.push(rec);
        }
    }

    result
}

fn build_record(
    record_lines: Vec<String>,
    tags: Vec<RawTagSpan>,
    ctx: &FileContext,
    record_index: u32,
) -> Option<srdedupe_model::CanonicalRecord> {
    let raw_tags = build_raw_tags(tags, "\n");
    build_canonical_record(raw_tags, record_lines, "ris", ctx, record_index, PARSER_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn ctx() -> FileContext {
        FileContext::new(Path::new("input.ris"), b"dummy", None)
    }

    fn lines(s: &str) -> Vec<String> {
        s.lines().map(str::to_string).collect()
    }

    #[test]
    fn parses_single_record() {
        let result = parse_ris(
            &lines("TY  - JOUR\nTI  - A Study of Bees\nAU  - Smith, J.\nPY  - 2020\nER  - \n"),
            &ctx(),
        );
        assert_eq!(result.records.len(), 1);
        assert!(result.errors.is_empty());
        let tags = &result.records[0].raw.tags;
        assert!(tags.iter().any(|t| t.tag == "TI" && t.value_raw_joined == "A Study of Bees"));
    }

    #[test]
    fn joins_continuation_lines_with_newline() {
        let result = parse_ris(
            &lines("TY  - JOUR\nAB  - First line\n   second line\nER  - \n"),
            &ctx(),
        );
        let ab = result.records[0]
            .raw
            .tags
            .iter()
            .find(|t| t.tag == "AB")
            .unwrap();
        assert_eq!(ab.value_raw_joined, "First line\n   second line");
    }

    #[test]
    fn missing_er_still_flushes_with_warning() {
        let result = parse_ris(&lines("TY  - JOUR\nTI  - Orphan\n"), &ctx());
        assert_eq!(result.records.len(), 1);
        assert!(result.warnings.iter().any(|w| w.contains("without closing ER")));
    }

    #[test]
    fn er_without_ty_warns_and_is_dropped() {
        let result = parse_ris(&lines("ER  - \n"), &ctx());
        assert!(result.records.is_empty());
        assert!(result.warnings.iter().any(|w| w.contains("without opening TY")));
    }

    #[test]
    fn two_records_in_sequence() {
        let result = parse_ris(
            &lines("TY  - JOUR\nTI  - One\nER  - \nTY  - JOUR\nTI  - Two\nER  - \n"),
            &ctx(),
        );
        assert_eq!(result.records.len(), 2);
    }
}

//! Web of Science / ISI field-tagged format parser.
//!
//! Two-character tags, `PT` starts a record, `ER` ends it. `FN`/`VR` are
//! header tags, `EF` marks end of file. Continuation values are joined with
//! a space rather than a newline.

use std::sync::OnceLock;

use regex::Regex;

use crate::base::{
    build_canonical_record, build_raw_tags, truncate_chars, FileContext, ParseResult, RawTagSpan,
};

pub const PARSER_VERSION: &str = "1.0.0";

fn tag_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"^([A-Z0-9]{2})(?: (.*))?$").unwrap())
}

pub fn parse_wos(lines: &[String], ctx: &FileContext) -> ParseResult {
    let mut result = ParseResult::default();

    let mut record_index: u32 = 0;
    let mut in_header = true;
    let mut in_record = false;
    let mut current_record_lines: Vec<String> = Vec::new();
    let mut current_tags: Vec<RawTagSpan> = Vec::new();
    let mut current_tag: Option<String> = None;
    let mut current_value_lines: Vec<String> = Vec::new();
    let mut current_tag_start: u32 = 0;

    for (line_num, line) in lines.iter().enumerate() {
        let line_num = line_num as u32;

        if line.trim() == "EF" {
            if in_record && !current_record_lines.is_empty() {
                if let Some(tag) = current_tag.take() {
                    current_tags.push((
                        tag,
                        std::mem::take(&mut current_value_lines),
                        current_tag_start,
                        line_num.saturating_sub(1),
                    ));
                }
                if let Some(rec) =
                    build_record(current_record_lines, current_tags, ctx, record_index)
                {
                    result.records.push(rec);
                }
            }
            return result;
        }

        let Some(caps) = tag_re().captures(line) else {
            if in_record {
                current_record_lines.push(line.clone());
                if line.chars().next().is_some_and(char::is_whitespace) && current_tag.is_some() {
                    current_value_lines.push(line.trim().to_string());
                } else if !line.trim().is_empty() {
                    result.warnings.push(format!(
                        "Line {line_num}: Unrecognized line in record: {}",
                        truncate_chars(line, 50)
                    ));
                }
            } else if !in_header && !line.trim().is_empty() {
                result.warnings.push(format!(
                    "Line {line_num}: Line outside of record: {}",
                    truncate_chars(line, 50)
                ));
            }
            continue;
        };

        if let Some(tag) = current_tag.take() {
            current_tags.push((
                tag,
                std::mem::take(&mut current_value_lines),
                current_tag_start,
                line_num.saturating_sub(1),
            ));
        }

        let tag = caps.get(1).unwrap().as_str().to_string();
        let value = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();

        if tag == "FN" || tag == "VR" {
            if in_record {
                result
                    .warnings
                    .push(format!("Line {line_num}: Found header tag {tag} inside record"));
            }
            in_header = true;
            continue;
        }

        if tag == "PT" {
            in_header = false;
            if in_record {
                result.warnings.push(format!(
                    "Line {line_num}: Found PT without closing ER for previous record"
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
                    .push(format!("Line {line_num}: Found ER without opening PT"));
            } else {
                current_record_lines.push(line.clone());
                if !value.trim().is_empty() {
                    current_tags.push((tag, vec![value], line_num, line_num));
                } else {
                    current_tags.push((tag, Vec::new(), line_num, line_num));
                }

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
                current_value_lines = Vec::new();
            }
        } else if in_record {
            current_record_lines.push(line.clone());
            current_tag = Some(tag);
            current_value_lines = vec![value];
            current_tag_start = line_num;
        } else if !in_header {
            result
                .warnings
                .push(format!("Line {line_num}: Found tag {tag} outside of record"));
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
    let raw_tags = build_raw_tags(tags, " ");
    build_canonical_record(raw_tags, record_lines, "wos", ctx, record_index, PARSER_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn ctx() -> FileContext {
        FileContext::new(Path::new("input.ciw"), b"dummy", None)
    }

    fn lines(s: &str) -> Vec<String> {
        s.lines().map(str::to_string).collect()
    }

    #[test]
    fn parses_one_record_ended_by_ef() {
        let result = parse_wos(
            &lines("FN Thomson Reuters Web of Science\nVR 1.0\nPT J\nTI Title\nER\nEF\n"),
            &ctx(),
        );
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn continuation_values_joined_with_space() {
        let result = parse_wos(
            &lines("PT J\nAB First part\n   second part\nER\nEF\n"),
            &ctx(),
        );
        let ab = result.records[0].raw.tags.iter().find(|t| t.tag == "AB").unwrap();
        assert_eq!(ab.value_raw_joined, "First part second part");
    }

    #[test]
    fn two_records_between_headers_and_ef() {
        let result = parse_wos(&lines("PT J\nTI One\nER\nPT J\nTI Two\nER\nEF\n"), &ctx());
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn stops_reading_after_ef_marker() {
        let result = parse_wos(&lines("PT J\nTI One\nER\nEF\nPT J\nTI Ignored\nER\n"), &ctx());
        assert_eq!(result.records.len(), 1);
    }
}

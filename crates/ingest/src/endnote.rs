//! EndNote Tagged / Refer format parser.
//!
//! Fields begin with `%` followed by a single character and a space.
//! References are separated by blank lines; any non-tag, non-blank line is
//! treated as a continuation of the current tag.
//! <https://refdb.sourceforge.net/manual-0.9.6/sect1-refdb-format.html>

use std::sync::OnceLock;

use regex::Regex;

use crate::base::{
    build_canonical_record, build_raw_tags, truncate_chars, FileContext, ParseResult, RawTagSpan,
};

pub const PARSER_VERSION: &str = "1.0.0";

fn tag_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"^%([A-Z0-9]) (.*)$").unwrap())
}

pub fn parse_endnote(lines: &[String], ctx: &FileContext) -> ParseResult {
    let mut result = ParseResult::default();

    let mut record_index: u32 = 0;
    let mut current_record_lines: Vec<String> = Vec::new();
    let mut current_tags: Vec<RawTagSpan> = Vec::new();
    let mut current_tag: Option<String> = None;
    let mut current_value_lines: Vec<String> = Vec::new();
    let mut current_tag_start: u32 = 0;
    let mut blank_line_count: u32 = 0;

    for (line_num, line) in lines.iter().enumerate() {
        let line_num = line_num as u32;

        if let Some(caps) = tag_re().captures(line) {
            blank_line_count = 0;

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
            current_tag = Some(tag);
            current_value_lines = vec![value];
            current_tag_start = line_num;
            current_record_lines.push(line.clone());
        } else if line.trim().is_empty() {
            blank_line_count += 1;

            if blank_line_count == 1 && !current_record_lines.is_empty() {
                if let Some(tag) = current_tag.take() {
                    current_tags.push((
                        tag,
                        std::mem::take(&mut current_value_lines),
                        current_tag_start,
                        line_num.saturating_sub(1),
                    ));
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
                current_record_lines = Vec::new();
                current_value_lines = Vec::new();
            }
        } else {
            blank_line_count = 0;
            if current_tag.is_some() {
                current_value_lines.push(line.clone());
                current_record_lines.push(line.clone());
            } else {
                if !current_record_lines.is_empty() {
                    result.warnings.push(format!(
                        "Line {line_num}: Line without tag context: {}",
                        truncate_chars(line, 50)
                    ));
                }
                current_record_lines.push(line.clone());
            }
        }
    }

    if !current_record_lines.is_empty() {
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
    build_canonical_record(
        raw_tags,
        record_lines,
        "endnote_tagged",
        ctx,
        record_index,
        PARSER_VERSION,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn ctx() -> FileContext {
        FileContext::new(Path::new("input.enw"), b"dummy", None)
    }

    fn lines(s: &str) -> Vec<String> {
        s.lines().map(str::to_string).collect()
    }

    #[test]
    fn parses_single_record_ended_by_blank_line() {
        let result = parse_endnote(&lines("%0 Journal Article\n%T A Study\n%D 2020\n\n"), &ctx());
        assert_eq!(result.records.len(), 1);
    }

    #[test]
    fn continuation_lines_append_to_current_tag() {
        let result = parse_endnote(&lines("%X First line\nsecond line\n\n"), &ctx());
        let x = result.records[0].raw.tags.iter().find(|t| t.tag == "X").unwrap();
        assert_eq!(x.value_raw_joined, "First line\nsecond line");
    }

    #[test]
    fn two_records_separated_by_blank_line() {
        let result = parse_endnote(&lines("%T One\n\n%T Two\n\n"), &ctx());
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn line_without_tag_context_is_warned() {
        let result = parse_endnote(&lines("stray one\nstray two\n"), &ctx());
        assert!(result.warnings.iter().any(|w| w.contains("without tag context")));
    }

    #[test]
    fn trailing_record_without_blank_line_is_flushed() {
        let result = parse_endnote(&lines("%T Last\n"), &ctx());
        assert_eq!(result.records.len(), 1);
    }
}

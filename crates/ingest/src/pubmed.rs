//! PubMed/MEDLINE format parser.
//!
//! Fields begin with 2-4 char tags, continuation lines are 6-space
//! indented. Record boundaries: a blank line or a new `PMID` field.
//! <https://www.nlm.nih.gov/bsd/mms/medlineelements.html>

use std::sync::OnceLock;

use regex::Regex;

use crate::base::{
    build_canonical_record, build_raw_tags, truncate_chars, FileContext, ParseResult, RawTagSpan,
};

pub const PARSER_VERSION: &str = "1.0.0";

fn tag_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"^([A-Z]{2,4})\s*-\s+(.*)$").unwrap())
}

fn continuation_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"^      ").unwrap())
}

pub fn parse_pubmed(lines: &[String], ctx: &FileContext) -> ParseResult {
    let mut result = ParseResult::default();

    let mut record_index: u32 = 0;
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

            if tag == "PMID" && !current_record_lines.is_empty() {
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

            current_record_lines.push(line.clone());
            current_tag = Some(tag);
            current_value_lines = vec![value];
            current_tag_start = line_num;
        } else if line.trim().is_empty() {
            if !current_record_lines.is_empty() {
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
                current_tags = Vec::new();
            }
        } else if continuation_re().is_match(line) && current_tag.is_some() {
            current_record_lines.push(line.clone());
            current_value_lines.push(line.clone());
        } else if !line.is_empty() && !current_record_lines.is_empty() {
            current_record_lines.push(line.clone());
            result.warnings.push(format!(
                "Line {line_num}: Unrecognized line in record: {}",
                truncate_chars(line, 50)
            ));
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
    build_canonical_record(raw_tags, record_lines, "pubmed", ctx, record_index, PARSER_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn ctx() -> FileContext {
        FileContext::new(Path::new("input.nbib"), b"dummy", None)
    }

    fn lines(s: &str) -> Vec<String> {
        s.lines().map(str::to_string).collect()
    }

    #[test]
    fn parses_single_record_ended_by_blank_line() {
        let result = parse_pubmed(&lines("PMID- 12345\nTI  - A Study\nPY  - 2020\n\n"), &ctx());
        assert_eq!(result.records.len(), 1);
        assert_eq!(result.records[0].meta.source_format, "pubmed");
    }

    #[test]
    fn new_pmid_closes_previous_record_without_blank_line() {
        let result = parse_pubmed(
            &lines("PMID- 1\nTI  - First\nPMID- 2\nTI  - Second\n\n"),
            &ctx(),
        );
        assert_eq!(result.records.len(), 2);
    }

    #[test]
    fn continuation_lines_join_with_newline() {
        let result = parse_pubmed(
            &lines("PMID- 1\nAB  - First line\n      second line\n\n"),
            &ctx(),
        );
        let ab = result.records[0]
            .raw
            .tags
            .iter()
            .find(|t| t.tag == "AB")
            .unwrap();
        assert_eq!(ab.value_raw_joined, "First line\n      second line");
    }

    #[test]
    fn trailing_record_without_blank_line_is_flushed() {
        let result = parse_pubmed(&lines("PMID- 1\nTI  - Last\n"), &ctx());
        assert_eq!(result.records.len(), 1);
    }
}

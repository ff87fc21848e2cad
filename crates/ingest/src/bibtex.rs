//! BibTeX format parser.
//!
//! Entries: `@<entrytype>{citekey, field = {value}, ...}`. Special entries
//! (`@string`, `@preamble`, `@comment`) are skipped. Unlike the other
//! formats this one needs a character-level scanner rather than a
//! tag-per-line state machine, because field values can themselves contain
//! braces, quotes, and embedded commas.
//! <http://www.bibtex.org/Format/>

use std::sync::OnceLock;

use regex::Regex;

use crate::base::{build_canonical_record, FileContext, ParseResult};
use srdedupe_model::{CanonicalRecord, RawTag};

pub const PARSER_VERSION: &str = "1.0.0";

fn entry_start_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?i)^@(\w+)\s*\{\s*([^,]*)\s*,?\s*$").unwrap())
}

fn field_name_re() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    CELL.get_or_init(|| Regex::new(r"(?i)^(\w+)\s*=\s*").unwrap())
}

pub fn parse_bibtex(lines: &[String], ctx: &FileContext) -> ParseResult {
    let mut result = ParseResult::default();
    let mut record_index: u32 = 0;

    let mut i: usize = 0;
    while i < lines.len() {
        let line = lines[i].trim();

        if !line.starts_with('@') {
            i += 1;
            continue;
        }

        let Some(caps) = entry_start_re().captures(line) else {
            result.warnings.push(format!(
                "Line {i}: Malformed entry start: {}",
                crate::base::truncate_chars(line, 50)
            ));
            i += 1;
            continue;
        };

        let entry_type = caps.get(1).unwrap().as_str().to_lowercase();
        let citekey = caps.get(2).unwrap().as_str().trim().to_string();

        if matches!(entry_type.as_str(), "string" | "preamble" | "comment") {
            let closing_line = find_closing_brace(lines, i);
            let closing_line_display = if closing_line < 0 {
                i as i64
            } else {
                closing_line
            };
            result.warnings.push(format!(
                "Line {i}: Skipping @{} entry (lines {i}-{closing_line_display})",
                entry_type.to_uppercase()
            ));
            i = if closing_line < 0 {
                i + 1
            } else {
                closing_line as usize + 1
            };
            continue;
        }

        let entry_start = i;
        let closing_line = find_closing_brace(lines, i);

        if closing_line < 0 {
            result
                .errors
                .push(format!("Line {i}: Unclosed entry @{entry_type}{{{citekey}}}"));
            i += 1;
            continue;
        }
        let closing_line = closing_line as usize;

        let entry_lines: Vec<String> = lines[entry_start..=closing_line].to_vec();
        let field_lines: &[String] = if entry_lines.len() > 1 {
            &entry_lines[1..entry_lines.len() - 1]
        } else {
            &[]
        };
        let fields_data = parse_fields(field_lines);

        if let Some(rec) = build_record(
            &entry_type,
            &citekey,
            fields_data,
            entry_lines,
            entry_start as u32,
            ctx,
            record_index,
        ) {
            result.records.push(rec);
            record_index += 1;
        }

        i = closing_line + 1;
    }

    result
}

/// Scans from `lines[start_line]` for the `}` that closes the brace opened
/// on that line, skipping braces and `@`/field delimiters inside quoted
/// strings and honoring backslash escapes. Returns -1 if never closed.
fn find_closing_brace(lines: &[String], start_line: usize) -> i64 {
    let mut brace_depth: i32 = 0;
    let mut in_quotes = false;
    let mut escape_next = false;

    for (offset, line) in lines[start_line..].iter().enumerate() {
        for ch in line.chars() {
            if escape_next {
                escape_next = false;
                continue;
            }
            if ch == '\\' {
                escape_next = true;
                continue;
            }
            if ch == '"' {
                in_quotes = !in_quotes;
            } else if !in_quotes {
                if ch == '{' {
                    brace_depth += 1;
                } else if ch == '}' {
                    brace_depth -= 1;
                    if brace_depth == 0 {
                        return (start_line + offset) as i64;
                    }
                }
            }
        }
    }

    -1
}

/// A single field: `(name, trimmed_value, value_lines, rel_line_start, rel_line_end)`.
type FieldData = (String, String, Vec<String>, u32, u32);

fn parse_fields(field_lines: &[String]) -> Vec<FieldData> {
    let mut fields = Vec::new();
    let content: Vec<char> = field_lines.join("\n").chars().collect();
    let len = content.len();

    let mut i = 0usize;
    while i < len {
        while i < len && content[i].is_whitespace() {
            i += 1;
        }
        if i >= len {
            break;
        }

        let rest: String = content[i..].iter().collect();
        let Some(caps) = field_name_re().captures(&rest) else {
            i += 1;
            continue;
        };
        let field_name = caps.get(1).unwrap().as_str().to_lowercase();
        let field_start = i;
        i += caps.get(0).unwrap().as_str().chars().count();

        while i < len && (content[i] == ' ' || content[i] == '\t') {
            i += 1;
        }
        if i >= len {
            break;
        }

        let (value, new_i) = if content[i] == '{' {
            parse_braced_value(&content, i)
        } else if content[i] == '"' {
            parse_quoted_value(&content, i)
        } else {
            parse_bare_value(&content, i)
        };
        i = new_i;

        while i < len && matches!(content[i], ' ' | '\t' | '\n') {
            i += 1;
        }
        if i < len && content[i] == ',' {
            i += 1;
        }

        let value_end = i;
        let value_lines_start = content[..field_start].iter().filter(|&&c| c == '\n').count() as u32;
        let value_lines_end = content[..value_end].iter().filter(|&&c| c == '\n').count() as u32;
        let field_content: String = content[field_start..value_end].iter().collect();
        let value_lines_list: Vec<String> = field_content.split('\n').map(str::to_string).collect();

        fields.push((
            field_name,
            value.trim().to_string(),
            value_lines_list,
            value_lines_start,
            value_lines_end,
        ));
    }

    fields
}

fn parse_braced_value(content: &[char], start: usize) -> (String, usize) {
    let mut brace_depth: i32 = 0;
    let mut value = String::new();
    let mut i = start;

    while i < content.len() {
        let ch = content[i];
        if ch == '{' {
            brace_depth += 1;
            if brace_depth > 1 {
                value.push(ch);
            }
        } else if ch == '}' {
            brace_depth -= 1;
            if brace_depth == 0 {
                return (value, i + 1);
            }
            value.push(ch);
        } else {
            value.push(ch);
        }
        i += 1;
    }

    (value, i)
}

fn parse_quoted_value(content: &[char], start: usize) -> (String, usize) {
    let mut i = start + 1;
    let mut value = String::new();
    let mut escape_next = false;

    while i < content.len() {
        let ch = content[i];
        if escape_next {
            value.push(ch);
            escape_next = false;
        } else if ch == '\\' {
            escape_next = true;
        } else if ch == '"' {
            return (value, i + 1);
        } else {
            value.push(ch);
        }
        i += 1;
    }

    (value, i)
}

fn parse_bare_value(content: &[char], start: usize) -> (String, usize) {
    let mut value = String::new();
    let mut i = start;

    while i < content.len() && !matches!(content[i], ',' | '\n' | '}') {
        if content[i] == '#' {
            break;
        }
        value.push(content[i]);
        i += 1;
    }

    (value.trim().to_string(), i)
}

#[allow(clippy::too_many_arguments)]
fn build_record(
    entry_type: &str,
    citekey: &str,
    fields_data: Vec<FieldData>,
    entry_lines: Vec<String>,
    entry_start_line: u32,
    ctx: &FileContext,
    record_index: u32,
) -> Option<CanonicalRecord> {
    let mut raw_tags = Vec::with_capacity(fields_data.len() + 2);

    raw_tags.push(RawTag {
        tag: "__bibtex_entrytype".to_string(),
        value_lines: vec![entry_type.to_string()],
        value_raw_joined: entry_type.to_string(),
        occurrence: 0,
        line_start: entry_start_line,
        line_end: entry_start_line,
    });
    raw_tags.push(RawTag {
        tag: "__bibtex_citekey".to_string(),
        value_lines: vec![citekey.to_string()],
        value_raw_joined: citekey.to_string(),
        occurrence: 0,
        line_start: entry_start_line,
        line_end: entry_start_line,
    });

    let mut counts: std::collections::HashMap<String, u32> = std::collections::HashMap::new();
    for (field_name, value, value_lines, rel_start, rel_end) in fields_data {
        let occurrence = *counts.get(&field_name).unwrap_or(&0);
        counts.insert(field_name.clone(), occurrence + 1);

        raw_tags.push(RawTag {
            tag: field_name,
            value_lines,
            value_raw_joined: value,
            occurrence,
            line_start: entry_start_line + rel_start + 1,
            line_end: entry_start_line + rel_end + 1,
        });
    }

    build_canonical_record(raw_tags, entry_lines, "bibtex", ctx, record_index, PARSER_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn ctx() -> FileContext {
        FileContext::new(Path::new("input.bib"), b"dummy", None)
    }

    fn lines(s: &str) -> Vec<String> {
        s.lines().map(str::to_string).collect()
    }

    #[test]
    fn parses_braced_fields() {
        let result = parse_bibtex(
            &lines("@article{smith2020,\n  title = {A Study},\n  year = {2020}\n}\n"),
            &ctx(),
        );
        assert_eq!(result.records.len(), 1);
        let tags = &result.records[0].raw.tags;
        assert!(tags.iter().any(|t| t.tag == "title" && t.value_raw_joined == "A Study"));
        assert!(tags.iter().any(|t| t.tag == "__bibtex_citekey" && t.value_raw_joined == "smith2020"));
    }

    #[test]
    fn parses_quoted_and_bare_values() {
        let result = parse_bibtex(
            &lines("@article{k,\n  title = \"Quoted Title\",\n  year = 2020\n}\n"),
            &ctx(),
        );
        let tags = &result.records[0].raw.tags;
        assert!(tags.iter().any(|t| t.tag == "title" && t.value_raw_joined == "Quoted Title"));
        assert!(tags.iter().any(|t| t.tag == "year" && t.value_raw_joined == "2020"));
    }

    #[test]
    fn skips_string_and_preamble_entries() {
        let result = parse_bibtex(
            &lines("@string{anthology = \"Proc.\"}\n@article{k,\n  title = {T}\n}\n"),
            &ctx(),
        );
        assert_eq!(result.records.len(), 1);
        assert!(result.warnings.iter().any(|w| w.contains("Skipping @STRING")));
    }

    #[test]
    fn unclosed_entry_is_an_error() {
        let result = parse_bibtex(&lines("@article{k,\n  title = {unterminated\n"), &ctx());
        assert!(result.records.is_empty());
        assert!(result.errors.iter().any(|e| e.contains("Unclosed entry")));
    }

    #[test]
    fn nested_braces_in_value_are_preserved() {
        let result = parse_bibtex(
            &lines("@article{k,\n  title = {A {Nested} Title}\n}\n"),
            &ctx(),
        );
        let tags = &result.records[0].raw.tags;
        assert!(tags.iter().any(|t| t.tag == "title" && t.value_raw_joined == "A {Nested} Title"));
    }

    #[test]
    fn two_entries_are_parsed_independently() {
        let result = parse_bibtex(
            &lines("@article{a,\n  title = {One}\n}\n@article{b,\n  title = {Two}\n}\n"),
            &ctx(),
        );
        assert_eq!(result.records.len(), 2);
    }
}

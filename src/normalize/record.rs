// src/normalize/record.rs
use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::trace;

use crate::config::ExtraFieldPolicy;

/// Number of annotation fields kept per token.
pub const FIELD_COUNT: usize = 4;

/// Column names of the normalized table, in field order.
pub const HEADER: [&str; FIELD_COUNT] = ["Word", "POS", "Lemma", "Root"];

/// One annotated token: surface form, part-of-speech tag, lemma and root.
/// Fields are stored verbatim, no trimming or type coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    #[serde(rename = "Word")]
    pub word: String,
    #[serde(rename = "POS")]
    pub pos: String,
    #[serde(rename = "Lemma")]
    pub lemma: String,
    #[serde(rename = "Root")]
    pub root: String,
}

impl Record {
    pub fn new(
        word: impl Into<String>,
        pos: impl Into<String>,
        lemma: impl Into<String>,
        root: impl Into<String>,
    ) -> Self {
        Self {
            word: word.into(),
            pos: pos.into(),
            lemma: lemma.into(),
            root: root.into(),
        }
    }
}

/// Result of parsing a single raw line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// No tab on the line (blank line, section marker, ...).
    Discarded,
    /// `truncated` is set when segments beyond the fourth were dropped.
    Record { record: Record, truncated: bool },
}

/// Records of one file plus counters for the subject report.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedText {
    pub records: Vec<Record>,
    pub discarded: usize,
    pub truncated: usize,
}

/// Split after each `\n`, `\r\n` or lone `\r`, keeping the terminator.
/// The last line may have none.
pub fn split_lines(text: &str) -> impl Iterator<Item = &str> + '_ {
    let bytes = text.as_bytes();
    let mut start = 0;
    std::iter::from_fn(move || {
        if start >= bytes.len() {
            return None;
        }
        let mut end = start;
        while end < bytes.len() {
            match bytes[end] {
                b'\n' => {
                    end += 1;
                    break;
                }
                b'\r' => {
                    end += 1;
                    if bytes.get(end) == Some(&b'\n') {
                        end += 1;
                    }
                    break;
                }
                _ => end += 1,
            }
        }
        // terminators are ASCII, so `end` is a char boundary
        let line = &text[start..end];
        start = end;
        Some(line)
    })
}

/// Remove one trailing `\r\n`, `\n` or `\r`. A line without a terminator
/// (typically the last line of a file) is returned unchanged.
pub fn strip_line_terminator(line: &str) -> &str {
    line.strip_suffix("\r\n")
        .or_else(|| line.strip_suffix('\n'))
        .or_else(|| line.strip_suffix('\r'))
        .unwrap_or(line)
}

/// Parse one raw line (terminator included or not) into a record.
///
/// Lines with two or three segments are padded with empty fields.
pub fn parse_line(line: &str, policy: ExtraFieldPolicy) -> Result<ParsedLine> {
    let line = strip_line_terminator(line);
    let mut parts: Vec<&str> = line.split('\t').collect();

    if parts.len() <= 1 {
        return Ok(ParsedLine::Discarded);
    }

    let truncated = parts.len() > FIELD_COUNT;
    if truncated {
        match policy {
            ExtraFieldPolicy::Truncate => {
                trace!(segments = parts.len(), "dropping extra segments");
                parts.truncate(FIELD_COUNT);
            }
            ExtraFieldPolicy::Reject => bail!(
                "line has {} tab-separated fields, at most {} allowed",
                parts.len(),
                FIELD_COUNT
            ),
        }
    }
    parts.resize(FIELD_COUNT, "");

    Ok(ParsedLine::Record {
        record: Record::new(parts[0], parts[1], parts[2], parts[3]),
        truncated,
    })
}

/// Parse every line of a decoded file, preserving line order.
pub fn parse_text(text: &str, policy: ExtraFieldPolicy) -> Result<ParsedText> {
    let mut out = ParsedText::default();
    for (idx, line) in split_lines(text).enumerate() {
        match parse_line(line, policy).with_context(|| format!("line {}", idx + 1))? {
            ParsedLine::Discarded => out.discarded += 1,
            ParsedLine::Record { record, truncated } => {
                if truncated {
                    out.truncated += 1;
                }
                out.records.push(record);
            }
        }
    }
    Ok(out)
}

// src/extract.rs
use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use std::{
    fs,
    io::{Cursor, Write},
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{info, instrument};

use crate::config::{Config, TextEncoding};
use crate::output::write_atomic;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    pub source: PathBuf,
    pub output: PathBuf,
    pub words: usize,
}

/// Values of `column` from CSV `text` (header row first), in row order.
/// Rows with a field count different from the header are an error.
pub fn column_values(text: &str, column: &str) -> Result<Vec<String>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(Cursor::new(text.as_bytes()));

    let headers = rdr.headers().context("reading CSV header")?.clone();
    let Some(idx) = headers.iter().position(|h| h == column) else {
        bail!(
            "column `{}` not found (available: {})",
            column,
            headers.iter().collect::<Vec<_>>().join(", ")
        );
    };

    let mut values = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("CSV parse error at record {}", row))?;
        values.push(record.get(idx).unwrap_or_default().to_string());
    }
    Ok(values)
}

/// Read `path` with `encoding` and project `column`.
pub fn read_column(path: &Path, column: &str, encoding: TextEncoding) -> Result<Vec<String>> {
    let bytes = fs::read(path).with_context(|| format!("failed to open {}", path.display()))?;
    let text = encoding
        .decode(bytes)
        .with_context(|| format!("failed to decode {} as {}", path.display(), encoding))?;
    column_values(&text, column).with_context(|| format!("reading {}", path.display()))
}

/// Write one value per line, each followed by `\n`. No header.
pub fn write_word_list<P: AsRef<Path>>(path: P, words: &[String]) -> Result<()> {
    let path = path.as_ref();
    write_atomic(path, |out| {
        for word in words {
            out.write_all(word.as_bytes())?;
            out.write_all(b"\n")?;
        }
        Ok(())
    })
    .with_context(|| format!("writing word list {}", path.display()))
}

/// Project the configured column of the cleaned table into the word list.
#[instrument(level = "info", skip_all, fields(base = %config.base_dir.display()))]
pub fn run(config: &Config) -> Result<ExtractReport> {
    config.validate()?;
    let start = Instant::now();
    let source = config.clean_table_path();
    let output = config.word_list_path();

    let words = read_column(&source, &config.word_column, config.encoding)?;
    write_word_list(&output, &words)?;

    info!(
        words = words.len(),
        elapsed = ?start.elapsed(),
        "wrote {}",
        output.display()
    );
    Ok(ExtractReport {
        source,
        output,
        words: words.len(),
    })
}

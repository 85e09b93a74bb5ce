// src/normalize/mod.rs
use anyhow::{Context, Result};
use std::{
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use tracing::{debug, error, info, instrument};

use crate::config::{Config, EntryOrder, FileErrorPolicy, TextEncoding};

pub mod record;
pub mod table;

pub use record::{
    parse_line, parse_text, split_lines, ParsedLine, ParsedText, Record, HEADER,
};
pub use table::write_table;

/// Outcome of normalizing one subject directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectReport {
    pub subject: String,
    pub output: PathBuf,
    pub files_read: usize,
    /// Files that failed under `FileErrorPolicy::Skip`.
    pub files_skipped: usize,
    pub records: usize,
    /// Lines without a tab.
    pub lines_discarded: usize,
    pub records_truncated: usize,
}

/// Immediate entries of `dir`, without extension filtering.
/// `exclude` drops one file name (the subject's own output table).
pub fn list_entries(
    dir: &Path,
    order: EntryOrder,
    exclude: Option<&OsStr>,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("cannot read directory {}", dir.display()))?
    {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        if exclude.is_some_and(|name| entry.file_name().as_os_str() == name) {
            debug!(path = %entry.path().display(), "skipping previous output");
            continue;
        }
        paths.push(entry.path());
    }

    if order == EntryOrder::Sorted {
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    }
    Ok(paths)
}

/// Read a whole corpus file and decode it; invalid bytes are an error.
pub fn read_corpus_file(path: &Path, encoding: TextEncoding) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("failed to open {}", path.display()))?;
    encoding
        .decode(bytes)
        .with_context(|| format!("failed to decode {} as {}", path.display(), encoding))
}

/// Build the corpus table for `subject` and write it next to its inputs.
///
/// Nothing is written unless every file was read (or skipped by policy).
#[instrument(level = "info", skip(config), fields(dir = %config.subject_dir(subject).display()))]
pub fn normalize_subject(config: &Config, subject: &str) -> Result<SubjectReport> {
    let start = Instant::now();
    let dir = config.subject_dir(subject);
    let output_name = config.output_name(subject);
    let entries = list_entries(&dir, config.entry_order, Some(OsStr::new(&output_name)))?;

    let mut records: Vec<Record> = Vec::new();
    let mut report = SubjectReport {
        subject: subject.to_string(),
        output: config.output_path(subject),
        files_read: 0,
        files_skipped: 0,
        records: 0,
        lines_discarded: 0,
        records_truncated: 0,
    };

    for path in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!(file = %name, "reading");

        let parsed = read_corpus_file(&path, config.encoding)
            .and_then(|text| parse_text(&text, config.extra_fields))
            .with_context(|| format!("processing {}", path.display()));

        match parsed {
            Ok(parsed) => {
                debug!(
                    file = %name,
                    records = parsed.records.len(),
                    discarded = parsed.discarded,
                    "parsed"
                );
                report.files_read += 1;
                report.lines_discarded += parsed.discarded;
                report.records_truncated += parsed.truncated;
                records.extend(parsed.records);
            }
            Err(err) if config.on_file_error == FileErrorPolicy::Skip => {
                error!(file = %name, "skipping: {:#}", err);
                report.files_skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }

    write_table(&report.output, &config.base_dir, &records)?;
    report.records = records.len();

    info!(
        records = report.records,
        files = report.files_read,
        skipped = report.files_skipped,
        elapsed = ?start.elapsed(),
        "wrote {}",
        report.output.display()
    );
    Ok(report)
}

/// Normalize every configured subject, in order.
#[instrument(level = "info", skip_all, fields(base = %config.base_dir.display()))]
pub fn run(config: &Config) -> Result<Vec<SubjectReport>> {
    config.validate()?;
    config
        .subjects
        .iter()
        .map(|subject| {
            normalize_subject(config, subject)
                .with_context(|| format!("normalizing subject {}", subject))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtraFieldPolicy;
    use crate::logging::init_test_logging;
    use tempfile::{tempdir, TempDir};

    fn corpus(files: &[(&str, &str)]) -> Result<(TempDir, Config)> {
        init_test_logging();
        let base = tempdir()?;
        let dir = base.path().join("Parliament");
        fs::create_dir_all(&dir)?;
        for (name, content) in files {
            fs::write(dir.join(name), content)?;
        }
        let config = Config {
            base_dir: base.path().to_path_buf(),
            ..Config::default()
        };
        Ok((base, config))
    }

    #[test]
    fn blank_line_contributes_nothing() -> Result<()> {
        let (_base, config) = corpus(&[("a.txt", "run\tVERB\trun\trun\n\n")])?;
        let reports = run(&config)?;

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].records, 1);
        assert_eq!(reports[0].lines_discarded, 1);
        assert_eq!(
            fs::read_to_string(config.output_path("Parliament"))?,
            "Word,POS,Lemma,Root\nrun,VERB,run,run\n"
        );
        Ok(())
    }

    #[test]
    fn files_in_name_order_lines_in_file_order() -> Result<()> {
        let (_base, config) = corpus(&[
            ("b.tsv", "three\tX\tthree\tthree\nfour\tX\tfour\tfour\n"),
            ("a.txt", "<s>\none\tX\tone\tone\ntwo\tX\ttwo\ttwo\n"),
            ("c", "five\tX\tfive\tfive"),
        ])?;
        normalize_subject(&config, "Parliament")?;

        let text = fs::read_to_string(config.output_path("Parliament"))?;
        let words: Vec<&str> = text
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(words, vec!["one", "two", "three", "four", "five"]);
        Ok(())
    }

    #[test]
    fn rerun_is_byte_identical() -> Result<()> {
        let (_base, config) = corpus(&[
            ("x.txt", "a\tN\ta\ta\nb,c\tN\tb\tb\r\n"),
            ("y.txt", "\"q\"\tPUNCT\t\"\t\"\n"),
        ])?;
        let out = config.output_path("Parliament");

        let first = run(&config)?;
        let bytes = fs::read(&out)?;
        let second = run(&config)?;

        assert_eq!(bytes, fs::read(&out)?);
        assert_eq!(first, second);
        assert_eq!(second[0].files_read, 2);
        Ok(())
    }

    #[test]
    fn subject_dir_holds_only_inputs_and_table() -> Result<()> {
        let (base, config) = corpus(&[("a.txt", "a\tX\ta\ta\n")])?;
        run(&config)?;

        let mut names: Vec<String> = fs::read_dir(base.path().join("Parliament"))?
            .map(|e| -> Result<String> { Ok(e?.file_name().to_string_lossy().into_owned()) })
            .collect::<Result<_>>()?;
        names.sort();
        assert_eq!(names, vec!["Parliament.csv", "a.txt"]);
        // staging happens one level up and is cleaned by the rename
        assert_eq!(fs::read_dir(base.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn undecodable_file_aborts_without_output() -> Result<()> {
        let (base, config) = corpus(&[("a.txt", "ok\tX\tok\tok\n")])?;
        fs::write(
            base.path().join("Parliament").join("b.txt"),
            b"bad\tX\t\xff\xfe\tbad\n",
        )?;

        let err = run(&config).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("b.txt"), "{}", msg);
        assert!(msg.contains("invalid utf-8"), "{}", msg);
        assert!(!config.output_path("Parliament").exists());
        Ok(())
    }

    #[test]
    fn skip_policy_continues_past_bad_file() -> Result<()> {
        let (base, mut config) = corpus(&[
            ("a.txt", "ok\tX\tok\tok\n"),
            ("c.txt", "fine\tX\tfine\tfine\n"),
        ])?;
        fs::write(base.path().join("Parliament").join("b.txt"), b"\xff\n")?;
        config.on_file_error = FileErrorPolicy::Skip;

        let report = normalize_subject(&config, "Parliament")?;
        assert_eq!(report.files_read, 2);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.records, 2);
        Ok(())
    }

    #[test]
    fn reject_policy_aborts_on_wide_line() -> Result<()> {
        let (_base, mut config) = corpus(&[("a.txt", "a\tb\tc\td\te\n")])?;
        config.extra_fields = ExtraFieldPolicy::Reject;

        let msg = format!("{:#}", run(&config).unwrap_err());
        assert!(msg.contains("line 1"), "{}", msg);
        assert!(!config.output_path("Parliament").exists());
        Ok(())
    }

    #[test]
    fn missing_subject_directory_is_fatal() -> Result<()> {
        let (_base, mut config) = corpus(&[])?;
        config.subjects = vec!["Parliament".into(), "Nowhere".into()];

        let msg = format!("{:#}", run(&config).unwrap_err());
        assert!(msg.contains("normalizing subject Nowhere"), "{}", msg);
        Ok(())
    }

    #[test]
    fn nested_directory_is_opened_as_file() -> Result<()> {
        let (base, config) = corpus(&[("a.txt", "a\tX\ta\ta\n")])?;
        fs::create_dir(base.path().join("Parliament").join("sub"))?;

        assert!(run(&config).is_err());
        Ok(())
    }

    #[test]
    fn platform_order_lists_every_entry() -> Result<()> {
        let (base, _) = corpus(&[("a", ""), ("b", ""), ("Parliament.csv", "")])?;
        let dir = base.path().join("Parliament");

        let mut all = list_entries(&dir, EntryOrder::Platform, None)?;
        all.sort();
        assert_eq!(all.len(), 3);

        let sorted = list_entries(&dir, EntryOrder::Sorted, Some(OsStr::new("Parliament.csv")))?;
        assert_eq!(sorted, vec![dir.join("a"), dir.join("b")]);
        Ok(())
    }
}

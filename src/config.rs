// src/config.rs
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

/// Placeholder replaced by the subject name in `output_name_template`.
pub const SUBJECT_PLACEHOLDER: &str = "{subject}";

/// Text codec used for every corpus file and for the word list.
/// Only UTF-8 is supported; undecodable bytes are an error, never replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum TextEncoding {
    #[default]
    Utf8,
}

impl TextEncoding {
    /// Decode `bytes`, failing on the first invalid sequence.
    pub fn decode(self, bytes: Vec<u8>) -> Result<String> {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes).map_err(|e| {
                let err = e.utf8_error();
                anyhow::anyhow!(
                    "invalid utf-8 at byte offset {}: {}",
                    err.valid_up_to(),
                    err
                )
            }),
        }
    }
}

impl TryFrom<String> for TextEncoding {
    type Error = String;

    fn try_from(name: String) -> std::result::Result<Self, Self::Error> {
        match name.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            other => Err(format!("unsupported encoding `{}` (only utf-8)", other)),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => f.write_str("utf-8"),
        }
    }
}

/// Order in which the entries of a subject directory are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrder {
    /// Lexicographic by file name; reproducible across runs and platforms.
    #[default]
    Sorted,
    /// Whatever `read_dir` yields.
    Platform,
}

/// What to do with a line that has more than four tab-separated segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtraFieldPolicy {
    /// Keep the first four segments.
    #[default]
    Truncate,
    /// Abort with an error naming the file and line.
    Reject,
}

/// What to do when a corpus file cannot be read or decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileErrorPolicy {
    /// Abort the whole run; nothing is written for the subject.
    #[default]
    Abort,
    /// Log the failure and continue with the next file.
    Skip,
}

/// Settings shared by the normalizer and the extractor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Root of the corpus; subjects live directly below it.
    pub base_dir: PathBuf,
    /// Subdirectories of `base_dir` to normalize, in order.
    pub subjects: Vec<String>,
    pub encoding: TextEncoding,
    /// Name of the normalized table, `{subject}` is substituted.
    pub output_name_template: String,
    pub entry_order: EntryOrder,
    pub extra_fields: ExtraFieldPolicy,
    pub on_file_error: FileErrorPolicy,
    /// Cleaned table read by the extractor, relative to `base_dir`.
    pub clean_table_name: String,
    /// Word list written by the extractor, relative to `base_dir`.
    pub word_list_name: String,
    /// Column projected into the word list.
    pub word_column: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: Path::new("..").join("data").join("korpus"),
            subjects: vec!["Parliament".to_string()],
            encoding: TextEncoding::Utf8,
            output_name_template: format!("{}.csv", SUBJECT_PLACEHOLDER),
            entry_order: EntryOrder::Sorted,
            extra_fields: ExtraFieldPolicy::Truncate,
            on_file_error: FileErrorPolicy::Abort,
            clean_table_name: "norm_korpus_clean.csv".to_string(),
            word_list_name: "jo_korpus.txt".to_string(),
            word_column: "Word".to_string(),
        }
    }
}

impl Config {
    /// Load a YAML config; missing keys fall back to the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.output_name_template.contains(SUBJECT_PLACEHOLDER) && self.subjects.len() > 1 {
            bail!(
                "output_name_template `{}` has no {} placeholder; subjects would overwrite each other",
                self.output_name_template,
                SUBJECT_PLACEHOLDER
            );
        }
        for name in [
            &self.output_name_template,
            &self.clean_table_name,
            &self.word_list_name,
        ] {
            if name.trim().is_empty() || name.contains('/') || name.contains('\\') {
                bail!("`{}` must be a plain file name", name);
            }
        }
        if self.word_column.is_empty() {
            bail!("word_column must not be empty");
        }
        Ok(())
    }

    pub fn subject_dir(&self, subject: &str) -> PathBuf {
        self.base_dir.join(subject)
    }

    /// File name of the normalized table for `subject`.
    pub fn output_name(&self, subject: &str) -> String {
        self.output_name_template
            .replace(SUBJECT_PLACEHOLDER, subject)
    }

    pub fn output_path(&self, subject: &str) -> PathBuf {
        self.subject_dir(subject).join(self.output_name(subject))
    }

    pub fn clean_table_path(&self) -> PathBuf {
        self.base_dir.join(&self.clean_table_name)
    }

    pub fn word_list_path(&self) -> PathBuf {
        self.base_dir.join(&self.word_list_name)
    }
}

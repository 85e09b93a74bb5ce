use anyhow::Result;
use clap::{Parser, Subcommand};
use korpus::{extract, logging::init_logging, normalize, Config};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    name = "korpus",
    version,
    about = "Normalize annotated corpus files and extract word lists"
)]
struct Cli {
    /// YAML config file; unset keys keep their defaults
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Corpus root (default ../data/korpus)
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert `<base>/<subject>/*` tab-separated files into `<subject>.csv`
    Normalize {
        /// Subject directory to process; repeatable
        #[arg(long = "subject", short)]
        subjects: Vec<String>,
    },
    /// Write the Word column of the cleaned table as a plain word list
    Extract,
    /// Run `normalize`, then `extract`, with the same settings
    All {
        /// Subject directory to process; repeatable
        #[arg(long = "subject", short)]
        subjects: Vec<String>,
    },
}

impl Cli {
    fn into_config(self) -> Result<(Config, Command)> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };
        if let Some(dir) = self.base_dir {
            config.base_dir = dir;
        }
        if let Command::Normalize { subjects } | Command::All { subjects } = &self.command {
            if !subjects.is_empty() {
                config.subjects = subjects.clone();
            }
        }
        Ok((config, self.command))
    }
}

fn run_normalize(config: &Config) -> Result<()> {
    for report in normalize::run(config)? {
        info!(
            subject = %report.subject,
            records = report.records,
            discarded = report.lines_discarded,
            truncated = report.records_truncated,
            skipped_files = report.files_skipped,
            "normalized"
        );
    }
    Ok(())
}

fn run_extract(config: &Config) -> Result<()> {
    let report = extract::run(config)?;
    info!(
        source = %report.source.display(),
        words = report.words,
        "extracted"
    );
    Ok(())
}

fn main() -> Result<()> {
    init_logging();
    let (config, command) = Cli::parse().into_config()?;

    match command {
        Command::Normalize { .. } => run_normalize(&config)?,
        Command::Extract => run_extract(&config)?,
        Command::All { .. } => {
            run_normalize(&config)?;
            run_extract(&config)?;
        }
    }

    println!("Finished!");
    Ok(())
}

// src/output.rs
use anyhow::{Context, Result};
use std::{
    io::{BufWriter, Write},
    path::Path,
};
use tempfile::NamedTempFile;

/// Write `path` through a temp file in the same directory and rename it into
/// place, so a failure mid-write leaves any previous file untouched.
pub fn write_atomic<P, F>(path: P, fill: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<()>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    write_atomic_in(path, dir, fill)
}

/// Like [`write_atomic`], but stages the temp file in `staging_dir`, which
/// must be on the same filesystem as `path`.
pub fn write_atomic_in<P, F>(path: P, staging_dir: &Path, fill: F) -> Result<()>
where
    P: AsRef<Path>,
    F: FnOnce(&mut BufWriter<&mut NamedTempFile>) -> Result<()>,
{
    let path = path.as_ref();
    let mut tmp = NamedTempFile::new_in(staging_dir)
        .with_context(|| format!("creating temp file in {}", staging_dir.display()))?;
    {
        let mut writer = BufWriter::new(&mut tmp);
        fill(&mut writer)?;
        writer
            .flush()
            .with_context(|| format!("flushing {}", path.display()))?;
    }
    tmp.as_file()
        .sync_all()
        .with_context(|| format!("syncing {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("replacing {}", path.display()))?;
    Ok(())
}

use anyhow::{Context, Result};
use csv::{Terminator, WriterBuilder};
use std::path::Path;

use super::record::{Record, HEADER};
use crate::output::write_atomic_in;

/// Serialize `records` as CSV with a `Word,POS,Lemma,Root` header and no
/// index column. The header is written even when there are no records.
///
/// The temp file is staged in `staging_dir` so an interrupted run never leaves
/// a partial table among the corpus files next to `path`.
pub fn write_table<P: AsRef<Path>>(
    path: P,
    staging_dir: &Path,
    records: &[Record],
) -> Result<()> {
    let path = path.as_ref();
    write_atomic_in(path, staging_dir, |out| {
        let mut wtr = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(out);
        wtr.write_record(HEADER)
            .with_context(|| format!("writing header to {}", path.display()))?;
        for (idx, record) in records.iter().enumerate() {
            wtr.serialize(record)
                .with_context(|| format!("writing record {} to {}", idx, path.display()))?;
        }
        wtr.flush()?;
        Ok(())
    })
}

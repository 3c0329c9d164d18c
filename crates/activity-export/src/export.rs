use crate::records::Record;
use anyhow::Context;
use patharg::OutputArg;
use std::io;

/// Write `records` to `writer` as CSV, header row first.  The header is
/// written even when there are no records.
pub(crate) fn write_records<W: io::Write, R: Record>(
    writer: W,
    records: &[R],
) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(R::HEADER)
        .context("failed to write CSV header")?;
    for (i, r) in records.iter().enumerate() {
        wtr.serialize(r)
            .with_context(|| format!("failed to serialize record #{}", i + 1))?;
    }
    wtr.flush().context("failed to flush CSV output")?;
    Ok(())
}

/// Create or truncate `outfile` and write `records` to it as CSV
pub(crate) fn export<R: Record>(outfile: &OutputArg, records: &[R]) -> anyhow::Result<()> {
    let fp = outfile
        .create()
        .with_context(|| format!("failed to open {outfile:#} for writing"))?;
    write_records(fp, records).with_context(|| format!("failed to write {outfile:#}"))?;
    tracing::info!(records = records.len(), "Wrote {outfile:#}");
    Ok(())
}

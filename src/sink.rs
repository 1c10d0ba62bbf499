//! JSON-lines output sink for per-event prediction records

use crate::types::record::EventRecord;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

/// Writes one [`EventRecord`] per line
pub struct RecordWriter<W: Write> {
    writer: W,
    records: u64,
}

impl RecordWriter<BufWriter<File>> {
    /// Create (or truncate) an output file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        info!(path = %path.display(), "Writing records");
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> RecordWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, records: 0 }
    }

    /// Append one record
    pub fn write(&mut self, record: &EventRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record).context("Failed to serialize record")?;
        self.writer.write_all(b"\n")?;
        self.records += 1;

        debug!(
            event_id = record.event_id,
            jets = record.jets.len(),
            "Wrote event record"
        );
        Ok(())
    }

    /// Number of records written so far
    pub fn records(&self) -> u64 {
        self.records
    }

    /// Flush and return the underlying writer
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush().context("Failed to flush records")?;
        Ok(self.writer)
    }
}

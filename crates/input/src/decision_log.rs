//! Append-only JSONL log of filter decisions.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use steadyhand_common::config::FilterConfig;
use steadyhand_common::error::{SteadyError, SteadyResult};
use steadyhand_filter_core::{DecisionRecord, DecisionSink};

/// First line of a decision log, written as a `#` comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLogHeader {
    pub schema_version: String,
    /// Wall-clock time at session start (RFC 3339).
    pub epoch_wall: String,
    pub filter: FilterConfig,
}

/// Writes decision records to a JSONL file.
pub struct JsonlDecisionLog {
    writer: BufWriter<File>,
    path: PathBuf,
    records_written: u64,
}

impl JsonlDecisionLog {
    /// Create a new log, truncating any existing file, and write the header.
    pub fn create(path: &Path, header: &DecisionLogHeader) -> SteadyResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;

        let mut writer = BufWriter::new(file);

        let header_json = serde_json::to_string(header)?;
        writeln!(writer, "# {header_json}")
            .map_err(|e| SteadyError::output(format!("Failed to write header: {e}")))?;

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            records_written: 0,
        })
    }

    /// Number of records written.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Path to the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DecisionSink for JsonlDecisionLog {
    fn record(&mut self, record: &DecisionRecord) -> SteadyResult<()> {
        let json = serde_json::to_string(record)?;
        writeln!(self.writer, "{json}")
            .map_err(|e| SteadyError::output(format!("Failed to write decision: {e}")))?;
        self.records_written += 1;

        if self.records_written % 1000 == 0 {
            self.flush()?;
        }

        Ok(())
    }

    fn flush(&mut self) -> SteadyResult<()> {
        self.writer
            .flush()
            .map_err(|e| SteadyError::output(format!("Failed to flush decision log: {e}")))
    }
}

impl Drop for JsonlDecisionLog {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}

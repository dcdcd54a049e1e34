//! Tick sources: where each cycle's raw table comes from.
//!
//! Decoding the replay format itself is the job of an external parser.
//! [`TickSource`] is the seam to it: given the list of columns to extract,
//! return one row per `(tick, entity)` or fail if the replay cannot be read
//! yet. Every failure is a "not ready" condition for the poll loop.
//!
//! [`JsonDumpSource`] reads the table export the parser writes next to the
//! replay: either a JSON array of row objects or one JSON object per line.

use std::path::{Path, PathBuf};

use demoradar_types::{RawTickRow, TickTable};
use serde_json::{Map, Value};
use tracing::trace;

/// Reasons a source cannot produce a table this cycle.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The file could not be opened or read (missing, locked, ...).
    #[error("cannot read {path}: {source}")]
    Io {
        /// The file that was read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The content is not a complete table yet.
    #[error("malformed tick table in {path}: {message}")]
    Malformed {
        /// The file that was read.
        path: PathBuf,
        /// Description of the parse failure.
        message: String,
    },

    /// A requested column is absent from every row.
    #[error("column {column:?} missing from tick table")]
    MissingColumn {
        /// The missing column name.
        column: String,
    },
}

/// Produces the raw tick table for the current cycle.
#[allow(async_fn_in_trait)]
pub trait TickSource {
    /// Parse the replay and return every row recorded so far.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if the replay is not parseable yet.
    async fn parse_ticks(&self, fields: &[&str]) -> Result<TickTable, SourceError>;

    /// Identifier of the replay, used as the payload's `demo` field.
    fn describe(&self) -> &str;
}

/// Reads a JSON tick export from disk on every call.
#[derive(Debug, Clone)]
pub struct JsonDumpSource {
    path: PathBuf,
    label: String,
}

impl JsonDumpSource {
    /// Create a source for `path`. The path as given is the source label.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        Self { path, label }
    }

    /// The file read each cycle.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn malformed(&self, message: impl Into<String>) -> SourceError {
        SourceError::Malformed {
            path: self.path.clone(),
            message: message.into(),
        }
    }

    fn parse_records(&self, text: &str) -> Result<Vec<Map<String, Value>>, SourceError> {
        let trimmed = text.trim_start();
        if trimmed.starts_with('[') {
            return serde_json::from_str(trimmed).map_err(|e| self.malformed(e.to_string()));
        }

        trimmed
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(n, line)| {
                serde_json::from_str(line)
                    .map_err(|e| self.malformed(format!("line {}: {e}", n.saturating_add(1))))
            })
            .collect()
    }
}

impl TickSource for JsonDumpSource {
    async fn parse_ticks(&self, fields: &[&str]) -> Result<TickTable, SourceError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;

        let records = self.parse_records(&text)?;
        if !records.is_empty() {
            if let Some(column) = fields
                .iter()
                .find(|field| !records.iter().any(|r| r.contains_key(**field)))
            {
                return Err(SourceError::MissingColumn {
                    column: (*column).to_owned(),
                });
            }
        }

        trace!(path = %self.path.display(), rows = records.len(), "tick table read");
        Ok(records.iter().map(RawTickRow::from_record).collect())
    }

    fn describe(&self) -> &str {
        &self.label
    }
}

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CalibrationEntry, CalibrationLog};
use crate::error::SnapshotError;

const ID_PREFIX: &str = "cal_";

/// Append-only store of stamped calibrations, newest first.
#[derive(Clone, Debug, Default)]
pub struct EvidenceLog {
    entries: Vec<CalibrationLog>,
    last_millis: i64,
}

/// File shape of an evidence export.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EvidenceExport {
    pub logs: Vec<CalibrationLog>,
}

impl EvidenceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the log with already-stamped entries, kept in the given order.
    pub fn with_entries(entries: Vec<CalibrationLog>) -> Self {
        let last_millis = entries
            .iter()
            .map(|log| {
                log.id
                    .strip_prefix(ID_PREFIX)
                    .and_then(|millis| millis.parse::<i64>().ok())
                    .unwrap_or_else(|| log.timestamp.timestamp_millis())
            })
            .max()
            .unwrap_or(0);
        Self {
            entries,
            last_millis,
        }
    }

    pub fn append(&mut self, entry: CalibrationEntry) -> &CalibrationLog {
        self.append_at(entry, Utc::now())
    }

    /// Stamps `entry` as of `now` and puts it at the front.
    ///
    /// Ids follow `cal_<unix millis>`; two entries within one millisecond get
    /// consecutive ids.
    pub fn append_at(&mut self, entry: CalibrationEntry, now: DateTime<Utc>) -> &CalibrationLog {
        let millis = now.timestamp_millis().max(self.last_millis + 1);
        self.last_millis = millis;

        let log = CalibrationLog {
            id: format!("{ID_PREFIX}{millis}"),
            timestamp: now,
            entry,
        };
        tracing::debug!(id = %log.id, kind = ?log.entry.kind, "evidence appended");

        self.entries.insert(0, log);
        &self.entries[0]
    }

    pub fn entries(&self) -> &[CalibrationLog] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn export(&self) -> EvidenceExport {
        EvidenceExport {
            logs: self.entries.clone(),
        }
    }

    pub fn export_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.export())
    }

    pub fn export_to(&self, path: &Path) -> Result<(), SnapshotError> {
        let json = self
            .export_json()
            .map_err(|source| SnapshotError::parse(path, source))?;
        fs::write(path, json).map_err(|source| SnapshotError::io(path, source))?;
        tracing::info!(path = %path.display(), logs = self.entries.len(), "evidence exported");
        Ok(())
    }
}

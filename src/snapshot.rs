//! Snapshot records as reported by `btrfs subvolume show`.

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::btrfs::report::Report;
use crate::error::ReportError;
use crate::retention::bucket::{self, BucketKeys};

/// Timestamp layout used by `btrfs subvolume show`, e.g. `2024-01-09 08:00:00 +0100`.
pub const CREATION_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// One snapshot that existed at scan time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    pub uuid: String,
    pub subvolume_id: u64,
    pub creation_time: DateTime<FixedOffset>,
}

impl SnapshotRecord {
    pub fn new(
        name: impl Into<String>,
        uuid: impl Into<String>,
        subvolume_id: u64,
        creation_time: DateTime<FixedOffset>,
    ) -> Self {
        let name = name.into();
        let volume = volume_of(&name).map(str::to_string);
        SnapshotRecord {
            name,
            volume,
            uuid: uuid.into(),
            subvolume_id,
            creation_time,
        }
    }

    /// Build a record from a parsed `btrfs subvolume show` report.
    ///
    /// Every field is required; nothing is guessed.
    pub fn from_report(report: &Report) -> Result<Self, ReportError> {
        let name = report.require("Name:")?;
        let uuid = report.require("UUID:")?;

        let id_str = report.require("Subvolume ID:")?;
        let subvolume_id = id_str
            .parse::<u64>()
            .map_err(|_| ReportError::InvalidSubvolumeId(id_str.clone()))?;

        let creation_time = parse_creation_time(&report.require("Creation time:")?)?;

        Ok(SnapshotRecord::new(name, uuid, subvolume_id, creation_time))
    }

    pub fn buckets(&self) -> BucketKeys {
        bucket::keys(&self.creation_time)
    }
}

/// Volume a snapshot belongs to: its name without the trailing `.<suffix>`.
///
/// Names without a `.` (or with an empty volume part) cannot be grouped.
pub fn volume_of(name: &str) -> Option<&str> {
    match name.rsplit_once('.') {
        Some((volume, _)) if !volume.is_empty() => Some(volume),
        _ => None,
    }
}

pub fn parse_creation_time(value: &str) -> Result<DateTime<FixedOffset>, ReportError> {
    DateTime::parse_from_str(value.trim(), CREATION_TIME_FORMAT).map_err(|e| {
        ReportError::InvalidCreationTime {
            value: value.to_string(),
            reason: e.to_string(),
        }
    })
}

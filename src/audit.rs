//! Append-only audit log.
//!
//! Two JSON-lines files in the log directory:
//! - `classification.jsonl`: the full classification of every volume
//! - `deletions.jsonl`: only the two delete sets
//!
//! Entries are appended before any snapshot of the run is deleted.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::policy::RetentionPolicy;
use crate::retention::Classification;
use crate::snapshot::SnapshotRecord;

pub const CLASSIFICATION_LOG: &str = "classification.jsonl";
pub const DELETION_LOG: &str = "deletions.jsonl";

#[derive(Serialize)]
struct ClassificationEntry<'a> {
    run_at: DateTime<FixedOffset>,
    volume: &'a str,
    dry_run: bool,
    policy: &'a RetentionPolicy,
    classification: &'a Classification,
}

#[derive(Serialize)]
struct DeletionEntry<'a> {
    run_at: DateTime<FixedOffset>,
    volume: &'a str,
    dry_run: bool,
    delete_day2day: &'a [SnapshotRecord],
    delete_long_term: &'a [SnapshotRecord],
}

/// Default log directory (~/.local/share/snapprune or platform equivalent).
pub fn default_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "snapprune").map(|dirs| dirs.data_dir().to_path_buf())
}

pub struct AuditLog {
    classification: File,
    deletions: File,
}

impl AuditLog {
    /// Open (creating if needed) both logs in `dir` for appending.
    pub fn open(dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        Ok(AuditLog {
            classification: append(&dir.join(CLASSIFICATION_LOG))?,
            deletions: append(&dir.join(DELETION_LOG))?,
        })
    }

    pub fn record(
        &mut self,
        run_at: DateTime<FixedOffset>,
        volume: &str,
        dry_run: bool,
        policy: &RetentionPolicy,
        classification: &Classification,
    ) -> io::Result<()> {
        let full = ClassificationEntry {
            run_at,
            volume,
            dry_run,
            policy,
            classification,
        };
        write_line(&mut self.classification, &full)?;

        let deletions = DeletionEntry {
            run_at,
            volume,
            dry_run,
            delete_day2day: &classification.delete_day2day,
            delete_long_term: &classification.delete_long_term,
        };
        write_line(&mut self.deletions, &deletions)
    }
}

fn append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn write_line<T: Serialize>(file: &mut File, entry: &T) -> io::Result<()> {
    let mut line = serde_json::to_vec(entry)?;
    line.push(b'\n');
    file.write_all(&line)?;
    file.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retention::classify;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z").unwrap()
    }

    #[test]
    fn appends_one_line_per_volume_to_each_log() {
        let dir = tempfile::tempdir().unwrap();
        let now = at("2024-01-10 00:00:00 +0000");
        let snapshots = vec![
            SnapshotRecord::new("home.a", "u1", 1, at("2024-01-06 01:00:00 +0000")),
            SnapshotRecord::new("home.b", "u2", 2, at("2024-01-06 02:00:00 +0000")),
        ];
        let policy = RetentionPolicy::DEFAULT;
        let classification = classify(&snapshots, &policy, now);

        let mut log = AuditLog::open(dir.path()).unwrap();
        log.record(now, "home", true, &policy, &classification).unwrap();
        drop(log);

        // reopening appends rather than truncating
        let mut log = AuditLog::open(dir.path()).unwrap();
        log.record(now, "home", false, &policy, &classification).unwrap();

        let full = fs::read_to_string(dir.path().join(CLASSIFICATION_LOG)).unwrap();
        let deletions = fs::read_to_string(dir.path().join(DELETION_LOG)).unwrap();
        assert_eq!(full.lines().count(), 2);
        assert_eq!(deletions.lines().count(), 2);

        let first: serde_json::Value = serde_json::from_str(full.lines().next().unwrap()).unwrap();
        assert_eq!(first["volume"], "home");
        assert_eq!(first["dry_run"], true);
        assert_eq!(first["policy"]["firstOfDay"], 5);
        assert_eq!(first["classification"]["day_rest"][0]["subvolume_id"], 2);

        let deleted: serde_json::Value =
            serde_json::from_str(deletions.lines().next().unwrap()).unwrap();
        assert_eq!(deleted["delete_day2day"][0]["name"], "home.b");
        assert!(deleted.get("classification").is_none());
    }
}

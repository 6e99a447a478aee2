//! Inventory and deletion of btrfs snapshots.
//!
//! The pruning driver only sees the `SnapshotStore` trait. The real
//! implementation shells out to the `btrfs` tool; tests use an in-memory store.

pub mod command;
pub mod report;

use std::path::Path;

use crate::error::CommandError;
use report::{ListedSnapshot, Report};

pub use command::BtrfsCommand;

pub trait SnapshotStore {
    /// Snapshots below `volume_path`, in the order the tool lists them.
    fn list_snapshots(&self, volume_path: &Path) -> Result<Vec<ListedSnapshot>, CommandError>;

    /// Key/value report for one snapshot.
    fn describe_snapshot(&self, id: u64, volume_path: &Path) -> Result<Report, CommandError>;

    /// Delete one snapshot. Each call stands alone; nothing is retried.
    fn delete_snapshot(&self, id: u64, volume_path: &Path) -> Result<(), CommandError>;
}

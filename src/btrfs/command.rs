//! `btrfs` subprocess backend.
//!
//! Runs, per volume path:
//! - `btrfs subvolume list -s <path>` to enumerate snapshots
//! - `btrfs subvolume show -r <id> <path>` to describe one
//! - `btrfs subvolume delete -i <id> <path>` to delete one
//!
//! With elevation enabled every command goes through `sudo`. Calls block
//! until the tool exits; there is no timeout.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use super::report::{self, ListedSnapshot, Report};
use super::SnapshotStore;
use crate::error::CommandError;

#[derive(Debug, Clone, Default)]
pub struct BtrfsCommand {
    pub use_sudo: bool,
}

impl BtrfsCommand {
    pub fn new(use_sudo: bool) -> Self {
        BtrfsCommand { use_sudo }
    }

    fn command(&self, args: &[&str], volume_path: &Path) -> Command {
        let mut cmd = if self.use_sudo {
            let mut c = Command::new("sudo");
            c.arg("btrfs");
            c
        } else {
            Command::new("btrfs")
        };
        cmd.args(args).arg(volume_path);
        cmd
    }

    fn run(&self, args: &[&str], volume_path: &Path) -> Result<String, CommandError> {
        let rendered = render(self.use_sudo, args, volume_path);
        debug!(command = %rendered, "running btrfs");

        let program = if self.use_sudo { "sudo" } else { "btrfs" };
        let output = self
            .command(args, volume_path)
            .output()
            .map_err(|source| CommandError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(CommandError::Failed {
                command: rendered,
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl SnapshotStore for BtrfsCommand {
    fn list_snapshots(&self, volume_path: &Path) -> Result<Vec<ListedSnapshot>, CommandError> {
        let stdout = self.run(&["subvolume", "list", "-s"], volume_path)?;
        Ok(report::parse_list(&stdout)?)
    }

    fn describe_snapshot(&self, id: u64, volume_path: &Path) -> Result<Report, CommandError> {
        let id = id.to_string();
        let stdout = self.run(&["subvolume", "show", "-r", &id], volume_path)?;
        Ok(Report::parse(&stdout))
    }

    fn delete_snapshot(&self, id: u64, volume_path: &Path) -> Result<(), CommandError> {
        let id = id.to_string();
        self.run(&["subvolume", "delete", "-i", &id], volume_path)?;
        Ok(())
    }
}

fn render(use_sudo: bool, args: &[&str], volume_path: &Path) -> String {
    let prefix = if use_sudo { "sudo btrfs" } else { "btrfs" };
    format!("{prefix} {} {}", args.join(" "), volume_path.display())
}

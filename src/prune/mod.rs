//! Pruning driver.
//!
//! Runs in two phases over every requested path:
//! - plan: list snapshots, group them by volume, describe and classify each
//!   volume that has a policy, then append the audit log
//! - apply: per volume and tier, print what would be (dry run) or is being
//!   deleted, deleting one snapshot at a time in live runs
//!
//! Failures stay local. A path that cannot be listed, a volume with an
//! unparsable report or a failed delete is recorded and the run moves on.
//! Nothing is retried.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, warn};

use crate::audit::AuditLog;
use crate::btrfs::report::ListedSnapshot;
use crate::btrfs::SnapshotStore;
use crate::config::{self, Config};
use crate::error::{codes, CommandError};
use crate::policy::RetentionPolicy;
use crate::report;
use crate::retention::{classify, Classification};
use crate::snapshot::{self, SnapshotRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PruneMode {
    DryRun,
    Execute,
}

impl PruneMode {
    pub fn from_config(config: &Config) -> Self {
        if config.dry_run {
            PruneMode::DryRun
        } else {
            PruneMode::Execute
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tier {
    Day2Day,
    LongTerm,
}

impl Tier {
    pub fn label(self) -> &'static str {
        match self {
            Tier::Day2Day => "day2day",
            Tier::LongTerm => "long-term",
        }
    }
}

/// Classification of one volume under one path.
#[derive(Debug, Clone, Serialize)]
pub struct VolumePlan {
    pub volume: String,
    pub path: PathBuf,
    pub policy: RetentionPolicy,
    pub classification: Classification,
}

impl VolumePlan {
    pub fn tiers(&self) -> [(Tier, &[SnapshotRecord]); 2] {
        [
            (Tier::Day2Day, self.classification.delete_day2day.as_slice()),
            (Tier::LongTerm, self.classification.delete_long_term.as_slice()),
        ]
    }

    pub fn snapshot_count(&self) -> usize {
        self.classification.day_first.len() + self.classification.day_rest.len()
    }
}

#[derive(Debug, Default)]
pub struct PruneResult {
    pub plans: Vec<VolumePlan>,
    /// Volumes with no configured policy.
    pub skipped: Vec<String>,
    /// Snapshots whose name has no volume part.
    pub ungroupable: Vec<String>,
    /// Volumes left unclassified because a report could not be read.
    pub failed_volumes: Vec<String>,
    /// Paths that could not be listed.
    pub failed_paths: Vec<String>,
    pub deleted: Vec<String>,
    pub errors: Vec<String>,
    pub paths_total: usize,
}

impl PruneResult {
    pub fn planned(&self) -> usize {
        self.plans
            .iter()
            .map(|p| {
                p.classification.delete_day2day.len() + p.classification.delete_long_term.len()
            })
            .sum()
    }

    pub fn exit_code(&self) -> u8 {
        if self.paths_total > 0 && self.failed_paths.len() == self.paths_total {
            codes::INVENTORY_FAILED
        } else if !self.failed_paths.is_empty()
            || !self.failed_volumes.is_empty()
            || !self.errors.is_empty()
        {
            codes::PARTIAL_FAILURE
        } else {
            codes::SUCCESS
        }
    }
}

pub fn run<S: SnapshotStore + ?Sized>(
    store: &S,
    config: &Config,
    out: &mut dyn Write,
) -> io::Result<PruneResult> {
    let mode = PruneMode::from_config(config);
    // a path given twice would plan and delete every snapshot twice
    let paths = config::unique_paths(&config.paths);
    let mut result = PruneResult {
        paths_total: paths.len(),
        ..PruneResult::default()
    };

    for path in &paths {
        plan_path(store, config, path, &mut result);
    }

    // the audit trail must exist before anything is deleted
    if let Some(dir) = &config.log_dir {
        let mut log = AuditLog::open(dir)?;
        for plan in &result.plans {
            log.record(
                config.now,
                &plan.volume,
                config.dry_run,
                &plan.policy,
                &plan.classification,
            )?;
        }
        debug!(dir = %dir.display(), volumes = result.plans.len(), "audit log written");
    }

    let plans = std::mem::take(&mut result.plans);
    for plan in &plans {
        apply_plan(store, plan, mode, config.json_output, out, &mut result)?;
    }
    result.plans = plans;

    Ok(result)
}

fn plan_path<S: SnapshotStore + ?Sized>(
    store: &S,
    config: &Config,
    path: &Path,
    result: &mut PruneResult,
) {
    let listed = match store.list_snapshots(path) {
        Ok(listed) => listed,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to list snapshots");
            result.failed_paths.push(format!("{}: {e}", path.display()));
            return;
        }
    };

    for (volume, members) in group_by_volume(listed, result) {
        let Some(policy) = config.policies.policy_for(&volume) else {
            debug!(volume = %volume, "no policy configured, skipping");
            result.skipped.push(volume);
            continue;
        };

        match describe_all(store, path, &members) {
            Ok(records) => {
                let classification = classify(&records, &policy, config.now);
                result.plans.push(VolumePlan {
                    volume,
                    path: path.to_path_buf(),
                    policy,
                    classification,
                });
            }
            Err(e) => {
                warn!(
                    volume = %volume,
                    path = %path.display(),
                    error = %e,
                    "volume not classified"
                );
                result.failed_volumes.push(format!("{volume} ({}): {e}", path.display()));
            }
        }
    }
}

/// Group listed snapshots by volume name, dropping names that have none.
fn group_by_volume(
    listed: Vec<ListedSnapshot>,
    result: &mut PruneResult,
) -> BTreeMap<String, Vec<ListedSnapshot>> {
    let mut groups: BTreeMap<String, Vec<ListedSnapshot>> = BTreeMap::new();

    for entry in listed {
        let volume = entry.name().and_then(snapshot::volume_of).map(str::to_string);
        match volume {
            Some(volume) => groups.entry(volume).or_default().push(entry),
            None => {
                let name = entry.path.display().to_string();
                warn!(snapshot = %name, "cannot derive a volume from the name, excluded");
                result.ungroupable.push(name);
            }
        }
    }

    groups
}

fn describe_all<S: SnapshotStore + ?Sized>(
    store: &S,
    path: &Path,
    members: &[ListedSnapshot],
) -> Result<Vec<SnapshotRecord>, CommandError> {
    members
        .iter()
        .map(|entry| -> Result<SnapshotRecord, CommandError> {
            let report = store.describe_snapshot(entry.id, path)?;
            Ok(SnapshotRecord::from_report(&report)?)
        })
        .collect()
}

fn apply_plan<S: SnapshotStore + ?Sized>(
    store: &S,
    plan: &VolumePlan,
    mode: PruneMode,
    json_output: bool,
    out: &mut dyn Write,
    result: &mut PruneResult,
) -> io::Result<()> {
    if json_output {
        writeln!(out, "{}", report::json::render(plan)?)?;
    } else {
        write!(out, "{}", report::table::render_header(plan))?;
    }

    for (tier, records) in plan.tiers() {
        if !json_output {
            write!(out, "{}", report::table::render_tier(tier, records.len()))?;
        }

        for record in records {
            match mode {
                PruneMode::DryRun => {
                    let line = report::table::would_delete(record);
                    if !json_output {
                        writeln!(out, "{line}")?;
                    }
                    result.deleted.push(line);
                }
                PruneMode::Execute => {
                    let line = report::table::deleting(record);
                    if json_output {
                        // stdout carries only plan documents; announce on stderr
                        warn!(volume = %plan.volume, tier = tier.label(), "{}", line.trim());
                    } else {
                        writeln!(out, "{line}")?;
                        out.flush()?;
                    }

                    match store.delete_snapshot(record.subvolume_id, &plan.path) {
                        Ok(()) => result.deleted.push(line),
                        Err(e) => {
                            let msg = format!(
                                "failed to delete {} (id {}): {e}",
                                record.name, record.subvolume_id
                            );
                            warn!(volume = %plan.volume, "{msg}");
                            if !json_output {
                                writeln!(out, "  {msg}")?;
                            }
                            result.errors.push(msg);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

//! Plain-text plan output.
//!
//! Per volume a header with the policy and counts, then one block per tier:
//!
//! ```text
//! home (/mnt/pool): 14 snapshots, keeping 9
//!   policy: day2day 2d, first of day 5d, first of month 2m, first of year 10y
//! ----------------------------------------
//!   day2day (3):
//!     [dry-run] would delete: home.20240106-0100 (id 261, 2024-01-06 01:00:00 +0000)
//!   long-term (2):
//! ```

use crate::prune::{Tier, VolumePlan};
use crate::snapshot::{SnapshotRecord, CREATION_TIME_FORMAT};

pub fn render_header(plan: &VolumePlan) -> String {
    let policy = &plan.policy;
    let mut output = String::new();

    output.push_str(&format!(
        "\n{} ({}): {} snapshots, keeping {}\n",
        plan.volume,
        plan.path.display(),
        plan.snapshot_count(),
        plan.classification.kept().len()
    ));
    output.push_str(&format!(
        "  policy: day2day {}d, first of day {}d, first of month {}m, first of year {}y\n",
        policy.day2day, policy.first_of_day, policy.first_of_month, policy.first_of_year
    ));
    output.push_str(&"-".repeat(40));
    output.push('\n');

    output
}

pub fn render_tier(tier: Tier, count: usize) -> String {
    format!("  {} ({count}):\n", tier.label())
}

pub fn would_delete(record: &SnapshotRecord) -> String {
    format!("    [dry-run] would delete: {}", describe(record))
}

pub fn deleting(record: &SnapshotRecord) -> String {
    format!("    deleting: {}", describe(record))
}

fn describe(record: &SnapshotRecord) -> String {
    format!(
        "{} (id {}, {})",
        record.name,
        record.subvolume_id,
        record.creation_time.format(CREATION_TIME_FORMAT)
    )
}

//! JSON output for volume plans.
//!
//! One compact document per volume so the output can be piped line by line.

use serde::Serialize;

use crate::policy::RetentionPolicy;
use crate::prune::VolumePlan;
use crate::snapshot::SnapshotRecord;

#[derive(Serialize)]
struct PlanDocument<'a> {
    volume: &'a str,
    path: &'a std::path::Path,
    policy: &'a RetentionPolicy,
    kept: Vec<&'a SnapshotRecord>,
    delete_day2day: &'a [SnapshotRecord],
    delete_long_term: &'a [SnapshotRecord],
}

pub fn render(plan: &VolumePlan) -> serde_json::Result<String> {
    let doc = PlanDocument {
        volume: &plan.volume,
        path: &plan.path,
        policy: &plan.policy,
        kept: plan.classification.kept(),
        delete_day2day: &plan.classification.delete_day2day,
        delete_long_term: &plan.classification.delete_long_term,
    };

    serde_json::to_string(&doc)
}

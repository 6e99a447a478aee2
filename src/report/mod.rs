pub mod json;
pub mod table;

use crate::prune::PruneResult;

/// Closing summary of a run, including everything that went wrong.
pub fn summary(result: &PruneResult, dry_run: bool, verbose: bool) -> String {
    let mut output = String::new();

    output.push('\n');
    if dry_run {
        output.push_str(&format!(
            "would delete {} snapshots across {} volumes\n",
            result.planned(),
            result.plans.len()
        ));
    } else {
        output.push_str(&format!(
            "deleted {} of {} snapshots across {} volumes\n",
            result.deleted.len(),
            result.planned(),
            result.plans.len()
        ));
    }

    if !result.skipped.is_empty() {
        output.push_str(&format!(
            "skipped {} volumes without a policy",
            result.skipped.len()
        ));
        if verbose {
            output.push_str(&format!(": {}", result.skipped.join(", ")));
        }
        output.push('\n');
    }

    if verbose && !result.ungroupable.is_empty() {
        output.push_str(&format!(
            "ignored snapshots without a volume: {}\n",
            result.ungroupable.join(", ")
        ));
    }

    let problems: Vec<&String> = result
        .failed_paths
        .iter()
        .chain(&result.failed_volumes)
        .chain(&result.errors)
        .collect();
    if !problems.is_empty() {
        output.push_str("\nerrors encountered:\n");
        for problem in problems {
            output.push_str(&format!("  {problem}\n"));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_lists_errors_and_skips() {
        let result = PruneResult {
            skipped: vec!["var".into()],
            errors: vec!["failed to delete home.1 (id 1): nope".into()],
            ..PruneResult::default()
        };

        let text = summary(&result, false, true);
        assert!(text.contains("deleted 0 of 0 snapshots"));
        assert!(text.contains("skipped 1 volumes without a policy: var"));
        assert!(text.contains("errors encountered:\n  failed to delete home.1"));
    }

    #[test]
    fn dry_run_summary_wording() {
        let text = summary(&PruneResult::default(), true, false);
        assert!(text.contains("would delete 0 snapshots across 0 volumes"));
        assert!(!text.contains("errors"));
    }
}

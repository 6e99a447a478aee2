//! Grandfather-father-son classification of one volume's snapshots.
//!
//! Snapshots are sorted by creation time and bucketed by day, month and
//! year. The earliest snapshot of each bucket is that bucket's
//! representative. Then:
//! - non-representatives of a day are deleted once older than `day2day` days
//! - daily representatives are deleted unless they are recent enough for
//!   the day window, or are also a monthly/yearly representative inside the
//!   month/year window
//!
//! All comparisons against a window are strict. A snapshot created exactly
//! at a threshold is neither past due nor protected.

use std::collections::HashSet;

use chrono::{DateTime, Duration, FixedOffset, Months};
use serde::Serialize;

use crate::policy::RetentionPolicy;
use crate::retention::bucket::BucketKeys;
use crate::snapshot::SnapshotRecord;

/// Per-volume classification. Every set is in ascending creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub day_first: Vec<SnapshotRecord>,
    pub day_rest: Vec<SnapshotRecord>,
    pub month_first: Vec<SnapshotRecord>,
    pub year_first: Vec<SnapshotRecord>,
    pub delete_day2day: Vec<SnapshotRecord>,
    pub delete_long_term: Vec<SnapshotRecord>,
}

impl Classification {
    pub fn has_deletions(&self) -> bool {
        !self.delete_day2day.is_empty() || !self.delete_long_term.is_empty()
    }

    /// Snapshots that survive, ascending by creation time.
    pub fn kept(&self) -> Vec<&SnapshotRecord> {
        let deleted: HashSet<u64> = self
            .delete_day2day
            .iter()
            .chain(&self.delete_long_term)
            .map(|s| s.subvolume_id)
            .collect();

        let mut kept: Vec<&SnapshotRecord> = self
            .day_first
            .iter()
            .chain(&self.day_rest)
            .filter(|s| !deleted.contains(&s.subvolume_id))
            .collect();
        kept.sort_by_key(|s| (s.creation_time, s.subvolume_id));
        kept
    }
}

/// Cut-off instants derived from a policy and the run's `now`.
///
/// `None` means the window reaches past the representable calendar, so
/// nothing is past due and everything is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Thresholds {
    pub day2day: Option<DateTime<FixedOffset>>,
    pub first_of_day: Option<DateTime<FixedOffset>>,
    pub first_of_month: Option<DateTime<FixedOffset>>,
    pub first_of_year: Option<DateTime<FixedOffset>>,
}

impl Thresholds {
    pub fn new(policy: &RetentionPolicy, now: DateTime<FixedOffset>) -> Self {
        Thresholds {
            day2day: days_before(now, policy.day2day),
            first_of_day: days_before(now, policy.first_of_day),
            first_of_month: months_before(now, policy.first_of_month),
            first_of_year: policy
                .first_of_year
                .checked_mul(12)
                .and_then(|months| months_before(now, months)),
        }
    }
}

fn days_before(now: DateTime<FixedOffset>, days: u32) -> Option<DateTime<FixedOffset>> {
    now.checked_sub_signed(Duration::days(i64::from(days)))
}

// clamps to the last day of a shorter month, e.g. 03-31 minus one month is 02-29
fn months_before(now: DateTime<FixedOffset>, months: u32) -> Option<DateTime<FixedOffset>> {
    now.checked_sub_months(Months::new(months))
}

fn is_before(time: &DateTime<FixedOffset>, threshold: Option<DateTime<FixedOffset>>) -> bool {
    threshold.is_some_and(|t| *time < t)
}

fn is_after(time: &DateTime<FixedOffset>, threshold: Option<DateTime<FixedOffset>>) -> bool {
    threshold.map_or(true, |t| *time > t)
}

/// Split `sorted` into the first record per key and everything else.
///
/// Input must already be ascending; the first record seen for a key wins.
fn first_per_bucket<'a, F>(
    sorted: &[(&'a SnapshotRecord, BucketKeys)],
    key: F,
) -> (Vec<&'a SnapshotRecord>, Vec<&'a SnapshotRecord>)
where
    F: Fn(&BucketKeys) -> &str,
{
    let mut seen: HashSet<&str> = HashSet::new();
    let mut first = Vec::new();
    let mut rest = Vec::new();

    for (record, keys) in sorted {
        if seen.insert(key(keys)) {
            first.push(*record);
        } else {
            rest.push(*record);
        }
    }

    (first, rest)
}

fn ids(records: &[&SnapshotRecord]) -> HashSet<u64> {
    records.iter().map(|s| s.subvolume_id).collect()
}

fn owned(records: Vec<&SnapshotRecord>) -> Vec<SnapshotRecord> {
    records.into_iter().cloned().collect()
}

/// Classify one volume's snapshots against `policy` as of `now`.
///
/// Pure and total: same input, same output.
pub fn classify(
    snapshots: &[SnapshotRecord],
    policy: &RetentionPolicy,
    now: DateTime<FixedOffset>,
) -> Classification {
    let mut sorted: Vec<(&SnapshotRecord, BucketKeys)> =
        snapshots.iter().map(|s| (s, s.buckets())).collect();
    // ties on creation time fall back to the subvolume id so input order never matters
    sorted.sort_by_key(|(s, _)| (s.creation_time, s.subvolume_id));

    let (day_first, day_rest) = first_per_bucket(&sorted, |k| k.day.as_str());
    let (month_first, _) = first_per_bucket(&sorted, |k| k.month.as_str());
    let (year_first, _) = first_per_bucket(&sorted, |k| k.year.as_str());

    let thresholds = Thresholds::new(policy, now);

    let delete_day2day: Vec<&SnapshotRecord> = day_rest
        .iter()
        .copied()
        .filter(|s| is_before(&s.creation_time, thresholds.day2day))
        .collect();

    let protected_day: Vec<&SnapshotRecord> = day_first
        .iter()
        .copied()
        .filter(|s| is_after(&s.creation_time, thresholds.first_of_day))
        .collect();
    let protected_month: Vec<&SnapshotRecord> = month_first
        .iter()
        .copied()
        .filter(|s| is_after(&s.creation_time, thresholds.first_of_month))
        .collect();
    let protected_year: Vec<&SnapshotRecord> = year_first
        .iter()
        .copied()
        .filter(|s| is_after(&s.creation_time, thresholds.first_of_year))
        .collect();

    let mut protected = ids(&protected_day);
    protected.extend(ids(&protected_month));
    protected.extend(ids(&protected_year));

    let delete_long_term: Vec<&SnapshotRecord> = day_first
        .iter()
        .copied()
        .filter(|s| !protected.contains(&s.subvolume_id))
        .collect();

    Classification {
        day_first: owned(day_first),
        day_rest: owned(day_rest),
        month_first: owned(month_first),
        year_first: owned(year_first),
        delete_day2day: owned(delete_day2day),
        delete_long_term: owned(delete_long_term),
    }
}

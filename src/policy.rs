//! Per-volume retention policies.
//!
//! A policy is four windows:
//! - `day2day` (days): past this age, extra snapshots of the same day go
//! - `first_of_day` (days): daily representatives kept this long
//! - `first_of_month` (months): monthly representatives kept this long
//! - `first_of_year` (years): yearly representatives kept this long
//!
//! The payload is a map from volume name to policy, given as JSON or TOML.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetentionPolicy {
    #[serde(rename = "day2day", alias = "day_to_day")]
    pub day2day: u32,
    #[serde(rename = "firstOfDay", alias = "first_of_day")]
    pub first_of_day: u32,
    #[serde(rename = "firstOfMonth", alias = "first_of_month")]
    pub first_of_month: u32,
    #[serde(rename = "firstOfYear", alias = "first_of_year")]
    pub first_of_year: u32,
}

impl RetentionPolicy {
    pub const DEFAULT: RetentionPolicy = RetentionPolicy {
        day2day: 2,
        first_of_day: 5,
        first_of_month: 2,
        first_of_year: 10,
    };
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Configured policies keyed by volume name.
pub type PolicyMap = BTreeMap<String, RetentionPolicy>;

/// Look up a volume's policy, falling back to the default.
pub fn resolve(volume: &str, configured: &PolicyMap) -> RetentionPolicy {
    configured.get(volume).copied().unwrap_or_default()
}

/// The policies in effect for one run.
///
/// `None` means nothing was supplied, which is only allowed for dry runs.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    configured: Option<PolicyMap>,
}

impl PolicySet {
    pub fn configured(map: PolicyMap) -> Self {
        PolicySet {
            configured: Some(map),
        }
    }

    pub fn unconfigured() -> Self {
        PolicySet { configured: None }
    }

    pub fn is_configured(&self) -> bool {
        self.configured.is_some()
    }

    /// Policy to classify `volume` with, or `None` when the volume must be skipped.
    ///
    /// With a supplied payload only listed volumes are classified. Without one
    /// every volume gets the default.
    pub fn policy_for(&self, volume: &str) -> Option<RetentionPolicy> {
        match &self.configured {
            Some(map) if map.contains_key(volume) => Some(resolve(volume, map)),
            Some(_) => None,
            None => Some(RetentionPolicy::DEFAULT),
        }
    }
}

pub fn parse_json(payload: &str) -> Result<PolicyMap, ConfigError> {
    Ok(serde_json::from_str(payload)?)
}

pub fn parse_toml(payload: &str) -> Result<PolicyMap, ConfigError> {
    Ok(toml::from_str(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(
        day2day: u32,
        first_of_day: u32,
        first_of_month: u32,
        first_of_year: u32,
    ) -> RetentionPolicy {
        RetentionPolicy {
            day2day,
            first_of_day,
            first_of_month,
            first_of_year,
        }
    }

    #[test]
    fn default_policy_values() {
        assert_eq!(RetentionPolicy::default(), policy(2, 5, 2, 10));
    }

    #[test]
    fn resolve_returns_configured_entry() {
        let mut map = PolicyMap::new();
        map.insert("home".to_string(), policy(1, 7, 6, 3));
        assert_eq!(resolve("home", &map), policy(1, 7, 6, 3));
    }

    #[test]
    fn resolve_falls_back_to_default() {
        let map = PolicyMap::new();
        assert_eq!(resolve("var", &map), RetentionPolicy::DEFAULT);
    }

    #[test]
    fn configured_set_skips_unlisted_volumes() {
        let mut map = PolicyMap::new();
        map.insert("home".to_string(), policy(1, 7, 6, 3));
        let set = PolicySet::configured(map);

        assert_eq!(set.policy_for("home"), Some(policy(1, 7, 6, 3)));
        assert_eq!(set.policy_for("var"), None);
    }

    #[test]
    fn unconfigured_set_uses_default_everywhere() {
        let set = PolicySet::unconfigured();
        assert!(!set.is_configured());
        assert_eq!(set.policy_for("anything"), Some(RetentionPolicy::DEFAULT));
    }

    #[test]
    fn parses_camel_case_json() {
        let map = parse_json(
            r#"{"home": {"day2day": 3, "firstOfDay": 7, "firstOfMonth": 4, "firstOfYear": 2}}"#,
        )
        .unwrap();
        assert_eq!(map["home"], policy(3, 7, 4, 2));
    }

    #[test]
    fn parses_snake_case_toml() {
        let map = parse_toml(
            "[root]\nday2day = 1\nfirst_of_day = 3\nfirst_of_month = 12\nfirst_of_year = 5\n",
        )
        .unwrap();
        assert_eq!(map["root"], policy(1, 3, 12, 5));
    }

    #[test]
    fn rejects_missing_and_unknown_fields() {
        assert!(parse_json(r#"{"home": {"day2day": 3}}"#).is_err());
        assert!(parse_json(
            r#"{"home": {"day2day": 3, "firstOfDay": 7, "firstOfMonth": 4, "firstOfYear": 2, "keep": 1}}"#
        )
        .is_err());
    }

    #[test]
    fn rejects_negative_windows() {
        assert!(parse_json(
            r#"{"home": {"day2day": -1, "firstOfDay": 7, "firstOfMonth": 4, "firstOfYear": 2}}"#
        )
        .is_err());
    }
}

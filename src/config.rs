use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, Local};
use tracing::debug;

use crate::audit;
use crate::cli::Cli;
use crate::error::ConfigError;
use crate::policy::{self, PolicySet};

pub struct Config {
    pub paths: Vec<PathBuf>,
    pub dry_run: bool,
    pub verbose: bool,
    pub use_sudo: bool,
    pub json_output: bool,
    /// Audit log directory; `None` disables the audit log.
    pub log_dir: Option<PathBuf>,
    pub policies: PolicySet,
    /// Captured once; every volume of the run is measured against it.
    pub now: DateTime<FixedOffset>,
}

impl Config {
    pub fn from_args(args: &Cli) -> Result<Self, ConfigError> {
        let fallback = default_policy_file();
        let policies = load_policies(
            args.config.as_deref(),
            args.config_file.as_deref(),
            fallback.as_deref(),
            args.dry_run,
        )?;

        let log_dir = if args.verbose {
            args.log_dir.clone().or_else(audit::default_dir)
        } else {
            None
        };

        Ok(Config {
            paths: unique_paths(&args.paths),
            dry_run: args.dry_run,
            verbose: args.verbose,
            use_sudo: args.sudo,
            json_output: args.json,
            log_dir,
            policies,
            now: args.now.unwrap_or_else(|| Local::now().fixed_offset()),
        })
    }
}

/// Drop repeated paths, keeping the first occurrence of each.
pub fn unique_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for path in paths {
        if seen.insert(path.as_path()) {
            unique.push(path.clone());
        }
    }
    unique
}

/// `~/.config/snapprune/policies.toml` or the platform equivalent.
pub fn default_policy_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "snapprune")
        .map(|dirs| dirs.config_dir().join("policies.toml"))
}

/// Pick the policy source for the run and enforce the safety gate.
///
/// Precedence: inline payload, explicit file, then `fallback` if it exists.
/// Without any of them only a dry run may proceed.
pub fn load_policies(
    inline: Option<&str>,
    file: Option<&Path>,
    fallback: Option<&Path>,
    dry_run: bool,
) -> Result<PolicySet, ConfigError> {
    if let Some(payload) = inline {
        return Ok(PolicySet::configured(policy::parse_json(payload)?));
    }

    if let Some(path) = file {
        return load_file(path).map(PolicySet::configured);
    }

    if let Some(path) = fallback.filter(|p| p.is_file()) {
        debug!(path = %path.display(), "using default policy file");
        return load_file(path).map(PolicySet::configured);
    }

    if dry_run {
        Ok(PolicySet::unconfigured())
    } else {
        Err(ConfigError::MissingPolicy)
    }
}

fn load_file(path: &Path) -> Result<policy::PolicyMap, ConfigError> {
    let payload = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => policy::parse_toml(&payload),
        _ => policy::parse_json(&payload),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RetentionPolicy;

    #[test]
    fn repeated_paths_collapse_in_order() {
        let paths = [
            PathBuf::from("/mnt/b"),
            PathBuf::from("/mnt/a"),
            PathBuf::from("/mnt/b"),
        ];
        assert_eq!(
            unique_paths(&paths),
            vec![PathBuf::from("/mnt/b"), PathBuf::from("/mnt/a")]
        );
    }

    #[test]
    fn no_policy_refused_for_live_run() {
        let err = load_policies(None, None, None, false).unwrap_err();
        assert!(matches!(err, ConfigError::MissingPolicy));
    }

    #[test]
    fn no_policy_allowed_for_dry_run() {
        let set = load_policies(None, None, None, true).unwrap();
        assert!(!set.is_configured());
        assert_eq!(set.policy_for("home"), Some(RetentionPolicy::DEFAULT));
    }

    #[test]
    fn inline_payload_wins() {
        let set = load_policies(
            Some(r#"{"home": {"day2day": 1, "firstOfDay": 2, "firstOfMonth": 3, "firstOfYear": 4}}"#),
            Some(Path::new("/nonexistent.toml")),
            None,
            false,
        )
        .unwrap();
        assert_eq!(set.policy_for("home").map(|p| p.first_of_year), Some(4));
        assert_eq!(set.policy_for("var"), None);
    }

    #[test]
    fn loads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.toml");
        fs::write(
            &path,
            "[home]\nday2day = 1\nfirstOfDay = 7\nfirstOfMonth = 6\nfirstOfYear = 3\n",
        )
        .unwrap();

        let set = load_policies(None, Some(&path), None, false).unwrap();
        assert_eq!(set.policy_for("home").map(|p| p.first_of_day), Some(7));
    }

    #[test]
    fn loads_json_file_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies");
        fs::write(
            &path,
            r#"{"root": {"day2day": 2, "firstOfDay": 5, "firstOfMonth": 2, "firstOfYear": 10}}"#,
        )
        .unwrap();

        let set = load_policies(None, Some(&path), None, false).unwrap();
        assert_eq!(set.policy_for("root"), Some(RetentionPolicy::DEFAULT));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let missing = Path::new("/nonexistent/p.toml");
        let err = load_policies(None, Some(missing), None, true).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn fallback_used_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("policies.toml");

        let err = load_policies(None, None, Some(&path), false).unwrap_err();
        assert!(matches!(err, ConfigError::MissingPolicy));

        fs::write(
            &path,
            "[home]\nday2day = 1\nfirstOfDay = 7\nfirstOfMonth = 6\nfirstOfYear = 3\n",
        )
        .unwrap();
        let set = load_policies(None, None, Some(&path), false).unwrap();
        assert!(set.is_configured());
    }

    #[test]
    fn invalid_payload_is_reported() {
        let err = load_policies(Some("not json"), None, None, true).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }
}

//! Error types and exit codes.
//!
//! Classification itself never fails. Everything here lives at the edges:
//! - parsing what the btrfs tool reports
//! - running the btrfs tool
//! - loading and gating the policy configuration

use std::path::PathBuf;

/// Process exit codes.
pub mod codes {
    pub const SUCCESS: u8 = 0;
    pub const CONFIG_ERROR: u8 = 1;
    // 2 is left to clap for usage errors
    pub const INVENTORY_FAILED: u8 = 3;
    pub const PARTIAL_FAILURE: u8 = 4;
}

/// A report or listing from the btrfs tool that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReportError {
    #[error("report is missing field '{0}'")]
    MissingField(&'static str),

    #[error("invalid creation time '{value}': {reason}")]
    InvalidCreationTime { value: String, reason: String },

    #[error("invalid subvolume id '{0}'")]
    InvalidSubvolumeId(String),

    #[error("malformed subvolume list line: '{0}'")]
    MalformedListLine(String),
}

/// Failure to run a btrfs (or sudo) command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error(transparent)]
    Report(#[from] ReportError),
}

/// Problems with the policy configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no retention policy supplied; pass --config or --config-file, or use --dry-run to preview with defaults")]
    MissingPolicy,

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON policy payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML policy payload: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConfigError {
    pub fn exit_code(&self) -> u8 {
        codes::CONFIG_ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_policy_message_names_both_flags() {
        let msg = ConfigError::MissingPolicy.to_string();
        assert!(msg.contains("--config"));
        assert!(msg.contains("--dry-run"));
        assert_eq!(ConfigError::MissingPolicy.exit_code(), codes::CONFIG_ERROR);
    }

    #[test]
    fn report_error_converts_into_command_error() {
        let err: CommandError = ReportError::MissingField("Name").into();
        assert_eq!(err.to_string(), "report is missing field 'Name'");
    }
}

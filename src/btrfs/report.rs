//! Parsers for btrfs tool output.
//!
//! `btrfs subvolume show` prints tab-separated lines. The first non-blank
//! token of a line is the key, the rest are its values:
//!
//! ```text
//! home.20240109
//! 	Name: 			home.20240109
//! 	Creation time: 		2024-01-09 08:00:00 +0000
//! 	Subvolume ID: 		259
//! ```
//!
//! `btrfs subvolume list -s` prints one snapshot per line:
//!
//! ```text
//! ID 259 gen 41 cgen 41 top level 5 otime 2024-01-09 08:00:00 path .snapshots/home.20240109
//! ```

use std::path::PathBuf;

use crate::error::ReportError;

/// Key/value report from `btrfs subvolume show`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    fields: Vec<(String, Vec<String>)>,
}

impl Report {
    pub fn parse(output: &str) -> Self {
        let fields = output
            .lines()
            .filter_map(|line| {
                let mut tokens = line
                    .split('\t')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string);
                let key = tokens.next()?;
                Some((key, tokens.collect()))
            })
            .collect();

        Report { fields }
    }

    /// Values for `key`; the first occurrence wins.
    pub fn values(&self, key: &str) -> Option<&[String]> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// Joined value for `key`, failing when the key is absent or has no value.
    pub fn require(&self, key: &'static str) -> Result<String, ReportError> {
        match self.values(key) {
            Some(values) if !values.is_empty() => Ok(values.join(" ")),
            _ => Err(ReportError::MissingField(key)),
        }
    }
}

/// A snapshot as listed by `btrfs subvolume list -s`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedSnapshot {
    pub id: u64,
    pub path: PathBuf,
}

impl ListedSnapshot {
    /// File name of the listed path, which is the snapshot name.
    pub fn name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }
}

pub fn parse_list(output: &str) -> Result<Vec<ListedSnapshot>, ReportError> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_list_line)
        .collect()
}

fn parse_list_line(line: &str) -> Result<ListedSnapshot, ReportError> {
    let malformed = || ReportError::MalformedListLine(line.to_string());

    let rest = line.trim_start().strip_prefix("ID ").ok_or_else(malformed)?;
    let (id_str, _) = rest.split_once(' ').ok_or_else(malformed)?;
    let id = id_str
        .parse::<u64>()
        .map_err(|_| ReportError::InvalidSubvolumeId(id_str.to_string()))?;

    // paths may contain spaces, so take everything after the marker
    let (_, path) = line.split_once(" path ").ok_or_else(malformed)?;
    if path.is_empty() {
        return Err(malformed());
    }

    Ok(ListedSnapshot {
        id,
        path: PathBuf::from(path),
    })
}

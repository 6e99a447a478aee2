pub mod audit;
pub mod btrfs;
pub mod cli;
pub mod config;
pub mod error;
pub mod platform;
pub mod policy;
pub mod prune;
pub mod report;
pub mod retention;
pub mod snapshot;

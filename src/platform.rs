use std::process::Command;

/// True when `program --version` runs and exits successfully.
fn runs(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

pub fn btrfs_available() -> bool {
    runs("btrfs")
}

pub fn sudo_available() -> bool {
    runs("sudo")
}

/// Name of the first tool the run needs but cannot find.
pub fn missing_tool(use_sudo: bool) -> Option<&'static str> {
    if use_sudo && !sudo_available() {
        return Some("sudo");
    }
    // under sudo, btrfs may only be on root's PATH
    if !use_sudo && !btrfs_available() {
        return Some("btrfs");
    }
    None
}

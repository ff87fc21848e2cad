//! Run-identity and environment-fingerprint helpers for audit logging.
use std::collections::BTreeMap;
use std::process::Command;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use uuid::Uuid;

/// `ISO8601_timestamp__random_suffix`, e.g.
/// `2026-07-26T12:00:00.000Z__a1b2c3d4`.
pub fn generate_run_id() -> String {
    let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let suffix = &Uuid::new_v4().simple().to_string()[..8];
    format!("{timestamp}__{suffix}")
}

/// Current UTC time as an RFC3339 timestamp with millisecond precision.
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Short git commit SHA (7 chars) if run inside a git checkout with `git`
/// on `PATH`, `None` otherwise.
pub fn get_git_sha() -> Option<String> {
    let output = Command::new("git").args(["rev-parse", "HEAD"]).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let sha = String::from_utf8(output.stdout).ok()?;
    let sha = sha.trim();
    if sha.is_empty() {
        None
    } else {
        Some(sha.chars().take(7).collect())
    }
}

/// `env!("CARGO_PKG_VERSION")` of the calling crate, to be passed in by the
/// root binary rather than resolved here (this crate has no privileged view
/// of the workspace root's own package metadata).
pub fn package_version(crate_version: &str) -> String {
    crate_version.to_string()
}

/// `{os}-{arch}`, e.g. `linux-x86_64`.
pub fn platform_info() -> String {
    format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH)
}

/// Resolves versions for a caller-supplied set of dependency names, each
/// paired with its known version string (there is no runtime package
/// registry to query, unlike `importlib.metadata`).
pub fn dependency_versions(known: &[(&str, &str)]) -> BTreeMap<String, String> {
    known.iter().map(|(name, version)| (name.to_string(), version.to_string())).collect()
}

/// `transform_version` field: prefer the git SHA, fall back to the package
/// version.
pub fn transform_version(crate_version: &str) -> String {
    match get_git_sha() {
        Some(sha) => format!("git:{sha}"),
        None => package_version(crate_version),
    }
}

pub fn duration_seconds(duration: Duration) -> f64 {
    duration.as_secs_f64()
}

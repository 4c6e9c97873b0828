use std::env;
use std::process::Command;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

const UNKNOWN: &str = "unknown";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=VWRCAP_COMMIT");
    println!("cargo:rerun-if-env-changed=GITHUB_SHA");

    // An explicit commit takes precedence over git.
    let commit = ["VWRCAP_COMMIT", "GITHUB_SHA"]
        .iter()
        .find_map(|name| env::var(name).ok().filter(|sha| !sha.trim().is_empty()))
        .or_else(|| git(&["rev-parse", "HEAD"]));
    let short: Option<String> = commit.as_ref().map(|sha| sha.chars().take(7).collect());

    let built = git(&["log", "-1", "--format=%cI"])
        .or_else(|| OffsetDateTime::now_utc().format(&Rfc3339).ok());

    emit("VWRCAP_BUILD_COMMIT", short.as_deref());
    emit("VWRCAP_BUILD_COMMIT_FULL", commit.as_deref());
    emit("VWRCAP_BUILD_DATE", built.as_deref());
}

fn emit(key: &str, value: Option<&str>) {
    println!("cargo:rustc-env={key}={}", value.unwrap_or(UNKNOWN));
}

fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!value.is_empty()).then_some(value)
}

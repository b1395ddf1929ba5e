use std::{
    process::Command,
    time::{SystemTime, UNIX_EPOCH},
};

const PRODUCTION_API_URL: &str = "https://storagewebappbackend-production.up.railway.app";
const DEVELOPMENT_API_URL: &str = "http://localhost:8080";

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-env-changed=PHOTOSHELF_BUILD_API_URL");
    println!("cargo:rerun-if-env-changed=PROFILE");

    // Release builds talk to production unless overridden at build time.
    let api_url = match std::env::var("PHOTOSHELF_BUILD_API_URL") {
        Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
        _ => {
            let profile = std::env::var("PROFILE").unwrap_or_default();
            if profile == "release" {
                PRODUCTION_API_URL.to_string()
            } else {
                DEVELOPMENT_API_URL.to_string()
            }
        }
    };
    println!("cargo:rustc-env=PHOTOSHELF_DEFAULT_API_URL={}", api_url);

    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--dirty"])
        .output();

    let version = match output {
        Ok(o) if o.status.success() => {
            let git_output = String::from_utf8(o.stdout)
                .unwrap_or_default()
                .trim()
                .to_string();

            // Strip 'v' prefix if present (e.g., "v1.0.0" -> "1.0.0")
            let version = git_output.strip_prefix('v').unwrap_or(&git_output);

            if version.ends_with("-dirty") || version.is_empty() {
                format!("{}-{}", version, timestamp())
            } else {
                version.to_string()
            }
        }
        _ => format!("0.0.0-unknown-{}", timestamp()),
    };

    println!("cargo:rustc-env=PHOTOSHELF_VERSION={}", version);
}

fn timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

use std::env;
use std::process::Command;

fn report_build_profile() {
    println!(
        "cargo:rustc-env=BUILD_PROFILE={}",
        env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string())
    );
}

fn report_enabled_features() {
    let enabled_features: Vec<String> = env::vars()
        .filter_map(|(key, _)| {
            key.strip_prefix("CARGO_FEATURE_")
                .map(|feature| feature.to_lowercase())
        })
        .collect();

    let features = if enabled_features.is_empty() {
        "none".to_string()
    } else {
        enabled_features.join(",")
    };

    println!("cargo:rustc-env=BUILD_FEATURES={}", features);
}

fn git_output(args: &[&str]) -> Option<String> {
    match Command::new("git").args(args).output() {
        Ok(output) if output.status.success() => String::from_utf8(output.stdout)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

fn report_repository_version() {
    let version = match env::var("CI_BUILD_REF") {
        Ok(val) if !val.is_empty() => val,
        _ => git_output(&["describe", "--always", "--dirty", "--long", "--tags"])
            .or_else(|| git_output(&["rev-parse", "--short", "HEAD"]))
            .unwrap_or_else(|| {
                env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "unknown".to_string())
            }),
    };

    println!("cargo:rustc-env=REPO_VERSION={}", version);
}

fn report_build_timestamp() {
    let timestamp = chrono::Utc::now().to_rfc3339();
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", timestamp);
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.git/HEAD");

    report_build_profile();
    report_enabled_features();
    report_repository_version();
    report_build_timestamp();
}

//! Build script for the LLM Gateway
//!
//! Stamps the commit, compiler and build time into the binary. They are
//! reported by `GET /health` and logged at startup.

use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    let built_at = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_default();
    stamp("GATEWAY_BUILD_TIME", Some(built_at));

    // docs.rs builds have neither git history nor a stable rustc to query
    let docs_rs = std::env::var_os("DOCS_RS").is_some();
    let commit = if docs_rs {
        None
    } else {
        command_stdout("git", &["rev-parse", "--short=12", "HEAD"])
    };
    stamp("GATEWAY_GIT_COMMIT", commit);

    let rustc = std::env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());
    stamp("GATEWAY_RUSTC", command_stdout(&rustc, &["--version"]));

    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/heads/");
    println!("cargo:rerun-if-changed=build.rs");
}

fn stamp(key: &str, value: Option<String>) {
    let value = value.filter(|v| !v.is_empty()).unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env={}={}", key, value);
}

fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

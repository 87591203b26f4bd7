//! Host facts consulted by include conditions.
//!
//! Facts are captured once per invocation so that every condition in one
//! load sees the same view of the host. Filesystem conditions are the
//! exception: they stat the path at evaluation time.

use std::collections::HashMap;
use std::env;
use std::process::Command;

/// Snapshot of the host a document is being resolved for.
#[derive(Debug, Clone, Default)]
pub struct HostFacts {
    /// Operating system identifier, e.g. `linux`.
    pub os: String,
    /// Short host name.
    pub hostname: String,
    /// Process environment at capture time.
    pub env: HashMap<String, String>,
}

impl HostFacts {
    /// Detect facts for the current process.
    pub fn detect() -> Self {
        Self {
            os: env::consts::OS.to_string(),
            hostname: detect_hostname(),
            env: env::vars().collect(),
        }
    }

    /// Create facts with explicit values.
    pub fn new(os: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            hostname: hostname.into(),
            env: HashMap::new(),
        }
    }

    /// Add an environment variable.
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }
}

fn detect_hostname() -> String {
    if let Ok(name) = std::fs::read_to_string("/etc/hostname") {
        let name = name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    if let Ok(name) = env::var("HOSTNAME") {
        if !name.is_empty() {
            return name;
        }
    }
    Command::new("hostname")
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_default()
}

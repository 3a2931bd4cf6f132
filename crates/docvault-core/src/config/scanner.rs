//! Reconciliation scanner configuration.

use serde::{Deserialize, Serialize};

/// Controls the periodic scan and the shape of each walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Whether the periodic scan runs at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Seconds between scheduled scans.
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Upper bound for one walk, in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    /// Category given to files discovered at the root.
    #[serde(default = "default_category")]
    pub default_category: String,
    /// Directory names never descended into.
    #[serde(default = "default_skip_directories")]
    pub skip_directories: Vec<String>,
    /// Yield to the runtime after this many directory entries.
    #[serde(default = "default_yield_every")]
    pub yield_every: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            interval_seconds: default_interval(),
            timeout_seconds: default_timeout(),
            default_category: default_category(),
            skip_directories: default_skip_directories(),
            yield_every: default_yield_every(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_interval() -> u64 {
    300
}

fn default_timeout() -> u64 {
    600
}

fn default_category() -> String {
    "General".to_string()
}

fn default_skip_directories() -> Vec<String> {
    [".git", ".svn", ".hg", "node_modules", "__pycache__", ".venv"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_yield_every() -> usize {
    64
}

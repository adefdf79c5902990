//! Common test utilities for backlog integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't pollute
//! the user's `~/.local/share/backlog/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with isolated snapshot storage.
///
/// Each `TestEnv` creates two temporary directories:
/// - `workspace_dir`: Acts as the workspace the backlog belongs to
/// - `data_dir`: Holds the snapshot (via `BLG_DATA_DIR` env var)
///
/// The `blg()` method returns a `Command` that sets `BLG_DATA_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub workspace_dir: TempDir,
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with isolated directories.
    pub fn new() -> Self {
        Self {
            workspace_dir: TempDir::new().unwrap(),
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Get a Command for the blg binary with isolated data directory.
    pub fn blg(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_blg"));
        cmd.current_dir(self.workspace_dir.path());
        cmd.env("BLG_DATA_DIR", self.data_dir.path());
        cmd
    }

    /// Get the path to the workspace directory.
    pub fn path(&self) -> &std::path::Path {
        self.workspace_dir.path()
    }

    /// Add an entry, asserting success.
    pub fn add(&self, title: &str, score: &str, duration: &str) {
        self.blg()
            .args(["add", title, score, duration])
            .assert()
            .success();
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

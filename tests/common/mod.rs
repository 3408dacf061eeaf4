//! Common test utilities for git-pair integration tests.
//!
//! Provides `TestEnv` for isolated test environments that never touch the
//! user's real git config or `~/.config/git-pair/`.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
pub use tempfile::TempDir;

/// Roster used by most tests.
pub const ROSTER: &str = "\
pairs:
  gc: Grumpy Cat;grumpy.cat
  pp: Pinkie Pie;pinkie.pie
  rw: Robert A. Wallis;robert.wallis
  nm: No Mail
email:
  prefix: team
  domain: example.com
";

/// Whether a `git` executable is on PATH.
pub fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// A test environment with an isolated repository and git config.
///
/// Each `TestEnv` creates three temporary directories:
/// - `repo_dir`: the git repository (already `git init`ed)
/// - `home_dir`: `HOME`, holding the global git config file
/// - `config_dir`: git-pair's config directory (via `GIT_PAIR_CONFIG_DIR`)
///
/// Environment is set per command, so tests can run in parallel.
pub struct TestEnv {
    pub repo_dir: TempDir,
    pub home_dir: TempDir,
    pub config_dir: TempDir,
}

impl TestEnv {
    /// Create an environment with an initialized repository, or `None` when
    /// git is not installed.
    pub fn with_git() -> Option<Self> {
        if !git_available() {
            return None;
        }
        let env = Self::without_repo();
        env.git(&["init", "--quiet"]);
        Some(env)
    }

    /// Create an environment whose repo directory is a plain directory.
    pub fn without_repo() -> Self {
        Self {
            repo_dir: TempDir::new().unwrap(),
            home_dir: TempDir::new().unwrap(),
            config_dir: TempDir::new().unwrap(),
        }
    }

    /// Like [`TestEnv::with_git`], with [`ROSTER`] written to `.pairs`.
    pub fn with_roster() -> Option<Self> {
        let env = Self::with_git()?;
        env.write_roster(ROSTER);
        Some(env)
    }

    pub fn repo_path(&self) -> &Path {
        self.repo_dir.path()
    }

    pub fn global_config(&self) -> PathBuf {
        self.home_dir.path().join(".gitconfig")
    }

    /// Write the `.pairs` file at the repository root.
    pub fn write_roster(&self, text: &str) {
        self.write_file(".pairs", text);
    }

    /// Write a file relative to the repository root.
    pub fn write_file(&self, name: &str, text: &str) {
        std::fs::write(self.repo_path().join(name), text).unwrap();
    }

    /// Write git-pair's config.kdl.
    pub fn write_config(&self, kdl: &str) {
        std::fs::write(self.config_dir.path().join("config.kdl"), kdl).unwrap();
    }

    /// Get a Command for the git-pair binary in the repository.
    ///
    /// Git timeouts are raised so slow CI machines do not trip them.
    pub fn git_pair(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_git-pair"));
        cmd.current_dir(self.repo_path());
        cmd.env("HOME", self.home_dir.path());
        cmd.env("GIT_CONFIG_GLOBAL", self.global_config());
        cmd.env("GIT_CONFIG_NOSYSTEM", "1");
        cmd.env("GIT_PAIR_CONFIG_DIR", self.config_dir.path());
        cmd.env("GIT_PAIR_TIMEOUT_MS", "10000");
        cmd.env_remove("GIT_PAIR_REPO");
        cmd.env_remove("GIT_PAIR_LOG");
        cmd
    }

    /// Run git in the repository with the isolated config. Returns trimmed
    /// stdout on success, `None` on a non-zero exit.
    pub fn git(&self, args: &[&str]) -> Option<String> {
        let output = std::process::Command::new("git")
            .args(args)
            .current_dir(self.repo_path())
            .env("HOME", self.home_dir.path())
            .env("GIT_CONFIG_GLOBAL", self.global_config())
            .env("GIT_CONFIG_NOSYSTEM", "1")
            .output()
            .unwrap();
        output
            .status
            .success()
            .then(|| String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Test harness for running CLI commands with temporary databases
pub struct CliTestHarness {
    temp_dir: TempDir,
    db_path: PathBuf,
    calendar_dir: PathBuf,
}

impl CliTestHarness {
    /// Create a new test harness with a temporary database
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let calendar_dir = temp_dir.path().join("calendar");

        Self {
            temp_dir,
            db_path,
            calendar_dir,
        }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("anilog").expect("Failed to find anilog binary");

        // Run outside the repo so no anilog.toml is picked up
        cmd.current_dir(self.temp_dir.path());
        cmd.env("ANILOG_DATABASE_PATH", &self.db_path);
        cmd.env("ANILOG_CALENDAR_DIR", &self.calendar_dir);
        cmd.env("ANILOG_TIMEZONE", "UTC");
        cmd.env_remove("ANILOG_NO_CALENDAR");
        cmd.env_remove("RUST_LOG");

        cmd
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn calendar_dir(&self) -> &Path {
        &self.calendar_dir
    }

    /// Number of `.ics` files currently written
    pub fn calendar_files(&self) -> usize {
        std::fs::read_dir(&self.calendar_dir)
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }

    /// Adds a title and returns its id as printed by `add`.
    pub fn add_title(&self, args: &[&str]) -> String {
        let mut full = vec!["add"];
        full.extend_from_slice(args);
        let output = self.run_success(&full).get_output().stdout.clone();
        let stdout = String::from_utf8(output).expect("utf-8 output");
        stdout
            .lines()
            .find(|line| line.contains("ID: "))
            .and_then(|line| line.split_whitespace().last())
            .map(str::to_string)
            .expect("add prints the new id")
    }
}

/// Common test fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// A season that finished years ago
    pub fn finished_args() -> Vec<&'static str> {
        vec!["Cowboy Bebop", "--total", "26", "--first", "1998-04-03 18:00"]
    }

    /// A season that starts long after any test run
    pub fn far_future_args() -> Vec<&'static str> {
        vec!["Future Show", "--total", "12", "--first", "2099-01-03 22:00"]
    }

    /// RFC 3339 instant `days` from now, for titles that must be airing
    pub fn days_from_now(days: i64) -> String {
        (chrono::Utc::now() + chrono::Duration::days(days)).to_rfc3339()
    }
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    /// Predicate to check if output contains title table headers
    pub fn has_title_table_headers() -> impl Predicate<str> {
        predicate::str::contains("ID")
            .and(predicate::str::contains("Name"))
            .and(predicate::str::contains("State"))
            .and(predicate::str::contains("Progress"))
    }

    pub fn title_added_successfully() -> impl Predicate<str> {
        predicate::str::contains("✓").and(predicate::str::contains("Added title"))
    }

    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error").or(predicate::str::contains("error"))
    }
}

//! Fluent wrapper around assert_cmd::Command.

// Allow dead code since not every test binary uses every helper
#![allow(dead_code)]

use assert_cmd::Command;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Fluent wrapper around `assert_cmd::Command` for the `kasten` binary.
pub struct KastenCommand {
    args: Vec<String>,
    config_home: Option<PathBuf>,
    stdin: Option<String>,
}

impl KastenCommand {
    /// Creates a new command for the `kasten` binary.
    pub fn new() -> Self {
        Self {
            args: Vec::new(),
            config_home: None,
            stdin: None,
        }
    }

    /// Sets the `--dir` option to specify the vault directory.
    pub fn dir(mut self, path: &Path) -> Self {
        self.args.push("--dir".to_string());
        self.args.push(path.to_string_lossy().to_string());
        self
    }

    /// Points the config lookup at `path` instead of the user's config.
    pub fn config_home(mut self, path: &Path) -> Self {
        self.config_home = Some(path.to_path_buf());
        self
    }

    /// Feeds `input` to the command's stdin.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Adds arguments to the command.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.args
            .extend(args.into_iter().map(|s| s.as_ref().to_string()));
        self
    }

    /// Returns the current arguments (for testing).
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Runs the command and returns an Assert for making assertions.
    #[allow(deprecated)]
    pub fn assert(self) -> assert_cmd::assert::Assert {
        let mut cmd = Command::cargo_bin("kasten").expect("Failed to find kasten binary");
        cmd.args(&self.args);
        cmd.env_remove("RUST_LOG");
        if let Some(home) = &self.config_home {
            cmd.env("XDG_CONFIG_HOME", home);
        }
        if let Some(input) = self.stdin {
            cmd.write_stdin(input);
        }
        cmd.assert()
    }

    /// Runs the command, expects success, and returns stdout as a string.
    pub fn output_success(self) -> String {
        let output = self.assert().success().get_output().stdout.clone();
        String::from_utf8(output).expect("Output was not valid UTF-8")
    }

    /// Runs the command, expects success, and parses stdout as JSON.
    pub fn output_json<T: DeserializeOwned>(self) -> T {
        let output = self.output_success();
        serde_json::from_str(&output).expect("Failed to parse output as JSON")
    }

    // ===========================================
    // Command Shortcuts
    // ===========================================

    /// Configures for the `ls` command.
    pub fn ls(self) -> Self {
        self.args(["ls"])
    }

    /// Configures for the `search` command with a query.
    pub fn search(self, query: &str) -> Self {
        self.args(["search", query])
    }

    /// Configures for the `show` command.
    pub fn show(self, note: &str) -> Self {
        self.args(["show", note])
    }

    /// Configures for the `tags` command.
    pub fn tags(self) -> Self {
        self.args(["tags"])
    }

    /// Configures for the `due` command.
    pub fn due(self) -> Self {
        self.args(["due"])
    }

    // ===========================================
    // Format Options
    // ===========================================

    /// Adds `--format json` to the command.
    pub fn format_json(self) -> Self {
        self.args(["--format", "json"])
    }
}

impl Default for KastenCommand {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_command_runs_binary() {
        KastenCommand::new().args(["--help"]).assert().success();
    }

    #[test]
    fn test_command_with_dir() {
        let temp = TempDir::new().unwrap();
        let cmd = KastenCommand::new().dir(temp.path());
        let args = cmd.get_args();
        assert_eq!(args[0], "--dir");
        assert_eq!(args[1], temp.path().to_string_lossy());
    }

    #[test]
    fn test_command_shortcuts() {
        let cmd = KastenCommand::new().ls().format_json();
        let args = cmd.get_args();
        assert!(args.contains(&"ls".to_string()));
        assert!(args.contains(&"--format".to_string()));
        assert!(args.contains(&"json".to_string()));
    }
}

//! Test helpers for behavioral specifications.
//!
//! Provides a small DSL for running the rpk CLI in an isolated project.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Environment that would change what the CLI under test does
const SCRUBBED_ENV: &[&str] = &[
    "RPK_PROJECT_ROOT",
    "RPK_UPLOAD_DIR",
    "RPK_OUTPUT_DIR",
    "RPK_EXECUTABLE",
    "RPK_SCRIPT",
    "RPK_MAX_CONCURRENT_JOBS",
    "RUST_LOG",
    "COLOR",
];

/// Path to the rpk binary, preferring the llvm-cov target directory.
fn rpk_binary() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));

    let llvm_cov_path = manifest_dir.join("target/llvm-cov-target/debug/rpk");
    if llvm_cov_path.exists() {
        return llvm_cov_path;
    }
    let standard = manifest_dir.join("target/debug/rpk");
    if standard.exists() {
        return standard;
    }
    // Shared or relocated target directory: resolve next to the test binary
    assert_cmd::cargo::cargo_bin("rpk")
}

/// High-level CLI builder for fluent test assertions
pub struct CliBuilder {
    args: Vec<String>,
    dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            dir: None,
            envs: vec![("NO_COLOR".into(), "1".into())],
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn pwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.dir = Some(path.into());
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<Path>) -> Self {
        self.envs.push((
            key.to_string(),
            value.as_ref().to_string_lossy().to_string(),
        ));
        self
    }

    /// Build the command without running it
    pub fn command(self) -> Command {
        let mut cmd = Command::new(rpk_binary());
        cmd.args(&self.args);
        if let Some(dir) = self.dir {
            cmd.current_dir(dir);
        }
        for key in SCRUBBED_ENV {
            cmd.env_remove(key);
        }
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run and expect success (exit code 0)
    pub fn passes(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect exit with `code`
    pub fn exits(self, code: i32) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert_eq!(
            output.status.code(),
            Some(code),
            "unexpected exit status\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    /// Run and expect failure (non-zero exit code)
    pub fn fails(self) -> RunAssert {
        let output = self.command().output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

/// Create a CLI builder for rpk commands
pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// Result of a CLI run for chaining assertions
pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    /// Parse stdout as one JSON document.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout())
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}):\n{}", self.stdout()))
    }

    /// Assert stdout equals expected exactly (with diff on failure).
    pub fn stdout_eq(self, expected: &str) -> Self {
        similar_asserts::assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            stdout.contains(expected),
            "stdout does not contain '{}'\nstdout: {}",
            expected,
            stdout
        );
        self
    }

    pub fn stdout_lacks(self, unexpected: &str) -> Self {
        let stdout = self.stdout();
        assert!(
            !stdout.contains(unexpected),
            "stdout should not contain '{}'\nstdout: {}",
            unexpected,
            stdout
        );
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(
            stderr.contains(expected),
            "stderr does not contain '{}'\nstderr: {}",
            expected,
            stderr
        );
        self
    }
}

// =============================================================================
// Project
// =============================================================================

/// Stand-in for `plugin_repackaging.sh`.
///
/// LOCAL packages succeed and leave `work/<name>-<suffix>.difypkg`; MARKET
/// downloads report an error and exit 1; GITHUB downloads succeed without
/// producing anything.
pub const FAKE_TOOL: &str = r#"#!/usr/bin/env bash
suffix=offline
while getopts "p:s:" opt; do
  case "$opt" in
    p) echo "platform $OPTARG" ;;
    s) suffix="$OPTARG" ;;
  esac
done
shift $((OPTIND - 1))
mode="$1"
shift
case "$mode" in
  local)
    name="$(basename "$1" .difypkg)"
    echo "unziping $1"
    echo ""
    echo "repackaging $name"
    mkdir -p work
    echo packaged > "work/${name}-${suffix}.difypkg"
    echo "success"
    ;;
  market)
    echo "downloading $1/$2@$3"
    echo "error: plugin $1/$2 not found" >&2
    echo "still running"
    exit 1
    ;;
  github)
    echo "downloading $1 $2 $3"
    ;;
  *)
    echo "unknown mode $mode"
    exit 2
    ;;
esac
"#;

/// Temporary project directory with an isolated state directory.
pub struct Project {
    dir: tempfile::TempDir,
    state_dir: tempfile::TempDir,
}

impl Project {
    /// A project with the scripted tool installed as `plugin_repackaging.sh`
    pub fn with_tool() -> Self {
        let project = Self::empty();
        project.file("plugin_repackaging.sh", FAKE_TOOL);
        project
    }

    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            state_dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_path(&self) -> &Path {
        self.state_dir.path()
    }

    /// Write a file at the given path (parent directories created automatically)
    pub fn file(&self, path: impl AsRef<Path>, content: &str) {
        let full_path = self.dir.path().join(path.as_ref());
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full_path, content).unwrap();
    }

    /// Run rpk in this project's context
    pub fn rpk(&self) -> CliBuilder {
        cli()
            .pwd(self.path())
            .env("RPK_STATE_DIR", self.state_path())
    }

    /// Read the CLI log file (for debugging test failures)
    pub fn log(&self) -> String {
        std::fs::read_to_string(self.state_path().join("rpk.log"))
            .unwrap_or_else(|_| "(no log)".to_string())
    }
}

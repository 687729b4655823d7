//! Typed command execution.
//!
//! Every process scif spawns (file copies and `%appinstall` scripts) is
//! described by a struct implementing [`CommandArgs`] and run through
//! [`run_command`], which:
//!
//! - starts the child in its own process group
//! - registers its PID with [`ChildRegistry`] while it runs
//! - captures stdout/stderr
//! - skips execution entirely in dry-run mode

use crate::process_guard::{ChildRegistry, CommandProcessGroup};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};

static DRY_RUN: AtomicBool = AtomicBool::new(false);

/// Skip spawning processes from now on
pub fn enable_dry_run() {
    DRY_RUN.store(true, Ordering::SeqCst);
}

pub fn disable_dry_run() {
    DRY_RUN.store(false, Ordering::SeqCst);
}

pub fn is_dry_run() -> bool {
    DRY_RUN.load(Ordering::SeqCst)
}

/// A command with typed arguments.
///
/// # Contract
///
/// - `program()` is resolved through `PATH` unless absolute.
/// - `to_cli_args()` returns the arguments exactly as passed to the program.
/// - `get_env_vars()` is added on top of the inherited environment.
pub trait CommandArgs {
    fn program(&self) -> &Path;

    fn to_cli_args(&self) -> Vec<String>;

    fn get_env_vars(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    /// Working directory, inherited when `None`
    fn working_dir(&self) -> Option<&Path> {
        None
    }

    /// Short label used in logs and errors
    fn describe(&self) -> String {
        format!("{} {}", self.program().display(), self.to_cli_args().join(" "))
    }
}

/// `cp [-R] <src> <dest>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyArgs {
    pub src: PathBuf,
    pub dest: PathBuf,
    /// Copy directories recursively
    pub recursive: bool,
}

impl CopyArgs {
    /// Copy `src` to `dest`, recursive when `src` is a directory
    pub fn new(src: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        let src = src.into();
        Self {
            recursive: src.is_dir(),
            src,
            dest: dest.into(),
        }
    }
}

impl CommandArgs for CopyArgs {
    fn program(&self) -> &Path {
        Path::new("cp")
    }

    fn to_cli_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(3);
        if self.recursive {
            args.push("-R".to_string());
        }
        args.push(self.src.display().to_string());
        args.push(self.dest.display().to_string());
        args
    }
}

/// `<shell> -c <script>` run from a working directory with extra env
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellScriptArgs {
    pub shell: PathBuf,
    pub script: String,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
}

impl CommandArgs for ShellScriptArgs {
    fn program(&self) -> &Path {
        &self.shell
    }

    fn to_cli_args(&self) -> Vec<String> {
        vec!["-c".to_string(), self.script.clone()]
    }

    fn get_env_vars(&self) -> Vec<(String, String)> {
        self.env.clone()
    }

    fn working_dir(&self) -> Option<&Path> {
        Some(&self.cwd)
    }

    fn describe(&self) -> String {
        format!("{} -c <{} line script>", self.shell.display(), self.script.lines().count())
    }
}

/// Output of a finished (or skipped) command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` if terminated by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
    /// Execution was skipped
    pub dry_run: bool,
}

impl CommandOutput {
    fn skipped(label: &str) -> Self {
        Self {
            stdout: format!("[DRY RUN] Skipped: {}\n", label),
            stderr: String::new(),
            exit_code: Some(0),
            success: true,
            dry_run: true,
        }
    }

    /// Error out if the command did not exit successfully
    pub fn ensure_success(&self, context: &str) -> Result<()> {
        if self.success {
            Ok(())
        } else {
            anyhow::bail!(
                "{} failed (exit code {}): {}",
                context,
                self.exit_code.unwrap_or(-1),
                self.stderr.trim()
            )
        }
    }
}

/// Run a typed command to completion.
///
/// A non-zero exit is reported through `CommandOutput::success`, not as an
/// `Err`; only spawn/wait failures are errors.
pub fn run_command<T: CommandArgs>(args: &T) -> Result<CommandOutput> {
    let label = args.describe();

    if is_dry_run() {
        tracing::info!("[DRY RUN] would run: {}", label);
        return Ok(CommandOutput::skipped(&label));
    }

    let cli_args = args.to_cli_args();
    let env_vars = args.get_env_vars();
    tracing::debug!("run_command: {} args={:?}", args.program().display(), cli_args);

    let mut cmd = Command::new(args.program());
    cmd.args(&cli_args)
        .envs(env_vars)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .in_new_process_group();
    if let Some(dir) = args.working_dir() {
        cmd.current_dir(dir);
    }

    let child = cmd
        .spawn()
        .with_context(|| format!("Failed to spawn {}", label))?;
    let pid = child.id();

    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.register(pid);
    }
    let output = child.wait_with_output();
    if let Ok(mut registry) = ChildRegistry::global().lock() {
        registry.unregister(pid);
    }
    let output = output.with_context(|| format!("Failed waiting for {}", label))?;

    let result = CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code(),
        success: output.status.success(),
        dry_run: false,
    };

    if result.success {
        tracing::debug!("{} finished", label);
    } else {
        tracing::warn!(
            "{} exited with code {}",
            label,
            result.exit_code.unwrap_or(-1)
        );
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_args_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("a.txt");
        std::fs::write(&src, "x").unwrap();

        let args = CopyArgs::new(&src, "/tmp/dest");
        assert!(!args.recursive);
        assert_eq!(
            args.to_cli_args(),
            vec![src.display().to_string(), "/tmp/dest".to_string()]
        );
        assert_eq!(args.program(), Path::new("cp"));
    }

    #[test]
    fn test_copy_args_directory_is_recursive() {
        let dir = TempDir::new().unwrap();
        let args = CopyArgs::new(dir.path(), "/tmp/dest");
        assert!(args.recursive);
        assert_eq!(args.to_cli_args()[0], "-R");
    }

    #[test]
    fn test_shell_script_args() {
        let args = ShellScriptArgs {
            shell: PathBuf::from("/bin/sh"),
            script: "echo one\necho two".to_string(),
            cwd: PathBuf::from("/tmp"),
            env: vec![("SCIF_APPNAME".to_string(), "foo".to_string())],
        };
        assert_eq!(args.to_cli_args(), vec!["-c", "echo one\necho two"]);
        assert_eq!(args.working_dir(), Some(Path::new("/tmp")));
        assert_eq!(args.get_env_vars().len(), 1);
        assert_eq!(args.describe(), "/bin/sh -c <2 line script>");
    }

    #[test]
    fn test_run_command_captures_output_and_env() {
        let dir = TempDir::new().unwrap();
        let args = ShellScriptArgs {
            shell: PathBuf::from("/bin/sh"),
            script: "echo \"$SCIF_APPNAME\"; pwd".to_string(),
            cwd: dir.path().to_path_buf(),
            env: vec![("SCIF_APPNAME".to_string(), "foo".to_string())],
        };
        let output = run_command(&args).unwrap();
        assert!(output.success);
        assert!(!output.dry_run);
        let mut lines = output.stdout.lines();
        assert_eq!(lines.next(), Some("foo"));
        let cwd = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(lines.next(), Some(cwd.to_str().unwrap()));
    }

    #[test]
    fn test_run_command_failure_is_reported() {
        let args = ShellScriptArgs {
            shell: PathBuf::from("/bin/sh"),
            script: "echo boom >&2; exit 3".to_string(),
            cwd: std::env::temp_dir(),
            env: Vec::new(),
        };
        let output = run_command(&args).unwrap();
        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        let err = output.ensure_success("appinstall foo").unwrap_err();
        assert!(err.to_string().contains("exit code 3"));
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_run_command_missing_program() {
        let args = ShellScriptArgs {
            shell: PathBuf::from("/nonexistent/shell"),
            script: "true".to_string(),
            cwd: std::env::temp_dir(),
            env: Vec::new(),
        };
        assert!(run_command(&args).is_err());
    }

    #[test]
    fn test_skipped_output() {
        let output = CommandOutput::skipped("cp a b");
        assert!(output.dry_run);
        assert!(output.success);
        assert!(output.stdout.contains("cp a b"));
        assert!(output.ensure_success("copy").is_ok());
    }
}

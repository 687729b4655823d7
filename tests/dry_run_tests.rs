//! Tests for dry-run mode
//!
//! Dry-run is a process-wide switch, so it lives in its own test binary.
//! Everything that writes into the tree still happens; spawned commands
//! (install scripts, file copies) are skipped.

use scif::{
    disable_dry_run, enable_dry_run, is_dry_run, run_command, Installer, Recipe, ScifConfig,
    ShellScriptArgs,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_dry_run_skips_commands_but_writes_metadata() {
    let dir = TempDir::new().unwrap();
    let marker = dir.path().join("marker");
    let recipe = format!(
        "%appinstall app\n    touch {}\n%appfiles app\n    /nonexistent/file\n%apprun app\n    run\n",
        marker.display()
    );
    let installer = Installer::new(
        Recipe::parse_str(&recipe).unwrap(),
        ScifConfig::with_base(dir.path().join("scif")),
    );

    enable_dry_run();
    assert!(is_dry_run());

    let output = run_command(&ShellScriptArgs {
        shell: PathBuf::from("/bin/sh"),
        script: "exit 1".to_string(),
        cwd: dir.path().to_path_buf(),
        env: Vec::new(),
    })
    .unwrap();
    assert!(output.dry_run);
    assert!(output.success);
    assert!(output.stdout.contains("[DRY RUN]"));

    // Missing copy source does not fail because cp never runs
    let reports = installer.install(None).unwrap();

    disable_dry_run();
    assert!(!is_dry_run());

    assert!(!marker.exists(), "install script must not run in dry-run");
    let settings = installer.config().app_settings("app");
    assert!(settings.apprun.is_file());
    assert!(settings.apprecipe.is_file());
    assert_eq!(reports[0].files, vec![settings.approot.clone()]);
    assert!(fs::read_dir(&settings.appbin).unwrap().next().is_none());
}

//! scif library
//!
//! Installs the apps of a recipe into a scientific filesystem tree.

pub mod cli;
pub mod command_runner;
pub mod error;
pub mod installer;
pub mod process_guard;
pub mod recipe;
pub mod settings;
pub mod types;

// Re-export main types for convenience
pub use command_runner::{
    disable_dry_run, enable_dry_run, is_dry_run, run_command, CommandArgs, CommandOutput,
    CopyArgs, ShellScriptArgs,
};
pub use error::{Result, ScifError};
pub use installer::{AppReport, Installer};
pub use process_guard::{ChildRegistry, CommandProcessGroup, ProcessGuard};
pub use recipe::{get_parts, AppConfig, Recipe};
pub use settings::{AppSettings, ScifConfig};
pub use types::Section;

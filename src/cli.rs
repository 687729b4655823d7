use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// scif - install recipe-defined apps into a scientific filesystem
#[derive(Parser)]
#[command(name = "scif")]
#[command(about = "Install apps described by a recipe into a filesystem tree")]
#[command(version)]
pub struct Cli {
    /// Dry-run mode: create directories and metadata but do not run
    /// install commands or copy files.
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Base of the filesystem tree (default: $SCIF_BASE or /scif)
    #[arg(long, global = true)]
    pub base: Option<PathBuf>,

    /// Root of app data directories (default: $SCIF_DATA or <base>/data)
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install all apps of a recipe, or only the named ones
    Install {
        /// Recipe file (SCIF text, or JSON when it ends in .json)
        recipe: PathBuf,

        /// App to install (repeatable)
        #[arg(short, long = "app")]
        apps: Vec<String>,
    },
    /// List the apps defined in a recipe
    Apps {
        recipe: PathBuf,
    },
    /// Parse and validate a recipe
    Validate {
        recipe: PathBuf,
    },
    /// Show the install locations of one app as JSON
    Inspect {
        recipe: PathBuf,
        app: String,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["scif"]).is_err());
    }

    #[test]
    fn test_cli_install_all() {
        let cli = Cli::try_parse_from(["scif", "install", "recipe.scif"]).unwrap();
        assert!(!cli.dry_run);
        match cli.command {
            Commands::Install { recipe, apps } => {
                assert_eq!(recipe, PathBuf::from("recipe.scif"));
                assert!(apps.is_empty());
            }
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_install_named_apps() {
        let cli = Cli::try_parse_from([
            "scif", "install", "recipe.scif", "--app", "foo", "-a", "bar",
        ])
        .unwrap();
        match cli.command {
            Commands::Install { apps, .. } => assert_eq!(apps, vec!["foo", "bar"]),
            _ => panic!("Expected Install command"),
        }
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "scif", "install", "r.scif", "--dry-run", "--base", "/tmp/scif", "--data", "/data",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert_eq!(cli.base, Some(PathBuf::from("/tmp/scif")));
        assert_eq!(cli.data, Some(PathBuf::from("/data")));
    }

    #[test]
    fn test_cli_inspect() {
        let cli = Cli::try_parse_from(["scif", "inspect", "r.scif", "foo"]).unwrap();
        match cli.command {
            Commands::Inspect { app, .. } => assert_eq!(app, "foo"),
            _ => panic!("Expected Inspect command"),
        }
    }

    #[test]
    fn test_cli_validate_requires_recipe() {
        assert!(Cli::try_parse_from(["scif", "validate"]).is_err());
    }
}

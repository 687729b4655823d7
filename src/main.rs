//! scif - Main entry point
//!
//! Loads a recipe and installs its apps into the filesystem tree.

use anyhow::Context;
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use scif::cli::{Cli, Commands};
use scif::{process_guard, Installer, ProcessGuard, Recipe, ScifConfig, ScifError};

/// Initialize the logger; `RUST_LOG` overrides the default `info` level
fn init_logger() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logger();

    if let Err(e) = process_guard::init_signal_handlers() {
        tracing::warn!("Failed to initialize signal handlers: {}", e);
    }
    let guard = ProcessGuard::new();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    let result = run(cli);
    drop(guard);

    if let Err(e) = result {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if cli.dry_run {
        info!("Dry-run mode: commands will be logged, not executed");
        scif::enable_dry_run();
    }

    let config = ScifConfig::resolve(cli.base.as_deref(), cli.data.as_deref());
    debug!("Using base {:?}, data {:?}", config.base, config.data);

    match cli.command {
        Commands::Install { recipe, apps } => {
            let recipe = load_recipe(&recipe)?;
            let installer = Installer::new(recipe, config);
            let apps = (!apps.is_empty()).then_some(apps);
            let reports = installer.install(apps.as_deref())?;
            info!(
                "Installed {} app(s) to {}",
                reports.len(),
                installer.config().base.display()
            );
        }
        Commands::Apps { recipe } => {
            let recipe = load_recipe(&recipe)?;
            for app in recipe.apps() {
                println!("{}", app);
            }
        }
        Commands::Validate { recipe: path } => {
            let recipe = load_recipe(&path)?;
            println!(
                "✓ Recipe {} is valid ({} app(s))",
                path.display(),
                recipe.apps().len()
            );
        }
        Commands::Inspect { recipe, app } => {
            let recipe = load_recipe(&recipe)?;
            if !recipe.contains(&app) {
                return Err(ScifError::UnknownApp(app).into());
            }
            let settings = config.app_settings(&app);
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
    }

    Ok(())
}

fn load_recipe(path: &Path) -> anyhow::Result<Recipe> {
    info!("Loading recipe {}", path.display());
    let recipe = Recipe::load_from_file(path)
        .with_context(|| format!("Failed to load recipe {}", path.display()))?;
    recipe
        .validate()
        .with_context(|| format!("Invalid recipe {}", path.display()))?;
    if recipe.is_empty() {
        tracing::warn!("Recipe {} defines no apps", path.display());
    }
    Ok(recipe)
}

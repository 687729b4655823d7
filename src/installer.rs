//! Installer module
//!
//! Installs the apps of a recipe into the filesystem tree described by a
//! `ScifConfig`. The base folders are created first, then each app in turn:
//! its directories, metadata files, install commands and copied files.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::command_runner::{run_command, CopyArgs, ShellScriptArgs};
use crate::error::{Result, ScifError};
use crate::recipe::{get_parts, validate_app_name, AppConfig, Recipe};
use crate::settings::{AppSettings, ScifConfig};
use crate::types::Section;

/// What was installed for one app
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppReport {
    pub app: String,
    /// Sections that were acted on, in install order
    pub sections: Vec<Section>,
    pub labels: BTreeMap<String, String>,
    /// Destinations of `%appfiles` copies
    pub files: Vec<PathBuf>,
}

/// Installer instance
pub struct Installer {
    recipe: Recipe,
    config: ScifConfig,
}

impl Installer {
    /// Create a new installer instance
    pub fn new(recipe: Recipe, config: ScifConfig) -> Self {
        Self { recipe, config }
    }

    pub fn recipe(&self) -> &Recipe {
        &self.recipe
    }

    pub fn config(&self) -> &ScifConfig {
        &self.config
    }

    /// Install the base folders, then the requested apps (all when `None`)
    pub fn install(&self, apps: Option<&[String]>) -> Result<Vec<AppReport>> {
        self.check_apps(apps)?;
        self.install_base()?;
        self.install_apps(apps)
    }

    /// Create `<base>/apps` and the data root
    pub fn install_base(&self) -> Result<()> {
        for dir in [self.config.apps_dir(), self.config.data.clone()] {
            fs::create_dir_all(&dir)?;
        }
        tracing::debug!("Base ready at {:?}", self.config.base);
        Ok(())
    }

    /// Install apps in the given order, or every app in recipe order.
    ///
    /// All names are checked against the recipe before anything is
    /// installed.
    pub fn install_apps(&self, apps: Option<&[String]>) -> Result<Vec<AppReport>> {
        let names = self.check_apps(apps)?;

        let mut reports = Vec::with_capacity(names.len());
        for name in &names {
            reports.push(self.install_app(name)?);
        }
        Ok(reports)
    }

    /// Resolve the requested names, failing on names that are not valid
    /// directory names or not in the recipe
    fn check_apps(&self, apps: Option<&[String]>) -> Result<Vec<String>> {
        let names: Vec<String> = match apps {
            Some(apps) => apps.to_vec(),
            None => self.recipe.apps().into_iter().map(String::from).collect(),
        };

        for name in &names {
            validate_app_name(name)?;
            if !self.recipe.contains(name) {
                tracing::error!("Cannot find app {} in config.", name);
                return Err(ScifError::UnknownApp(name.clone()));
            }
        }
        Ok(names)
    }

    /// Run every install step for one app
    pub fn install_app(&self, app: &str) -> Result<AppReport> {
        let config = self
            .recipe
            .app(app)
            .ok_or_else(|| ScifError::UnknownApp(app.to_string()))?;

        let settings = self.init_app(app)?;
        let mut report = AppReport {
            app: app.to_string(),
            ..Default::default()
        };

        if self.install_runscript(&settings, config)? {
            report.sections.push(Section::AppRun);
        }
        if self.install_environment(&settings, config)? {
            report.sections.push(Section::AppEnv);
        }
        if config.has(Section::AppLabels) {
            report.labels = self.install_labels(&settings, config)?;
            report.sections.push(Section::AppLabels);
        }
        if self.install_help(&settings, config)? {
            report.sections.push(Section::AppHelp);
        }
        if self.install_test(&settings, config)? {
            report.sections.push(Section::AppTest);
        }
        if self.install_commands(&settings, config)? {
            report.sections.push(Section::AppInstall);
        }
        if config.has(Section::AppFiles) {
            report.files = self.install_files(&settings, config)?;
            report.sections.push(Section::AppFiles);
        }
        self.install_recipe(&settings, config)?;

        tracing::info!("Installed app {}", app);
        Ok(report)
    }

    /// Create the app's metadata, bin, lib and data directories
    pub fn init_app(&self, app: &str) -> Result<AppSettings> {
        validate_app_name(app)?;
        let settings = self.config.app_settings(app);
        for dir in settings.directories() {
            fs::create_dir_all(dir)?;
        }
        Ok(settings)
    }

    /// Write `%apprun` to the runscript. Returns whether it was written.
    pub fn install_runscript(&self, settings: &AppSettings, config: &AppConfig) -> Result<bool> {
        let Some(lines) = config.section(Section::AppRun) else {
            return Ok(false);
        };
        log_step(Section::AppRun, &config.name);
        write_lines(&settings.apprun, lines)?;
        make_executable(&settings.apprun)?;
        Ok(true)
    }

    /// Write `%appenv` to the environment script
    pub fn install_environment(&self, settings: &AppSettings, config: &AppConfig) -> Result<bool> {
        let Some(lines) = config.section(Section::AppEnv) else {
            return Ok(false);
        };
        log_step(Section::AppEnv, &config.name);
        write_lines(&settings.appenv, lines)?;
        Ok(true)
    }

    /// Parse `%applabels` into key/value pairs and write them as JSON
    pub fn install_labels(
        &self,
        settings: &AppSettings,
        config: &AppConfig,
    ) -> Result<BTreeMap<String, String>> {
        let mut lookup = BTreeMap::new();
        let Some(lines) = config.section(Section::AppLabels) else {
            return Ok(lookup);
        };
        log_step(Section::AppLabels, &config.name);
        for line in lines.iter().filter(|l| !l.trim().is_empty()) {
            let (label, value) = get_parts(line, "");
            lookup.insert(label, value);
        }
        fs::write(&settings.applabels, serde_json::to_string_pretty(&lookup)?)?;
        Ok(lookup)
    }

    /// Write `%apphelp` next to the runscript
    pub fn install_help(&self, settings: &AppSettings, config: &AppConfig) -> Result<bool> {
        let Some(lines) = config.section(Section::AppHelp) else {
            return Ok(false);
        };
        log_step(Section::AppHelp, &config.name);
        write_lines(&settings.apphelp, lines)?;
        Ok(true)
    }

    /// Write `%apptest` as an executable test script
    pub fn install_test(&self, settings: &AppSettings, config: &AppConfig) -> Result<bool> {
        let Some(lines) = config.section(Section::AppTest) else {
            return Ok(false);
        };
        log_step(Section::AppTest, &config.name);
        write_lines(&settings.apptest, lines)?;
        make_executable(&settings.apptest)?;
        Ok(true)
    }

    /// Run `%appinstall` as one shell script from the app root
    pub fn install_commands(&self, settings: &AppSettings, config: &AppConfig) -> Result<bool> {
        let Some(lines) = config.section(Section::AppInstall) else {
            return Ok(false);
        };
        log_step(Section::AppInstall, &config.name);

        let args = ShellScriptArgs {
            shell: self.config.shell.clone(),
            script: lines.join("\n"),
            cwd: settings.approot.clone(),
            env: settings.to_env_vars(),
        };
        let output = run_command(&args)?;
        if !output.stdout.is_empty() {
            tracing::info!("{}", output.stdout.trim_end());
        }
        output.ensure_success(&format!("appinstall {}", config.name))?;
        Ok(true)
    }

    /// Copy each `%appfiles` source to its destination (the app root by
    /// default). Returns the destinations.
    pub fn install_files(&self, settings: &AppSettings, config: &AppConfig) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        let Some(lines) = config.section(Section::AppFiles) else {
            return Ok(files);
        };
        log_step(Section::AppFiles, &config.name);

        let default_dest = settings.approot.display().to_string();
        for line in lines {
            let (src, dest) = get_parts(line, &default_dest);
            let dest = settings.approot.join(dest);

            let args = CopyArgs::new(src, &dest);
            run_command(&args)?.ensure_success(&format!("appfiles {}", config.name))?;
            files.push(dest);
        }
        Ok(files)
    }

    /// Write the app's own sections back out as a recipe. Returns the text.
    pub fn install_recipe(&self, settings: &AppSettings, config: &AppConfig) -> Result<String> {
        let recipe = render_app_recipe(config);
        fs::write(&settings.apprecipe, &recipe)?;
        Ok(recipe)
    }
}

/// Render an app's sections as `%section app` blocks in section order
pub fn render_app_recipe(config: &AppConfig) -> String {
    let mut recipe = String::new();
    for (section, lines) in &config.sections {
        recipe.push_str(&section.header(&config.name));
        recipe.push('\n');
        recipe.push_str(&lines.join("\n"));
        recipe.push('\n');
    }
    recipe
}

fn log_step(section: Section, app: &str) {
    tracing::info!("+ {:<10} {}", section.to_string(), app);
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content)?;
    Ok(())
}

fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

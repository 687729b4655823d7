//! Recipe loading and validation.
//!
//! A recipe describes one or more apps. Two on-disk forms are accepted:
//!
//! - SCIF text, where `%<section> <app>` headers open a block of lines:
//!
//!   ```text
//!   %appinstall hello
//!       echo "hello" > bin/hello
//!   %apprun hello
//!       exec cat $SCIF_APPBIN/hello
//!   ```
//!
//! - JSON, `{"apps": {"<app>": {"<section>": ["line", ...]}}}`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, ScifError};
use crate::types::Section;

/// Configuration for one app: its name and the section contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub sections: BTreeMap<Section, Vec<String>>,
}

impl AppConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: BTreeMap::new(),
        }
    }

    /// Lines of a section, if the recipe defines it for this app
    pub fn section(&self, section: Section) -> Option<&[String]> {
        self.sections.get(&section).map(Vec::as_slice)
    }

    pub fn has(&self, section: Section) -> bool {
        self.sections.contains_key(&section)
    }

    /// Append lines to a section, creating it if needed
    pub fn push_lines<I, S>(&mut self, section: Section, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sections
            .entry(section)
            .or_default()
            .extend(lines.into_iter().map(Into::into));
    }
}

/// A parsed recipe, apps kept in recipe order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipe {
    apps: Vec<AppConfig>,
}

/// On-disk JSON form
#[derive(Debug, Deserialize, Serialize)]
struct RecipeFile {
    #[serde(default)]
    apps: BTreeMap<String, BTreeMap<Section, Vec<String>>>,
}

impl Recipe {
    pub fn new(apps: Vec<AppConfig>) -> Self {
        Self { apps }
    }

    /// App names in recipe order
    pub fn apps(&self) -> Vec<&str> {
        self.apps.iter().map(|a| a.name.as_str()).collect()
    }

    /// Look up an app by name
    pub fn app(&self, name: &str) -> Option<&AppConfig> {
        self.apps.iter().find(|a| a.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.app(name).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    fn app_mut_or_insert(&mut self, name: &str) -> &mut AppConfig {
        let idx = match self.apps.iter().position(|a| a.name == name) {
            Some(idx) => idx,
            None => {
                self.apps.push(AppConfig::new(name));
                self.apps.len() - 1
            }
        };
        &mut self.apps[idx]
    }

    /// Load a recipe from a file, choosing the format by extension
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));

        let recipe = if is_json {
            Self::from_json_str(&content)?
        } else {
            Self::parse_str(&content)?
        };
        tracing::debug!("Loaded recipe {:?} with apps {:?}", path, recipe.apps());
        Ok(recipe)
    }

    /// Parse the JSON recipe form. Apps come out sorted by name.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: RecipeFile = serde_json::from_str(content)?;
        let apps = file
            .apps
            .into_iter()
            .map(|(name, sections)| AppConfig { name, sections })
            .collect();
        Ok(Self { apps })
    }

    /// Parse the SCIF text recipe form
    pub fn parse_str(content: &str) -> Result<Self> {
        let mut recipe = Recipe::default();
        let mut current: Option<(String, Section)> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end();
            let trimmed = line.trim_start();

            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('#') {
                if let Some((app, section)) = &current {
                    tracing::debug!(
                        "Dropping comment on line {} in %{} {}: {}",
                        line_no,
                        section,
                        app,
                        trimmed
                    );
                }
                continue;
            }

            if let Some(header) = trimmed.strip_prefix('%') {
                let mut parts = header.split_whitespace();
                let section_name = parts.next().unwrap_or_default();
                let section = Section::from_str(section_name).map_err(|_| {
                    ScifError::parse(line_no, format!("unknown section %{}", section_name))
                })?;
                let app = parts.next().ok_or_else(|| {
                    ScifError::parse(line_no, format!("%{} is missing an app name", section))
                })?;
                if parts.next().is_some() {
                    return Err(ScifError::parse(
                        line_no,
                        format!("%{} takes exactly one app name", section),
                    ));
                }

                // Register the section even when it ends up with no lines
                recipe
                    .app_mut_or_insert(app)
                    .sections
                    .entry(section)
                    .or_default();
                current = Some((app.to_string(), section));
                continue;
            }

            match &current {
                Some((app, section)) => {
                    recipe.app_mut_or_insert(app).push_lines(*section, [line]);
                }
                None => {
                    tracing::debug!("Ignoring line {} outside of any section", line_no);
                }
            }
        }

        Ok(recipe)
    }

    /// Validate app names and uniqueness
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for app in &self.apps {
            validate_app_name(&app.name)?;
            if !seen.insert(app.name.as_str()) {
                return Err(ScifError::validation(format!(
                    "App {} is defined more than once",
                    app.name
                )));
            }
        }
        Ok(())
    }
}

/// App names become directory names and env var suffixes
pub fn validate_app_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ScifError::validation("App name must not be empty"));
    }
    if name == "." || name == ".." {
        return Err(ScifError::validation(format!("Invalid app name {}", name)));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(ScifError::validation(format!(
            "App name {} can only contain letters, numbers, '-', '_' and '.'",
            name
        )));
    }
    Ok(())
}

/// Split a `KEY VALUE` or `KEY=VALUE` line into its two parts.
///
/// The split happens at the first `=` when it comes before any whitespace,
/// otherwise at the first run of whitespace. A missing or empty value is
/// replaced by `default`.
pub fn get_parts(line: &str, default: &str) -> (String, String) {
    let line = line.trim();
    let ws = line.find(char::is_whitespace);
    let eq = line.find('=');

    let (key, value) = match (eq, ws) {
        (Some(e), Some(w)) if e < w => (&line[..e], &line[e + 1..]),
        (Some(e), None) => (&line[..e], &line[e + 1..]),
        (_, Some(w)) => (&line[..w], &line[w..]),
        (None, None) => (line, ""),
    };

    let value = value.trim();
    let value = if value.is_empty() { default } else { value };
    (key.to_string(), value.to_string())
}

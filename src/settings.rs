//! Filesystem layout settings.
//!
//! `ScifConfig` holds the global locations (base, data, shell) and
//! `AppSettings` the per-app paths derived from them.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Default base of the filesystem tree
pub const DEFAULT_BASE: &str = "/scif";
/// Default shell for install commands
pub const DEFAULT_SHELL: &str = "/bin/sh";

/// Global install locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScifConfig {
    /// Root of the tree, apps live under `<base>/apps`
    pub base: PathBuf,
    /// Root of per-app data directories
    pub data: PathBuf,
    /// Shell used to run `%appinstall` scripts
    pub shell: PathBuf,
}

impl ScifConfig {
    /// Config rooted at `base` with default data dir and shell
    pub fn with_base<P: AsRef<Path>>(base: P) -> Self {
        let base = base.as_ref().to_path_buf();
        Self {
            data: base.join("data"),
            base,
            shell: PathBuf::from(DEFAULT_SHELL),
        }
    }

    /// Resolve locations from arguments and `SCIF_BASE`, `SCIF_DATA`,
    /// `SCIF_SHELL`. Explicit `base`/`data` win over the environment, which wins over
    /// the defaults
    pub fn resolve(base: Option<&Path>, data: Option<&Path>) -> Self {
        Self::resolve_with(base, data, |key| std::env::var(key).ok())
    }

    fn resolve_with<F>(base: Option<&Path>, data: Option<&Path>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = base
            .map(Path::to_path_buf)
            .or_else(|| env("SCIF_BASE").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BASE));
        let mut config = Self::with_base(base);
        if let Some(data) = data
            .map(Path::to_path_buf)
            .or_else(|| env("SCIF_DATA").map(PathBuf::from))
        {
            config.data = data;
        }
        if let Some(shell) = env("SCIF_SHELL") {
            config.shell = PathBuf::from(shell);
        }
        config
    }

    /// Override the data directory
    pub fn data_dir<P: AsRef<Path>>(mut self, data: P) -> Self {
        self.data = data.as_ref().to_path_buf();
        self
    }

    pub fn apps_dir(&self) -> PathBuf {
        self.base.join("apps")
    }

    /// Per-app settings for `app`
    pub fn app_settings(&self, app: &str) -> AppSettings {
        AppSettings::new(self, app)
    }
}

impl Default for ScifConfig {
    fn default() -> Self {
        Self::with_base(DEFAULT_BASE)
    }
}

/// Per-app paths inside the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppSettings {
    pub appname: String,
    pub approot: PathBuf,
    pub appbin: PathBuf,
    pub applib: PathBuf,
    pub appmeta: PathBuf,
    pub appdata: PathBuf,
    pub apprun: PathBuf,
    pub apphelp: PathBuf,
    pub apptest: PathBuf,
    pub appenv: PathBuf,
    pub applabels: PathBuf,
    pub apprecipe: PathBuf,
}

impl AppSettings {
    pub fn new(config: &ScifConfig, app: &str) -> Self {
        let approot = config.apps_dir().join(app);
        let appmeta = approot.join("scif");
        Self {
            appname: app.to_string(),
            appbin: approot.join("bin"),
            applib: approot.join("lib"),
            appdata: config.data.join(app),
            apprun: appmeta.join("runscript"),
            apphelp: appmeta.join("runscript.help"),
            apptest: appmeta.join("test.sh"),
            appenv: appmeta.join("environment.sh"),
            applabels: appmeta.join("labels.json"),
            apprecipe: appmeta.join(format!("{}.scif", app)),
            appmeta,
            approot,
        }
    }

    /// Directories created when the app is initialised
    pub fn directories(&self) -> [&Path; 4] {
        [
            self.appmeta.as_path(),
            self.appbin.as_path(),
            self.applib.as_path(),
            self.appdata.as_path(),
        ]
    }

    /// Settings as `(key, path)` pairs, keys lowercase
    pub fn pairs(&self) -> Vec<(&'static str, &Path)> {
        vec![
            ("approot", self.approot.as_path()),
            ("appbin", self.appbin.as_path()),
            ("applib", self.applib.as_path()),
            ("appmeta", self.appmeta.as_path()),
            ("appdata", self.appdata.as_path()),
            ("apprun", self.apprun.as_path()),
            ("apphelp", self.apphelp.as_path()),
            ("apptest", self.apptest.as_path()),
            ("appenv", self.appenv.as_path()),
            ("applabels", self.applabels.as_path()),
            ("apprecipe", self.apprecipe.as_path()),
        ]
    }

    /// Environment variables exported to install commands.
    ///
    /// Every path is exported twice: `SCIF_<KEY>_<app>` for cross-app
    /// lookups and `SCIF_<KEY>` for the active app.
    pub fn to_env_vars(&self) -> Vec<(String, String)> {
        let mut vars = vec![("SCIF_APPNAME".to_string(), self.appname.clone())];
        for (key, path) in self.pairs() {
            let key = key.to_uppercase();
            let value = path.display().to_string();
            vars.push((format!("SCIF_{}_{}", key, self.appname), value.clone()));
            vars.push((format!("SCIF_{}", key), value));
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = ScifConfig::default();
        assert_eq!(config.base, PathBuf::from("/scif"));
        assert_eq!(config.data, PathBuf::from("/scif/data"));
        assert_eq!(config.apps_dir(), PathBuf::from("/scif/apps"));
        assert_eq!(config.shell, PathBuf::from("/bin/sh"));
    }

    #[test]
    fn test_resolve_precedence() {
        let env = |key: &str| match key {
            "SCIF_BASE" => Some("/env/base".to_string()),
            "SCIF_SHELL" => Some("/bin/bash".to_string()),
            _ => None,
        };

        let config = ScifConfig::resolve_with(None, None, env);
        assert_eq!(config.base, PathBuf::from("/env/base"));
        assert_eq!(config.data, PathBuf::from("/env/base/data"));
        assert_eq!(config.shell, PathBuf::from("/bin/bash"));

        let config = ScifConfig::resolve_with(
            Some(Path::new("/cli/base")),
            Some(Path::new("/cli/data")),
            env,
        );
        assert_eq!(config.base, PathBuf::from("/cli/base"));
        assert_eq!(config.data, PathBuf::from("/cli/data"));

        let config = ScifConfig::resolve_with(None, None, |_| None);
        assert_eq!(config, ScifConfig::default());
    }

    #[test]
    fn test_app_settings_paths() {
        let settings = ScifConfig::with_base("/opt/scif").app_settings("foo");
        assert_eq!(settings.approot, PathBuf::from("/opt/scif/apps/foo"));
        assert_eq!(settings.appbin, PathBuf::from("/opt/scif/apps/foo/bin"));
        assert_eq!(settings.applib, PathBuf::from("/opt/scif/apps/foo/lib"));
        assert_eq!(settings.appmeta, PathBuf::from("/opt/scif/apps/foo/scif"));
        assert_eq!(settings.appdata, PathBuf::from("/opt/scif/data/foo"));
        assert_eq!(settings.apprun, PathBuf::from("/opt/scif/apps/foo/scif/runscript"));
        assert_eq!(
            settings.applabels,
            PathBuf::from("/opt/scif/apps/foo/scif/labels.json")
        );
        assert_eq!(
            settings.apprecipe,
            PathBuf::from("/opt/scif/apps/foo/scif/foo.scif")
        );
    }

    #[test]
    fn test_data_dir_override() {
        let settings = ScifConfig::with_base("/scif")
            .data_dir("/data")
            .app_settings("bar");
        assert_eq!(settings.appdata, PathBuf::from("/data/bar"));
        assert_eq!(settings.approot, PathBuf::from("/scif/apps/bar"));
    }

    #[test]
    fn test_to_env_vars() {
        let settings = ScifConfig::default().app_settings("foo");
        let vars = settings.to_env_vars();

        assert!(vars.contains(&("SCIF_APPNAME".to_string(), "foo".to_string())));
        assert!(vars.contains(&(
            "SCIF_APPROOT_foo".to_string(),
            "/scif/apps/foo".to_string()
        )));
        assert!(vars.contains(&("SCIF_APPBIN".to_string(), "/scif/apps/foo/bin".to_string())));
        assert!(vars.contains(&("SCIF_APPDATA_foo".to_string(), "/scif/data/foo".to_string())));
        assert_eq!(vars.len(), 1 + 2 * settings.pairs().len());
    }

    #[test]
    fn test_settings_serialize() {
        let settings = ScifConfig::default().app_settings("foo");
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["approot"], "/scif/apps/foo");
        assert_eq!(json["appname"], "foo");
    }
}

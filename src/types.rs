//! Type-safe recipe section names
//!
//! Each app in a recipe is described by a fixed set of `%app*` sections.
//! Using an enum instead of raw strings gives exhaustive matching and a
//! single place where section names are spelled.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// A per-app recipe section
///
/// Declaration order is the order sections are written back out to an
/// app's recipe file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Display, EnumString, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Section {
    /// Shell commands run from the app root at install time
    AppInstall,
    /// Runscript contents
    AppRun,
    /// Environment script sourced before the app runs
    AppEnv,
    /// `KEY VALUE` label pairs
    AppLabels,
    /// `SRC [DEST]` file pairs to copy into the app
    AppFiles,
    /// Help text for the runscript
    AppHelp,
    /// Test script
    AppTest,
}

impl Section {
    /// All sections in declaration order
    pub fn all() -> Vec<Section> {
        Section::iter().collect()
    }

    /// Recipe header for this section and app, e.g. `%apprun foo`
    pub fn header(&self, app: &str) -> String {
        format!("%{} {}", self, app)
    }
}

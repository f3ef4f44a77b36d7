//! Templates and localization files discovered in a content source.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A template found by a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateInfo {
    /// Unique template identity.
    pub identity: String,

    /// Display name.
    pub name: String,

    /// Short names used to invoke the template.
    #[serde(default)]
    pub short_names: Vec<String>,

    /// Group identity shared by related templates.
    #[serde(default)]
    pub group_identity: Option<String>,

    /// Free-form classification tags.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    /// Id of the generator that found the template.
    pub generator_id: Uuid,

    /// Mount point the template lives in.
    pub mount_point_uri: String,

    /// Path of the template's configuration file.
    pub config_path: PathBuf,
}

/// A localization file for a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizationLocator {
    /// Locale name, e.g. `de-DE`.
    pub locale: String,

    /// Identity of the localized template.
    pub identity: String,

    /// Mount point the file lives in.
    pub mount_point_uri: String,

    /// Path of the localization file.
    pub config_path: PathBuf,
}

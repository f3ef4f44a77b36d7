//! Components that ship with the engine.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use super::capability::{CapabilityId, ComponentInstance, Identified};
use super::kinds::{Generator, InstallerFactory};
use crate::error::Result;
use crate::mount::MountPoint;
use crate::scan::{LocalizationLocator, TemplateInfo};

const TEMPLATE_CONFIG_DIR: &str = ".template.config";
const TEMPLATE_CONFIG_FILE: &str = "template.json";
const LOCALIZE_DIR: &str = "localize";
const LOCALIZATION_PREFIX: &str = "templatestrings.";

/// Built-in components as (capability, instance) pairs.
pub fn builtin_components() -> Vec<(CapabilityId, ComponentInstance)> {
    [ConfigFileGenerator::instance(), FolderInstallerFactory::instance()]
        .iter()
        .flat_map(ComponentInstance::registrations)
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ShortNames {
    One(String),
    Many(Vec<String>),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateConfig {
    identity: String,
    name: String,
    #[serde(default)]
    short_name: Option<ShortNames>,
    #[serde(default)]
    group_identity: Option<String>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

/// Finds templates described by `.template.config/template.json` files
/// and their `localize/templatestrings.<locale>.json` siblings.
#[derive(Debug, Default)]
pub struct ConfigFileGenerator;

impl ConfigFileGenerator {
    /// Component id.
    pub const ID: Uuid = Uuid::from_u128(0x0c4f_1b6e_2d3a_4e5f_8a9b_0c1d_2e3f_4a5b);

    /// The generator as a component instance.
    pub fn instance() -> ComponentInstance {
        ComponentInstance::builder(Self::ID, "ConfigFileGenerator")
            .with::<dyn Generator>(Arc::new(Self))
            .build()
    }

    fn read_template(&self, mount: &dyn MountPoint, path: &Path) -> Result<TemplateInfo> {
        let config: TemplateConfig = serde_json::from_str(&mount.read_to_string(path)?)?;
        let short_names = match config.short_name {
            Some(ShortNames::One(name)) => vec![name],
            Some(ShortNames::Many(names)) => names,
            None => Vec::new(),
        };

        Ok(TemplateInfo {
            identity: config.identity,
            name: config.name,
            short_names,
            group_identity: config.group_identity,
            tags: config.tags,
            generator_id: Self::ID,
            mount_point_uri: mount.uri().to_string(),
            config_path: path.to_path_buf(),
        })
    }
}

impl Identified for ConfigFileGenerator {
    fn id(&self) -> Uuid {
        Self::ID
    }
}

impl Generator for ConfigFileGenerator {
    fn templates_and_localizations(
        &self,
        mount: &dyn MountPoint,
    ) -> Result<(Vec<TemplateInfo>, Vec<LocalizationLocator>)> {
        let mut templates = Vec::new();
        let mut localizations = Vec::new();

        let json_files = mount.enumerate_files(".json")?;
        let config_files = json_files.iter().filter(|path| {
            has_file_name(path, TEMPLATE_CONFIG_FILE) && parent_named(path, TEMPLATE_CONFIG_DIR)
        });

        for path in config_files {
            let template = match self.read_template(mount, path) {
                Ok(template) => template,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Skipping unreadable template");
                    continue;
                }
            };

            if let Some(config_dir) = path.parent() {
                let localize_dir = config_dir.join(LOCALIZE_DIR);
                for file in json_files
                    .iter()
                    .filter(|file| file.parent() == Some(localize_dir.as_path()))
                {
                    if let Some(locale) = locale_of(file) {
                        localizations.push(LocalizationLocator {
                            locale,
                            identity: template.identity.clone(),
                            mount_point_uri: mount.uri().to_string(),
                            config_path: file.clone(),
                        });
                    }
                }
            }

            templates.push(template);
        }

        Ok((templates, localizations))
    }
}

fn has_file_name(path: &Path, name: &str) -> bool {
    path.file_name()
        .is_some_and(|file| file.to_string_lossy().eq_ignore_ascii_case(name))
}

fn parent_named(path: &Path, name: &str) -> bool {
    path.parent()
        .and_then(Path::file_name)
        .is_some_and(|parent| parent.to_string_lossy().eq_ignore_ascii_case(name))
}

/// Locale of a `templatestrings.<locale>.json` file.
fn locale_of(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_string_lossy().to_string();
    let lower = file_name.to_ascii_lowercase();
    if !lower.starts_with(LOCALIZATION_PREFIX) || !lower.ends_with(".json") {
        return None;
    }
    let locale = file_name.get(LOCALIZATION_PREFIX.len()..file_name.len() - ".json".len())?;
    (!locale.is_empty()).then(|| locale.to_string())
}

/// Installs content from local folders.
#[derive(Debug, Default)]
pub struct FolderInstallerFactory;

impl FolderInstallerFactory {
    /// Component id.
    pub const ID: Uuid = Uuid::from_u128(0x7d2e_9a41_5b3c_4f60_9e8d_1a2b_3c4d_5e6f);

    /// The installer factory as a component instance.
    pub fn instance() -> ComponentInstance {
        ComponentInstance::builder(Self::ID, "FolderInstallerFactory")
            .with::<dyn InstallerFactory>(Arc::new(Self))
            .build()
    }
}

impl Identified for FolderInstallerFactory {
    fn id(&self) -> Uuid {
        Self::ID
    }
}

impl InstallerFactory for FolderInstallerFactory {
    fn name(&self) -> &str {
        "folder"
    }

    fn can_install(&self, location: &str) -> bool {
        Path::new(location).is_dir()
    }
}

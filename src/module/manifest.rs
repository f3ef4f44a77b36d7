//! Module manifests and the entry-point catalog.
//!
//! A module file is a JSON manifest describing the module's identity, the
//! modules it references, and the name of the registration function that
//! contributes its components:
//!
//! ```json
//! {
//!   "name": "Acme.Components",
//!   "version": "1.2.0.0",
//!   "culture": null,
//!   "public_key": "0024000004800000",
//!   "entry_point": "acme-components",
//!   "references": ["Acme.Core, Version=1.0.0.0"]
//! }
//! ```
//!
//! Registration functions live in a [`ModuleCatalog`]; loading a module
//! binds its `entry_point` to one of them.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use super::identity::{ModuleIdentity, ModuleVersion};
use crate::component::ComponentFactory;
use crate::error::{Result, ScaffolderError};

/// Registration function exported by a module.
pub type EntryPoint = fn() -> Vec<ComponentFactory>;

/// On-disk description of a module.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleManifest {
    /// Simple module name.
    pub name: String,

    /// Module version.
    #[serde(default)]
    pub version: Option<ModuleVersion>,

    /// Culture name, absent for neutral modules.
    #[serde(default)]
    pub culture: Option<String>,

    /// Strong-name public key, hex encoded.
    #[serde(default)]
    pub public_key: Option<String>,

    /// Name of the registration function in the [`ModuleCatalog`].
    pub entry_point: String,

    /// Identities of the modules this one depends on.
    #[serde(default)]
    pub references: Vec<String>,
}

impl ModuleManifest {
    /// Identity declared by the manifest.
    pub fn identity(&self) -> Result<ModuleIdentity> {
        let mut identity = ModuleIdentity::named(&self.name);
        identity.version = self.version;
        if let Some(culture) = &self.culture {
            identity = identity.with_culture(culture.as_str());
        }
        if let Some(key) = &self.public_key {
            let bytes = hex::decode(key).map_err(|e| ScaffolderError::InvalidIdentity {
                value: self.name.clone(),
                message: format!("public key is not valid hex: {}", e),
            })?;
            identity = identity.with_public_key(bytes);
        }
        Ok(identity)
    }

    /// Parsed reference identities.
    pub fn reference_identities(&self) -> Result<Vec<ModuleIdentity>> {
        self.references.iter().map(|r| r.parse()).collect()
    }
}

/// In-process table of module registration functions.
#[derive(Default)]
pub struct ModuleCatalog {
    entry_points: RwLock<HashMap<String, EntryPoint>>,
}

impl ModuleCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a registration function under `name`, replacing any
    /// previous one.
    pub fn register(&self, name: impl Into<String>, entry_point: EntryPoint) {
        self.entry_points
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), entry_point);
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(self, name: impl Into<String>, entry_point: EntryPoint) -> Self {
        self.register(name, entry_point);
        self
    }

    /// Look up a registration function.
    pub fn get(&self, name: &str) -> Option<EntryPoint> {
        self.entry_points
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
    }

    /// Number of registered entry points.
    pub fn len(&self) -> usize {
        self.entry_points
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_components() -> Vec<ComponentFactory> {
        Vec::new()
    }

    #[test]
    fn manifest_parses_minimal_document() {
        let manifest: ModuleManifest =
            serde_json::from_str(r#"{"name": "Acme", "entry_point": "acme"}"#).unwrap();

        assert!(manifest.version.is_none());
        assert!(manifest.references.is_empty());
        assert_eq!(manifest.identity().unwrap(), ModuleIdentity::named("Acme"));
    }

    #[test]
    fn manifest_identity_includes_all_fields() {
        let manifest: ModuleManifest = serde_json::from_str(
            r#"{
                "name": "Acme.Resources",
                "version": "1.2",
                "culture": "fr-FR",
                "public_key": "0a0b",
                "entry_point": "acme",
                "references": ["Acme.Core, Version=1.0.0.0"]
            }"#,
        )
        .unwrap();

        let identity = manifest.identity().unwrap();
        assert_eq!(identity.version, Some(ModuleVersion::new(1, 2, 0, 0)));
        assert_eq!(identity.culture.as_deref(), Some("fr-FR"));
        assert_eq!(identity.public_key, Some(vec![0x0a, 0x0b]));

        let references = manifest.reference_identities().unwrap();
        assert_eq!(references.len(), 1);
        assert_eq!(references[0].name, "Acme.Core");
    }

    #[test]
    fn manifest_rejects_bad_public_key() {
        let manifest: ModuleManifest = serde_json::from_str(
            r#"{"name": "Acme", "entry_point": "acme", "public_key": "zz"}"#,
        )
        .unwrap();
        assert!(manifest.identity().is_err());
    }

    #[test]
    fn catalog_registers_and_finds_entry_points() {
        let catalog = ModuleCatalog::new().with("acme", no_components);

        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("acme").is_some());
        assert!(catalog.get("other").is_none());
    }
}

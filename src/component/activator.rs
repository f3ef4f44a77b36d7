//! Constructing components from persisted type references.

use std::sync::Arc;

use tracing::debug;

use super::capability::{ComponentInstance, TypeReference};
use crate::error::{Result, ScaffolderError};
use crate::module::{ModuleIdentity, VersionResolver};

/// Builds components that are known by type reference but not yet
/// constructed in this process.
#[derive(Clone)]
pub struct ComponentActivator {
    resolver: Arc<VersionResolver>,
}

impl ComponentActivator {
    /// Create an activator that finds modules through `resolver`.
    pub fn new(resolver: Arc<VersionResolver>) -> Self {
        Self { resolver }
    }

    /// The resolver used to find modules.
    pub fn resolver(&self) -> &Arc<VersionResolver> {
        &self.resolver
    }

    /// Construct a fresh instance of the type named by `reference`.
    pub fn activate(&self, reference: &TypeReference) -> Result<ComponentInstance> {
        let module = reference
            .module
            .as_deref()
            .ok_or_else(|| ScaffolderError::Activation {
                type_reference: reference.to_string(),
                message: "type reference does not name a module".to_string(),
            })?;
        let identity: ModuleIdentity = module.parse()?;

        let loaded = self
            .resolver
            .resolve(&identity)
            .ok_or_else(|| ScaffolderError::ResolutionNotFound {
                identity: identity.to_string(),
            })?;

        let factory =
            loaded
                .factory(&reference.type_name)
                .ok_or_else(|| ScaffolderError::Activation {
                    type_reference: reference.to_string(),
                    message: format!(
                        "module {} does not export '{}'",
                        loaded.identity(),
                        reference.type_name
                    ),
                })?;

        debug!(type_reference = %reference, module = %loaded.identity(), "Activating component");
        Ok(loaded.instantiate(factory))
    }
}

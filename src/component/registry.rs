//! Capability registry.
//!
//! The [`CapabilityRegistry`] maps each capability to the components that
//! implement it, keyed by component id. A component is either
//! materialized (constructed in this process) or only known by its type
//! reference, read from the settings file. Known components are
//! constructed on first lookup, at most once per capability and id.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::OnceCell;
use tracing::{debug, warn};
use uuid::Uuid;

use super::activator::ComponentActivator;
use super::capability::{Capability, CapabilityId, ComponentInstance, TypeReference};
use crate::error::{Result, ScaffolderError};
use crate::host::{Diagnostics, EngineHost};
use crate::scan::ScanResult;
use crate::settings::SettingsStore;

type Slot = Arc<OnceCell<ComponentInstance>>;

/// Capability → id → singleton component.
pub struct CapabilityRegistry {
    cache: RwLock<HashMap<CapabilityId, HashMap<Uuid, Slot>>>,
    known: RwLock<HashMap<CapabilityId, HashSet<Uuid>>>,
    type_references: RwLock<HashMap<Uuid, TypeReference>>,
    activator: ComponentActivator,
    diagnostics: Arc<dyn Diagnostics>,
    store: SettingsStore,
}

impl CapabilityRegistry {
    /// Create a registry seeded with the host's built-in components and
    /// the persisted component index, if any.
    ///
    /// Probing locations from the index are registered with the
    /// activator's resolver.
    pub fn new(
        host: &dyn EngineHost,
        store: SettingsStore,
        activator: ComponentActivator,
    ) -> Result<Self> {
        let registry = Self {
            cache: RwLock::new(HashMap::new()),
            known: RwLock::new(HashMap::new()),
            type_references: RwLock::new(HashMap::new()),
            activator,
            diagnostics: host.diagnostics(),
            store,
        };

        for (capability, instance) in host.builtin_components() {
            registry.add_component(&capability, instance)?;
        }

        if let Some(settings) = registry.store.load()? {
            for location in &settings.probing_locations {
                registry.activator.resolver().add_probing_location(location.as_str());
            }

            {
                let mut known = registry.known.write().unwrap_or_else(PoisonError::into_inner);
                for (name, ids) in settings.components_by_capability {
                    known
                        .entry(CapabilityId::from_name(name))
                        .or_default()
                        .extend(ids);
                }
            }

            let mut references = registry
                .type_references
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            for (id, text) in settings.component_type_references {
                match text.parse::<TypeReference>() {
                    Ok(reference) => {
                        references.entry(id).or_insert(reference);
                    }
                    Err(e) => registry.diagnostics.diagnostic(&format!(
                        "Ignoring persisted component {}: {}",
                        id, e
                    )),
                }
            }
            drop(references);

            debug!(
                capabilities = registry.known.read().unwrap_or_else(PoisonError::into_inner).len(),
                "Seeded registry from settings"
            );
        }

        Ok(registry)
    }

    /// Register `instance` under `capability`, replacing any materialized
    /// component with the same id.
    pub fn add_component(&self, capability: &CapabilityId, instance: ComponentInstance) -> Result<()> {
        if !instance.implements(capability) {
            return Err(ScaffolderError::TypeMismatch {
                component: instance.type_reference().to_string(),
                capability: capability.to_string(),
            });
        }

        let id = instance.id();
        self.type_references
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, instance.type_reference().clone());
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(capability.clone())
            .or_default()
            .insert(id, Arc::new(OnceCell::with_value(instance)));
        self.remember(capability, id);

        Ok(())
    }

    /// Drop the materialized component. The id stays known under the
    /// capability, so a later lookup constructs it again.
    pub fn remove_component(&self, capability: &CapabilityId, instance: &ComponentInstance) {
        if let Some(slots) = self
            .cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(capability)
        {
            slots.remove(&instance.id());
        }
    }

    /// The component `id` as capability `T`, constructing it if it is
    /// known but not yet materialized.
    ///
    /// Construction failures are reported to diagnostics and yield `None`.
    pub fn try_get_component<T: Capability + ?Sized>(&self, id: Uuid) -> Option<Arc<T>> {
        let capability = CapabilityId::of::<T>();
        let slot = self.slot(&capability, id)?;

        let instance = match slot.get_or_try_init(|| self.activate(&capability, id)) {
            Ok(instance) => instance,
            Err(e) => {
                warn!(component = %id, capability = %capability, error = %e, "Component activation failed");
                self.diagnostics.diagnostic(&format!(
                    "Failed to activate component {} as {}: {}",
                    id, capability, e
                ));
                return None;
            }
        };

        self.remember(&capability, id);
        instance.view::<T>()
    }

    /// Every component known under capability `T`, constructing them as
    /// needed. Components that fail to construct are skipped.
    pub fn of_type<T: Capability + ?Sized>(&self) -> impl Iterator<Item = Arc<T>> + '_ {
        self.known_ids::<T>()
            .into_iter()
            .filter_map(move |id| self.try_get_component::<T>(id))
    }

    /// Ids known under capability `T`, sorted.
    pub fn known_ids<T: Capability + ?Sized>(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self
            .known
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&CapabilityId::of::<T>())
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    /// Type reference recorded for component `id`.
    pub fn type_reference(&self, id: Uuid) -> Option<TypeReference> {
        self.type_references
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    /// Whether component `id` has been constructed as capability `T`.
    pub fn is_materialized<T: Capability + ?Sized>(&self, id: Uuid) -> bool {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&CapabilityId::of::<T>())
            .and_then(|slots| slots.get(&id))
            .is_some_and(|slot| slot.get().is_some())
    }

    /// Register every component found by `results` and persist the
    /// component index. Returns whether a settings file was written.
    pub fn update_user_components(&self, results: &[ScanResult]) -> Result<bool> {
        for result in results {
            if result.has_components() {
                self.activator
                    .resolver()
                    .add_probing_location(result.mount_point_uri.as_str());
            }
            for (capability, instance) in &result.components {
                self.add_component(capability, instance.clone())?;
            }
        }

        self.store.save(results)
    }

    /// The settings store backing this registry.
    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    fn remember(&self, capability: &CapabilityId, id: Uuid) {
        let mut known = self.known.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(ids) = known.get_mut(capability) {
            ids.insert(id);
        } else {
            known.insert(capability.clone(), HashSet::from([id]));
        }
    }

    /// Slot for (capability, id), created when the id has a type
    /// reference to construct it from.
    fn slot(&self, capability: &CapabilityId, id: Uuid) -> Option<Slot> {
        if let Some(slot) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(capability)
            .and_then(|slots| slots.get(&id))
        {
            return Some(slot.clone());
        }

        if !self
            .type_references
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
        {
            return None;
        }

        Some(
            self.cache
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(capability.clone())
                .or_default()
                .entry(id)
                .or_default()
                .clone(),
        )
    }

    fn activate(&self, capability: &CapabilityId, id: Uuid) -> Result<ComponentInstance> {
        let reference = self
            .type_reference(id)
            .ok_or_else(|| ScaffolderError::Activation {
                type_reference: id.to_string(),
                message: "no type reference recorded".to_string(),
            })?;

        let instance = self.activator.activate(&reference)?;

        if instance.id() != id {
            return Err(ScaffolderError::Activation {
                type_reference: reference.to_string(),
                message: format!("constructed component has id {}", instance.id()),
            });
        }
        if !instance.implements(capability) {
            return Err(ScaffolderError::TypeMismatch {
                component: reference.to_string(),
                capability: capability.to_string(),
            });
        }

        debug!(component = %id, capability = %capability, "Materialized component");
        Ok(instance)
    }
}

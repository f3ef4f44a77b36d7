//! Capabilities and type-erased component instances.
//!
//! A capability is a trait that components implement (a generator, an
//! installer factory, a post-action processor). Each capability trait is
//! given a stable [`CapabilityId`] by implementing [`Capability`] on its
//! trait object:
//!
//! ```
//! use scaffolder::component::{Capability, Identified};
//!
//! pub trait Linter: Identified {
//!     fn lint(&self, text: &str) -> Vec<String>;
//! }
//!
//! impl Capability for dyn Linter {
//!     const NAME: &'static str = "acme.linter";
//! }
//! ```
//!
//! A [`ComponentInstance`] is one singleton component together with a
//! typed view for every capability it implements.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, ScaffolderError};

/// Anything that carries a stable unique id.
pub trait Identified: Send + Sync + 'static {
    /// Unique id of this component. Must be the same for every instance
    /// of the same implementation.
    fn id(&self) -> Uuid;
}

/// Marks a capability trait object and names it.
pub trait Capability: Identified {
    /// Stable capability name, persisted in the settings file.
    const NAME: &'static str;
}

/// Stable name of a capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityId(String);

impl CapabilityId {
    /// Id of the capability `T`.
    pub fn of<T: Capability + ?Sized>() -> Self {
        Self(T::NAME.to_string())
    }

    /// Id from a persisted name. Unknown names are kept as-is.
    pub fn from_name(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The capability name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapabilityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Module-qualified type name: `"TypeName, ModuleName"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TypeReference {
    /// Name of the component type inside its module.
    pub type_name: String,
    /// Simple name of the module that provides the type. `None` for
    /// components built into the host.
    pub module: Option<String>,
}

impl TypeReference {
    /// Reference to a type that is not tied to a module.
    pub fn unqualified(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            module: None,
        }
    }

    /// Reference to a type provided by `module`.
    pub fn qualified(type_name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            module: Some(module.into()),
        }
    }
}

impl fmt::Display for TypeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.module {
            Some(module) => write!(f, "{}, {}", self.type_name, module),
            None => f.write_str(&self.type_name),
        }
    }
}

impl FromStr for TypeReference {
    type Err = ScaffolderError;

    fn from_str(s: &str) -> Result<Self> {
        let (type_name, module) = match s.split_once(',') {
            Some((type_name, module)) => (type_name.trim(), Some(module.trim())),
            None => (s.trim(), None),
        };

        if type_name.is_empty() || module.is_some_and(str::is_empty) {
            return Err(ScaffolderError::InvalidIdentity {
                value: s.to_string(),
                message: "expected 'TypeName, ModuleName'".to_string(),
            });
        }

        Ok(Self {
            type_name: type_name.to_string(),
            module: module.map(str::to_string),
        })
    }
}

impl TryFrom<String> for TypeReference {
    type Error = ScaffolderError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<TypeReference> for String {
    fn from(reference: TypeReference) -> Self {
        reference.to_string()
    }
}

type View = Arc<dyn Any + Send + Sync>;

/// A singleton component and its capability views.
///
/// Cloning is cheap; clones share the same views.
#[derive(Clone)]
pub struct ComponentInstance {
    id: Uuid,
    type_reference: TypeReference,
    views: Arc<BTreeMap<CapabilityId, View>>,
}

impl ComponentInstance {
    /// Start building an instance.
    pub fn builder(id: Uuid, type_name: impl Into<String>) -> ComponentBuilder {
        ComponentBuilder {
            id,
            type_reference: TypeReference::unqualified(type_name),
            views: BTreeMap::new(),
        }
    }

    /// Unique id of the component.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Type reference used to rebuild the component after a restart.
    pub fn type_reference(&self) -> &TypeReference {
        &self.type_reference
    }

    /// Typed view of the component as capability `T`.
    pub fn view<T: Capability + ?Sized>(&self) -> Option<Arc<T>> {
        self.views
            .get(&CapabilityId::of::<T>())?
            .downcast_ref::<Arc<T>>()
            .cloned()
    }

    /// Whether the component implements `capability`.
    pub fn implements(&self, capability: &CapabilityId) -> bool {
        self.views.contains_key(capability)
    }

    /// Capabilities implemented by the component, in name order.
    pub fn capabilities(&self) -> impl Iterator<Item = &CapabilityId> + '_ {
        self.views.keys()
    }

    /// One `(capability, instance)` pair per implemented capability, all
    /// backed by this instance.
    pub fn registrations(&self) -> Vec<(CapabilityId, ComponentInstance)> {
        self.views
            .keys()
            .map(|capability| (capability.clone(), self.clone()))
            .collect()
    }

    /// Same component, with its type reference qualified by `module`.
    pub fn in_module(mut self, module: impl Into<String>) -> Self {
        self.type_reference.module = Some(module.into());
        self
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("id", &self.id)
            .field("type_reference", &self.type_reference.to_string())
            .field("capabilities", &self.views.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`ComponentInstance`].
pub struct ComponentBuilder {
    id: Uuid,
    type_reference: TypeReference,
    views: BTreeMap<CapabilityId, View>,
}

impl ComponentBuilder {
    /// Expose the component as capability `T`.
    pub fn with<T: Capability + ?Sized>(mut self, view: Arc<T>) -> Self {
        self.views.insert(CapabilityId::of::<T>(), Arc::new(view));
        self
    }

    /// Finish the instance.
    pub fn build(self) -> ComponentInstance {
        ComponentInstance {
            id: self.id,
            type_reference: self.type_reference,
            views: Arc::new(self.views),
        }
    }
}

/// Zero-argument constructor for one component type, exported by a
/// module's entry point.
#[derive(Clone, Copy)]
pub struct ComponentFactory {
    /// Type name the factory builds, as it appears in type references.
    pub type_name: &'static str,
    /// Builds a fresh instance.
    pub construct: fn() -> ComponentInstance,
}

impl ComponentFactory {
    /// Create a factory.
    pub const fn new(type_name: &'static str, construct: fn() -> ComponentInstance) -> Self {
        Self {
            type_name,
            construct,
        }
    }

    /// Run the factory.
    pub fn create(&self) -> ComponentInstance {
        (self.construct)()
    }
}

impl fmt::Debug for ComponentFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentFactory")
            .field("type_name", &self.type_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter: Identified {
        fn greet(&self) -> String;
    }

    impl Capability for dyn Greeter {
        const NAME: &'static str = "test.greeter";
    }

    trait Counter: Identified {
        fn count(&self) -> usize;
    }

    impl Capability for dyn Counter {
        const NAME: &'static str = "test.counter";
    }

    const ID: Uuid = Uuid::from_u128(0x1234);

    struct Both;

    impl Identified for Both {
        fn id(&self) -> Uuid {
            ID
        }
    }

    impl Greeter for Both {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    impl Counter for Both {
        fn count(&self) -> usize {
            3
        }
    }

    fn both() -> ComponentInstance {
        let component = Arc::new(Both);
        ComponentInstance::builder(ID, "Both")
            .with::<dyn Greeter>(component.clone())
            .with::<dyn Counter>(component)
            .build()
    }

    #[test]
    fn views_resolve_per_capability() {
        let instance = both();

        assert_eq!(instance.view::<dyn Greeter>().unwrap().greet(), "hello");
        assert_eq!(instance.view::<dyn Counter>().unwrap().count(), 3);
        assert_eq!(instance.capabilities().count(), 2);
    }

    #[test]
    fn views_share_the_same_component() {
        let instance = both();
        let first = instance.view::<dyn Greeter>().unwrap();
        let second = instance.clone().view::<dyn Greeter>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn missing_capability_has_no_view() {
        let component = Arc::new(Both);
        let instance = ComponentInstance::builder(ID, "Both")
            .with::<dyn Greeter>(component)
            .build();

        assert!(instance.view::<dyn Counter>().is_none());
        assert!(!instance.implements(&CapabilityId::of::<dyn Counter>()));
        assert!(instance.implements(&CapabilityId::of::<dyn Greeter>()));
    }

    #[test]
    fn registrations_pair_each_capability_with_the_instance() {
        let registrations = both().registrations();

        assert_eq!(registrations.len(), 2);
        assert!(registrations.iter().all(|(_, instance)| instance.id() == ID));
        assert_eq!(registrations[0].0, CapabilityId::of::<dyn Counter>());
        assert_eq!(registrations[1].0, CapabilityId::of::<dyn Greeter>());
    }

    #[test]
    fn in_module_qualifies_type_reference() {
        let instance = both().in_module("Acme.Components");
        assert_eq!(
            instance.type_reference().to_string(),
            "Both, Acme.Components"
        );
    }

    #[test]
    fn type_reference_parses_both_forms() {
        let qualified: TypeReference = "Acme.Generator, Acme.Components".parse().unwrap();
        assert_eq!(
            qualified,
            TypeReference::qualified("Acme.Generator", "Acme.Components")
        );

        let bare: TypeReference = "FolderInstallerFactory".parse().unwrap();
        assert_eq!(bare.module, None);
    }

    #[test]
    fn type_reference_rejects_empty_parts() {
        assert!("".parse::<TypeReference>().is_err());
        assert!("Acme.Generator, ".parse::<TypeReference>().is_err());
        assert!(", Acme".parse::<TypeReference>().is_err());
    }

    #[test]
    fn capability_id_uses_trait_name() {
        assert_eq!(CapabilityId::of::<dyn Greeter>().as_str(), "test.greeter");
        assert_eq!(
            CapabilityId::from_name("test.greeter"),
            CapabilityId::of::<dyn Greeter>()
        );
    }

    #[test]
    fn factory_creates_fresh_instances() {
        let factory = ComponentFactory::new("Both", both);
        assert_eq!(factory.create().id(), ID);
        assert_eq!(factory.type_name, "Both");
    }
}

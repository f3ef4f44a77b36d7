//! Components, capabilities and the capability registry.
//!
//! # Overview
//!
//! - [`Capability`] names a capability trait; [`CapabilityId`] is that
//!   name at runtime
//! - [`ComponentInstance`] is a singleton component with one typed view
//!   per capability
//! - [`CapabilityRegistry`] holds the components of a process, constructing
//!   persisted ones on first use through a [`ComponentActivator`]
//! - [`Generator`], [`InstallerFactory`] and [`PostActionProcessor`] are
//!   the capability kinds the engine understands

pub mod activator;
pub mod builtin;
pub mod capability;
pub mod kinds;
pub mod registry;

pub use activator::ComponentActivator;
pub use builtin::{builtin_components, ConfigFileGenerator, FolderInstallerFactory};
pub use capability::{
    Capability, CapabilityId, ComponentBuilder, ComponentFactory, ComponentInstance, Identified,
    TypeReference,
};
pub use kinds::{Generator, InstallerFactory, PostActionProcessor};
pub use registry::CapabilityRegistry;

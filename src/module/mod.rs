//! Module files: identities, manifests, loading and version resolution.
//!
//! A module is a unit of distribution that contributes components. Each
//! module file carries a [`ModuleIdentity`] and the identities of the
//! modules it references. [`VersionResolver`] finds the best file for a
//! requested identity across the registered probing locations.

pub mod identity;
pub mod loader;
pub mod manifest;
pub mod probing;
pub mod resolver;

pub use identity::{ModuleIdentity, ModuleVersion};
pub use loader::{LoadedModule, ManifestModuleLoader, ModuleLoader};
pub use manifest::{EntryPoint, ModuleCatalog, ModuleManifest};
pub use probing::ProbingIndex;
pub use resolver::{select_candidates, CulturePolicy, ResolverOptions, VersionResolver};

//! Version-aware module resolution across probing locations.
//!
//! When a module reference cannot be satisfied directly, the resolver
//! searches every probing location for files named after the requested
//! module and picks the best candidate:
//!
//! - the simple name must match, ignoring case
//! - a requested public key must match exactly
//! - the culture must match (see [`CulturePolicy`])
//! - a requested version is never satisfied by a lower one, and once a
//!   candidate has matched the request on some leading fields, candidates
//!   that match fewer leading fields are no longer considered
//!
//! Surviving candidates are tried last-accepted first until one loads.
//! Every outcome, including "nothing found", is memoized by the text form
//! of the requested identity.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::identity::ModuleIdentity;
use super::loader::{LoadedModule, ModuleLoader};
use super::probing::ProbingIndex;
use crate::error::ScaffolderError;
use crate::host::Diagnostics;
use crate::mount::MountPointProvider;

/// How candidate cultures are compared with the requested culture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CulturePolicy {
    /// Only candidates with the requested culture are considered.
    #[default]
    Strict,
    /// Candidates with another culture are considered until one with the
    /// requested culture has been accepted.
    FirstMatchPins,
}

impl fmt::Display for CulturePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => f.write_str("strict"),
            Self::FirstMatchPins => f.write_str("first-match-pins"),
        }
    }
}

impl FromStr for CulturePolicy {
    type Err = ScaffolderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "first-match-pins" => Ok(Self::FirstMatchPins),
            other => Err(ScaffolderError::Other(anyhow::anyhow!(
                "unknown culture policy '{}' (expected 'strict' or 'first-match-pins')",
                other
            ))),
        }
    }
}

/// Resolver settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// File name suffix of module files; the file for module `Foo` is
    /// `Foo<suffix>`.
    pub module_suffix: String,
    /// Culture comparison rule.
    pub culture_policy: CulturePolicy,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            module_suffix: ".module.json".to_string(),
            culture_policy: CulturePolicy::default(),
        }
    }
}

/// Resolves module identities to loaded modules.
pub struct VersionResolver {
    locations: RwLock<Vec<String>>,
    mounts: Arc<dyn MountPointProvider>,
    loader: Arc<dyn ModuleLoader>,
    diagnostics: Arc<dyn Diagnostics>,
    options: ResolverOptions,
    index: ProbingIndex<Option<Arc<LoadedModule>>>,
}

impl VersionResolver {
    /// Create a resolver with no probing locations.
    pub fn new(
        mounts: Arc<dyn MountPointProvider>,
        loader: Arc<dyn ModuleLoader>,
        diagnostics: Arc<dyn Diagnostics>,
        options: ResolverOptions,
    ) -> Self {
        Self {
            locations: RwLock::new(Vec::new()),
            mounts,
            loader,
            diagnostics,
            options,
            index: ProbingIndex::new(),
        }
    }

    /// Register a probing location. Locations are searched in
    /// registration order; duplicates are ignored.
    pub fn add_probing_location(&self, location: impl Into<String>) {
        let location = location.into();
        let mut locations = self
            .locations
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if !locations.contains(&location) {
            debug!(location = %location, "Added probing location");
            locations.push(location);
        }
    }

    /// Registered probing locations, in search order.
    pub fn probing_locations(&self) -> Vec<String> {
        self.locations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Options in effect.
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    /// Whether an outcome for `requested` has been memoized.
    pub fn is_memoized(&self, requested: &ModuleIdentity) -> bool {
        self.index.contains(&requested.to_string())
    }

    /// Resolve `requested` to a loaded module.
    ///
    /// The first resolution of an identity also resolves the references
    /// of the chosen module. Later calls return the memoized outcome.
    pub fn resolve(&self, requested: &ModuleIdentity) -> Option<Arc<LoadedModule>> {
        let key = requested.to_string();
        let (outcome, computed) = self.index.get_or_compute(&key, || self.probe(requested));

        if computed {
            if let Some(module) = &outcome {
                for reference in module.references() {
                    if self.resolve(reference).is_none() {
                        debug!(
                            module = %module.identity(),
                            reference = %reference,
                            "Reference not found in probing locations"
                        );
                    }
                }
            }
        }

        outcome
    }

    fn probe(&self, requested: &ModuleIdentity) -> Option<Arc<LoadedModule>> {
        let file_name = format!("{}{}", requested.name, self.options.module_suffix);

        for location in self.probing_locations() {
            let Some(mount) = self.mounts.try_mount(&location) else {
                debug!(location = %location, "Probing location is not mountable");
                continue;
            };

            let files = match mount.enumerate_files(&self.options.module_suffix) {
                Ok(files) => files,
                Err(e) => {
                    self.diagnostics.diagnostic(&format!(
                        "Failed to enumerate probing location {}: {}",
                        location, e
                    ));
                    continue;
                }
            };

            let candidates: Vec<(PathBuf, ModuleIdentity)> = files
                .into_iter()
                .filter(|path| {
                    path.file_name()
                        .map(|name| name.to_string_lossy().eq_ignore_ascii_case(&file_name))
                        .unwrap_or(false)
                })
                .filter(|path| path.exists())
                .filter_map(|path| match self.loader.identify(&path) {
                    Ok(identity) => Some((path, identity)),
                    Err(e) => {
                        self.diagnostics.diagnostic(&e.to_string());
                        None
                    }
                })
                .collect();

            let mut stack =
                select_candidates(requested, &candidates, self.options.culture_policy);

            while let Some(path) = stack.pop() {
                match self.loader.load(&path) {
                    Ok(module) => {
                        info!(
                            requested = %requested,
                            resolved = %module.identity(),
                            path = %path.display(),
                            "Resolved module"
                        );
                        return Some(module);
                    }
                    Err(e) => self.diagnostics.diagnostic(&e.to_string()),
                }
            }
        }

        debug!(requested = %requested, "No candidate module found");
        None
    }
}

/// Version fields an exact match pins for later candidates.
const EXACT_MATCH_DEPTH: usize = 2;

/// Candidate files acceptable for `requested`, in the order they should
/// be pushed on the attempt stack. The last element is tried first.
///
/// `candidates` are visited in the given order; the outcome depends on it.
pub fn select_candidates(
    requested: &ModuleIdentity,
    candidates: &[(PathBuf, ModuleIdentity)],
    policy: CulturePolicy,
) -> Vec<PathBuf> {
    let mut stack = Vec::new();
    let mut pinned_depth = 0;
    let mut culture_matched = false;

    for (path, candidate) in candidates {
        if !requested.same_name(candidate) {
            continue;
        }

        if let Some(key) = &requested.public_key {
            if candidate.public_key.as_ref() != Some(key) {
                continue;
            }
        }

        let culture_matches = requested.same_culture(candidate);
        let culture_rejected = match policy {
            CulturePolicy::Strict => !culture_matches,
            CulturePolicy::FirstMatchPins => culture_matched && !culture_matches,
        };
        if culture_rejected {
            continue;
        }

        if let Some(wanted) = requested.version {
            let found = candidate.version.unwrap_or_default();
            match wanted.first_difference(&found) {
                Some(depth) => {
                    // Never go backwards, never loosen.
                    if found.fields()[depth] < wanted.fields()[depth] || depth < pinned_depth {
                        continue;
                    }
                    pinned_depth = depth;
                }
                // An exact match pins major and minor.
                None => pinned_depth = pinned_depth.max(EXACT_MATCH_DEPTH),
            }
        }

        culture_matched |= culture_matches;
        stack.push(path.clone());
    }

    stack
}

//! Reading and writing the component settings file.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, debug_span, info};
use uuid::Uuid;

use crate::error::{Result, ScaffolderError};
use crate::host::FileSystem;
use crate::scan::ScanResult;

/// Current settings file schema version.
pub const SETTINGS_VERSION: u32 = 1;

/// Default number of read attempts before giving up.
pub const DEFAULT_MAX_LOAD_ATTEMPTS: u32 = 20;

/// Default pause between read attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(2);

/// Persisted component index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentSettings {
    /// Schema version.
    #[serde(default)]
    pub version: u32,

    /// When the file was written.
    #[serde(default)]
    pub written_at: Option<DateTime<Utc>>,

    /// Component id → type reference text.
    #[serde(default)]
    pub component_type_references: BTreeMap<Uuid, String>,

    /// Mount points that contributed components.
    #[serde(default)]
    pub probing_locations: BTreeSet<String>,

    /// Capability name → component ids.
    #[serde(default)]
    pub components_by_capability: BTreeMap<String, BTreeSet<Uuid>>,
}

impl ComponentSettings {
    /// Build the index from scan results.
    pub fn from_scan_results(results: &[ScanResult]) -> Self {
        let mut settings = Self {
            version: SETTINGS_VERSION,
            ..Self::default()
        };

        for result in results {
            for (capability, instance) in &result.components {
                settings
                    .probing_locations
                    .insert(result.mount_point_uri.clone());
                settings
                    .components_by_capability
                    .entry(capability.to_string())
                    .or_default()
                    .insert(instance.id());
                settings
                    .component_type_references
                    .insert(instance.id(), instance.type_reference().to_string());
            }
        }

        settings
    }

    /// Whether the index lists no components.
    pub fn is_empty(&self) -> bool {
        self.components_by_capability.values().all(BTreeSet::is_empty)
    }
}

/// Reads and writes [`ComponentSettings`] at a fixed path.
pub struct SettingsStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    max_load_attempts: u32,
    retry_delay: Duration,
}

impl SettingsStore {
    /// Store for the settings file at `path`.
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
            max_load_attempts: DEFAULT_MAX_LOAD_ATTEMPTS,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }

    /// Override the read retry policy.
    pub fn with_retry(mut self, max_load_attempts: u32, retry_delay: Duration) -> Self {
        self.max_load_attempts = max_load_attempts.max(1);
        self.retry_delay = retry_delay;
        self
    }

    /// Path of the settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the components found by `results`.
    ///
    /// Returns `false` and deletes the settings file when no result has
    /// any component.
    pub fn save(&self, results: &[ScanResult]) -> Result<bool> {
        let mut settings = ComponentSettings::from_scan_results(results);

        if settings.is_empty() {
            if self.fs.exists(&self.path) {
                self.fs.remove_file(&self.path)?;
                info!(path = %self.path.display(), "Removed component settings");
            }
            return Ok(false);
        }

        settings.written_at = Some(Utc::now());
        let content = serde_json::to_string_pretty(&settings)?;
        self.fs.write(&self.path, &content)?;

        info!(
            path = %self.path.display(),
            components = settings.component_type_references.len(),
            locations = settings.probing_locations.len(),
            "Saved component settings"
        );
        Ok(true)
    }

    /// Load the settings file, or `None` when there is none.
    pub fn load(&self) -> Result<Option<ComponentSettings>> {
        if !self.fs.exists(&self.path) {
            return Ok(None);
        }

        let content = {
            let _span = debug_span!("read_settings", path = %self.path.display()).entered();
            self.read_with_retry()?
        };

        let _span = debug_span!("parse_settings").entered();
        let settings: ComponentSettings =
            serde_json::from_str(&content).map_err(|e| ScaffolderError::SettingsParse {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        debug!(
            components = settings.component_type_references.len(),
            "Loaded component settings"
        );
        Ok(Some(settings))
    }

    fn read_with_retry(&self) -> Result<String> {
        let mut last_error: Option<io::Error> = None;

        for attempt in 1..=self.max_load_attempts {
            match self.fs.read_to_string(&self.path) {
                Ok(content) => return Ok(content),
                Err(e) => {
                    debug!(attempt, error = %e, "Settings read failed");
                    last_error = Some(e);
                    if attempt < self.max_load_attempts {
                        thread::sleep(self.retry_delay);
                    }
                }
            }
        }

        Err(ScaffolderError::SettingsRead {
            path: self.path.clone(),
            attempts: self.max_load_attempts,
            source: last_error.unwrap_or_else(|| io::Error::other("no read attempted")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Capability, CapabilityId, ComponentInstance, Identified};
    use crate::host::PhysicalFileSystem;
    use std::fs;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    trait Probe: Identified {}

    impl Capability for dyn Probe {
        const NAME: &'static str = "test.probe";
    }

    struct Sample;

    impl Identified for Sample {
        fn id(&self) -> Uuid {
            Uuid::from_u128(11)
        }
    }

    impl Probe for Sample {}

    fn scan_with_component(uri: &str) -> ScanResult {
        let instance = ComponentInstance::builder(Uuid::from_u128(11), "Sample")
            .with::<dyn Probe>(Arc::new(Sample))
            .build()
            .in_module("Acme.Components");
        ScanResult {
            mount_point_uri: uri.to_string(),
            components: vec![(CapabilityId::of::<dyn Probe>(), instance)],
            ..ScanResult::empty()
        }
    }

    fn store(temp: &TempDir) -> SettingsStore {
        SettingsStore::new(
            temp.path().join("components.json"),
            Arc::new(PhysicalFileSystem),
        )
    }

    #[test]
    fn save_then_load_round_trips() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        assert!(store.save(&[scan_with_component("/content/a")]).unwrap());
        let settings = store.load().unwrap().unwrap();

        assert_eq!(settings.version, SETTINGS_VERSION);
        assert!(settings.written_at.is_some());
        assert!(settings.probing_locations.contains("/content/a"));
        assert_eq!(
            settings.component_type_references[&Uuid::from_u128(11)],
            "Sample, Acme.Components"
        );
        assert!(settings.components_by_capability["test.probe"].contains(&Uuid::from_u128(11)));
    }

    #[test]
    fn save_without_components_deletes_file() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        store.save(&[scan_with_component("/content/a")]).unwrap();
        assert!(store.path().exists());

        let saved = store
            .save(&[ScanResult {
                mount_point_uri: "/content/empty".into(),
                ..ScanResult::empty()
            }])
            .unwrap();

        assert!(!saved);
        assert!(!store.path().exists());
    }

    #[test]
    fn empty_save_without_file_is_fine() {
        let temp = TempDir::new().unwrap();
        assert!(!store(&temp).save(&[]).unwrap());
    }

    #[test]
    fn sources_without_components_are_not_probing_locations() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);

        let empty = ScanResult {
            mount_point_uri: "/content/templates-only".into(),
            ..ScanResult::empty()
        };
        store
            .save(&[empty, scan_with_component("/content/a")])
            .unwrap();

        let settings = store.load().unwrap().unwrap();
        assert_eq!(settings.probing_locations.len(), 1);
    }

    #[test]
    fn load_missing_file_is_none() {
        let temp = TempDir::new().unwrap();
        assert!(store(&temp).load().unwrap().is_none());
    }

    #[test]
    fn load_corrupt_file_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        fs::write(store.path(), "{ nope").unwrap();

        assert!(matches!(
            store.load(),
            Err(ScaffolderError::SettingsParse { .. })
        ));
    }

    struct FlakyFileSystem {
        failures_left: AtomicU32,
        reads: AtomicU32,
    }

    impl FileSystem for FlakyFileSystem {
        fn read_to_string(&self, _path: &Path) -> io::Result<String> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(io::Error::new(io::ErrorKind::WouldBlock, "file locked"));
            }
            Ok("{}".to_string())
        }

        fn write(&self, _path: &Path, _contents: &str) -> io::Result<()> {
            Ok(())
        }

        fn exists(&self, _path: &Path) -> bool {
            true
        }

        fn remove_file(&self, _path: &Path) -> io::Result<()> {
            Ok(())
        }

        fn enumerate_files(&self, _dir: &Path, _suffix: &str) -> io::Result<Vec<PathBuf>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn load_retries_transient_failures() {
        let fs = Arc::new(FlakyFileSystem {
            failures_left: AtomicU32::new(3),
            reads: AtomicU32::new(0),
        });
        let store = SettingsStore::new("/settings/components.json", fs.clone())
            .with_retry(5, Duration::ZERO);

        let settings = store.load().unwrap().unwrap();

        assert!(settings.is_empty());
        assert_eq!(fs.reads.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn load_gives_up_after_max_attempts() {
        let fs = Arc::new(FlakyFileSystem {
            failures_left: AtomicU32::new(100),
            reads: AtomicU32::new(0),
        });
        let store = SettingsStore::new("/settings/components.json", fs.clone())
            .with_retry(4, Duration::ZERO);

        let err = store.load().unwrap_err();

        assert!(matches!(err, ScaffolderError::SettingsRead { attempts: 4, .. }));
        assert_eq!(fs.reads.load(Ordering::SeqCst), 4);
    }
}

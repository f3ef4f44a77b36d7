//! Library integration tests.

use scaffolder::component::{FolderInstallerFactory, InstallerFactory};
use scaffolder::config::EngineConfig;
use scaffolder::host::DefaultHost;
use scaffolder::module::{CulturePolicy, ModuleCatalog};
use scaffolder::{EngineEnvironment, ScaffolderError};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn error_types_are_public() {
    let err = ScaffolderError::InvalidSource {
        location: "nowhere".into(),
        message: "missing".into(),
    };
    assert!(err.to_string().contains("nowhere"));
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> scaffolder::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn tracing_initializes_once() {
    scaffolder::logging::init_tracing(false);
    assert!(!scaffolder::logging::init_tracing(true));
}

#[test]
fn environment_from_config_file() {
    let temp = TempDir::new().unwrap();
    let settings = temp.path().join("settings");
    let config_path = temp.path().join("scaffolder.yml");
    fs::write(
        &config_path,
        format!(
            "settings_dir: {}\nculture_policy: first-match-pins\n",
            settings.display()
        ),
    )
    .unwrap();

    let config = EngineConfig::load(&config_path).unwrap();
    assert_eq!(config.culture_policy, CulturePolicy::FirstMatchPins);

    let env = EngineEnvironment::new(
        Arc::new(DefaultHost::new()),
        config,
        Arc::new(ModuleCatalog::new()),
    )
    .unwrap();

    assert_eq!(
        env.resolver().options().culture_policy,
        CulturePolicy::FirstMatchPins
    );
    assert_eq!(
        env.config().components_file_path(),
        settings.join("components.json")
    );
}

#[test]
fn builtin_installer_is_available_without_scanning() {
    let temp = TempDir::new().unwrap();
    let config = EngineConfig {
        settings_dir: temp.path().join("settings"),
        ..Default::default()
    };
    let env = EngineEnvironment::new(
        Arc::new(DefaultHost::new()),
        config,
        Arc::new(ModuleCatalog::new()),
    )
    .unwrap();

    let installer = env
        .registry()
        .try_get_component::<dyn InstallerFactory>(FolderInstallerFactory::ID)
        .unwrap();
    assert_eq!(installer.name(), "folder");
    assert!(installer.can_install(temp.path().to_str().unwrap()));
}

/// Host lifecycle
///
/// Owns the registry between host start and host stop. Whatever component
/// intercepts the host's playback calls borrows the registry from here.
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::audio_system::AudioBackend;
use crate::catalog::ItemLookup;
use crate::config::Config;
use crate::error::RegistryError;
use crate::registry::{ScanReport, SoundRegistry};

const LOG_TARGET_LIFECYCLE: &str = "item_sound_effects::lifecycle";

pub struct SfxHost {
    registry: SoundRegistry,
    sfx_root: PathBuf,
    report: ScanReport,
}

impl SfxHost {
    /// Build the registry and register every item folder under the
    /// configured SFX root (resolved against `config_file`).
    pub fn start(
        config: &Config,
        config_file: &Path,
        backend: Rc<dyn AudioBackend>,
        lookup: impl ItemLookup + 'static,
    ) -> Result<Self, RegistryError> {
        let sfx_root = config.resolve(config_file, &config.sfx_dir);
        tracing::info!(target: LOG_TARGET_LIFECYCLE, "Starting with SFX root {}", sfx_root.display());

        let mut registry = SoundRegistry::new(backend, lookup, config.playback_settings());
        let report = registry.scan_directory(&sfx_root)?;

        tracing::info!(
            target: LOG_TARGET_LIFECYCLE,
            "Started with {} item sound effect(s)",
            registry.len()
        );

        Ok(Self {
            registry,
            sfx_root,
            report,
        })
    }

    /// Advance fades; call once per host frame
    pub fn update(&self, delta_seconds: f32) {
        self.registry.update(delta_seconds);
    }

    pub fn registry(&self) -> &SoundRegistry {
        &self.registry
    }

    /// Report of the startup scan
    pub fn report(&self) -> &ScanReport {
        &self.report
    }

    pub fn sfx_root(&self) -> &Path {
        &self.sfx_root
    }

    /// Tear down: cut running fades and release every loaded sound
    pub fn stop(mut self) {
        let count = self.registry.len();
        self.registry.clear();
        tracing::info!(
            target: LOG_TARGET_LIFECYCLE,
            "Stopped, released {} item sound effect(s)",
            count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::MemoryBackend;
    use crate::catalog::{ItemCatalog, ItemId, ItemInfo};
    use std::fs;

    fn catalog() -> ItemCatalog {
        ItemCatalog::new(vec![ItemInfo {
            id: ItemId(3),
            name: "Item_Flashlight".to_string(),
            display_name: "Flashlight".to_string(),
        }])
    }

    #[test]
    fn test_start_creates_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("config.json");
        let backend = Rc::new(MemoryBackend::new());

        let host = SfxHost::start(&Config::default(), &config_file, backend, catalog()).unwrap();
        assert!(dir.path().join("SFX").is_dir());
        assert!(host.registry().is_empty());
        assert!(host.report().skipped.is_empty());
    }

    #[test]
    fn test_start_scans_and_stop_releases() {
        let dir = tempfile::tempdir().unwrap();
        let item_dir = dir.path().join("SFX").join("Flashlight");
        fs::create_dir_all(&item_dir).unwrap();
        fs::write(item_dir.join("action.wav"), b"RIFF").unwrap();
        fs::write(item_dir.join("use.flac"), b"fLaC").unwrap();

        let backend = Rc::new(MemoryBackend::new());
        let host = SfxHost::start(
            &Config::default(),
            &dir.path().join("config.json"),
            backend.clone(),
            catalog(),
        )
        .unwrap();

        assert!(host.registry().contains(ItemId(3)));
        assert_eq!(host.report().registered.len(), 1);
        assert_eq!(backend.loaded_count(), 2);

        host.stop();
        assert_eq!(backend.loaded_count(), 0);
    }

    #[test]
    fn test_root_that_is_a_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("SFX"), b"").unwrap();

        let result = SfxHost::start(
            &Config::default(),
            &dir.path().join("config.json"),
            Rc::new(MemoryBackend::new()),
            catalog(),
        );
        assert!(matches!(result, Err(RegistryError::RootUnreadable { .. })));
    }
}

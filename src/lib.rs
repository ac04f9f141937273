//! Custom item sound effects
//!
//! Loads per-item replacement sounds from a folder convention
//! (`<root>/<item>/action.<ext>`, `<root>/<item>/use.<ext>`), keeps them in a
//! [`SoundRegistry`] keyed by item id, and plays them on request, with
//! frame-driven fade-outs for the action sound.
//!
//! ```text
//! SfxHost ──> SoundRegistry ──> PlaybackController ──> AudioBackend
//!                  │                    │                (rodio / memory)
//!                  └── ItemLookup       └── FadeScheduler
//! ```
pub mod audio_system;
pub mod catalog;
pub mod config;
pub mod error;
pub mod host;
pub mod outcome;
pub mod registry;

pub use audio_system::{
    AudioBackend, MemoryBackend, PlaybackController, PlaybackSettings, RodioBackend, Slot,
    SoundEntry,
};
pub use catalog::{ItemCatalog, ItemId, ItemInfo, ItemLookup};
pub use config::Config;
pub use error::{AppResult, AudioError, CatalogError, ConfigError, RegistryError};
pub use host::SfxHost;
pub use outcome::{Outcome, OutcomeResult};
pub use registry::{
    ItemRef, ScanReport, ScannedItem, SkipReason, SkippedFolder, SoundOverride, SoundRegistry,
    SoundSource,
};

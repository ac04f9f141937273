/// Audio system module
///
/// Everything between the sound registry and the audio device:
/// - [`AudioBackend`]: the port every backend implements
/// - [`RodioBackend`] / [`MemoryBackend`]: real output and headless backends
/// - [`discovery`]: finds `action.*` / `use.*` files in an item folder
/// - [`PlaybackController`]: per-item play / stop / fade-stop
/// - [`FadeScheduler`]: tick-driven fade-outs
///
/// ## Architecture
///
/// ```text
/// SoundRegistry
///   ├── PlaybackController (item 105)  ─┐
///   ├── PlaybackController (item 449)  ─┤ share one backend
///   └── FadeScheduler                  ─┘ and one fade queue
///
/// Each PlaybackController has:
///   ├── SoundEntry (action?, use?)
///   └── active channel (last action sound)
/// ```
///
/// ## Usage
///
/// ```rust,ignore
/// let controller = registry.get(ItemId(105)).unwrap();
/// controller.play_action();
/// controller.fade_stop();
///
/// // once per frame
/// registry.update(delta_seconds);
/// ```
pub mod backend;
pub mod discovery;
pub mod fade;
pub mod memory;
pub mod playback;
pub mod rodio_backend;

// Re-export commonly used types
pub use backend::{AudioBackend, BusRef, ChannelHandle, LoadMode, SoundHandle};
pub use discovery::{find_slot_file, is_supported_audio, Slot, SUPPORTED_EXTENSIONS};
pub use fade::{FadeEffect, FadeOut, FadeScheduler, FadeStep, DEFAULT_FADE_FLOOR, DEFAULT_FADE_SECONDS};
pub use memory::MemoryBackend;
pub use playback::{PlaybackController, PlaybackSettings, SoundEntry, DEFAULT_BUS_PATH};
pub use rodio_backend::RodioBackend;

/// Audio backend port
///
/// The registry and the playback controllers only talk to audio hardware
/// through [`AudioBackend`]. Implementations: [`super::RodioBackend`] (real
/// output), [`super::MemoryBackend`] (headless).
use std::fmt;
use std::path::Path;

use crate::error::AudioError;

/// Handle to a sound loaded by a backend.
///
/// "No sound" is expressed as `Option<SoundHandle>::None`, never as a
/// sentinel handle value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SoundHandle(pub u64);

/// Handle to a playing channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(pub u64);

/// Mixer routing target for a play call
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BusRef {
    /// Engine default routing
    Default,

    /// A resolved mixer bus, by path
    Named(String),
}

impl fmt::Display for BusRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusRef::Default => write!(f, "default"),
            BusRef::Named(path) => write!(f, "{}", path),
        }
    }
}

/// How a sound is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadMode {
    /// Decode lazily from disk at play time instead of keeping the file in memory
    pub streaming: bool,
}

impl LoadMode {
    /// Item sounds by default
    pub const STREAM: LoadMode = LoadMode { streaming: true };

    /// Whole file read at load time
    pub const PRELOAD: LoadMode = LoadMode { streaming: false };
}

impl Default for LoadMode {
    fn default() -> Self {
        Self::STREAM
    }
}

/// Abstraction over audio backends.
///
/// Methods take `&self`; implementations keep their mutable state behind
/// interior locks so one backend can be shared by the registry and every
/// playback controller.
pub trait AudioBackend {
    fn load_sound(&self, path: &Path, mode: LoadMode) -> Result<SoundHandle, AudioError>;

    /// Free a loaded sound. Channels already playing it are unaffected.
    fn release_sound(&self, sound: SoundHandle);

    fn resolve_bus(&self, path: &str) -> Result<BusRef, AudioError>;

    fn play(&self, sound: SoundHandle, bus: &BusRef) -> Result<ChannelHandle, AudioError>;

    /// False once the channel finished naturally or was stopped
    fn is_playing(&self, channel: ChannelHandle) -> bool;

    /// Linear volume of a channel
    fn volume(&self, channel: ChannelHandle) -> Result<f32, AudioError>;

    fn set_volume(&self, channel: ChannelHandle, volume: f32) -> Result<(), AudioError>;

    fn stop(&self, channel: ChannelHandle);
}

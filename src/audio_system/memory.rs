/// Headless audio backend
///
/// Tracks sounds and channels in memory without touching an output device.
/// Used for dry-run scans and for tests; every call is recorded so callers
/// can inspect what would have been played.
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::backend::{AudioBackend, BusRef, ChannelHandle, LoadMode, SoundHandle};
use super::discovery::is_supported_audio;
use crate::error::AudioError;

#[derive(Debug, Clone)]
struct MemoryChannel {
    sound: SoundHandle,
    bus: BusRef,
    volume: f32,
    playing: bool,
    stops: u32,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    sounds: HashMap<SoundHandle, (PathBuf, LoadMode)>,
    channels: HashMap<ChannelHandle, MemoryChannel>,
    released: Vec<SoundHandle>,
    failing_loads: HashSet<PathBuf>,
    bus_unavailable: bool,
    play_fails: bool,
}

impl MemoryState {
    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory audio backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later load of `path` fail with a decode error
    pub fn fail_load(&self, path: impl Into<PathBuf>) {
        self.state.lock().failing_loads.insert(path.into());
    }

    /// Make bus resolution fail (playback falls back to default routing)
    pub fn set_bus_unavailable(&self, unavailable: bool) {
        self.state.lock().bus_unavailable = unavailable;
    }

    /// Make every later play call fail
    pub fn set_play_fails(&self, fails: bool) {
        self.state.lock().play_fails = fails;
    }

    /// Simulate a channel reaching the end of its sound
    pub fn finish_channel(&self, channel: ChannelHandle) {
        if let Some(entry) = self.state.lock().channels.get_mut(&channel) {
            entry.playing = false;
        }
    }

    /// Number of sounds currently loaded
    pub fn loaded_count(&self) -> usize {
        self.state.lock().sounds.len()
    }

    /// Path a loaded sound was created from
    pub fn sound_path(&self, sound: SoundHandle) -> Option<PathBuf> {
        self.state.lock().sounds.get(&sound).map(|(path, _)| path.clone())
    }

    /// Mode a loaded sound was created with
    pub fn sound_mode(&self, sound: SoundHandle) -> Option<LoadMode> {
        self.state.lock().sounds.get(&sound).map(|(_, mode)| *mode)
    }

    /// Sounds released so far, in release order
    pub fn released(&self) -> Vec<SoundHandle> {
        self.state.lock().released.clone()
    }

    /// Every channel ever started, ordered by creation
    pub fn channels(&self) -> Vec<ChannelHandle> {
        let mut channels: Vec<ChannelHandle> = self.state.lock().channels.keys().copied().collect();
        channels.sort_by_key(|channel| channel.0);
        channels
    }

    /// Sound and bus a channel was started with
    pub fn channel_info(&self, channel: ChannelHandle) -> Option<(SoundHandle, BusRef)> {
        self.state
            .lock()
            .channels
            .get(&channel)
            .map(|entry| (entry.sound, entry.bus.clone()))
    }

    /// How many times `stop` reached a channel
    pub fn stop_count(&self, channel: ChannelHandle) -> u32 {
        self.state
            .lock()
            .channels
            .get(&channel)
            .map(|entry| entry.stops)
            .unwrap_or(0)
    }
}

impl AudioBackend for MemoryBackend {
    fn load_sound(&self, path: &Path, mode: LoadMode) -> Result<SoundHandle, AudioError> {
        if !path.is_file() {
            return Err(AudioError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        if !is_supported_audio(path) {
            return Err(AudioError::UnsupportedFormat(path.display().to_string()));
        }

        let mut state = self.state.lock();
        if state.failing_loads.contains(path) {
            return Err(AudioError::DecodeFailed(
                format!("simulated decode failure: {}", path.display()).into(),
            ));
        }

        let sound = SoundHandle(state.alloc_id());
        state.sounds.insert(sound, (path.to_path_buf(), mode));
        Ok(sound)
    }

    fn release_sound(&self, sound: SoundHandle) {
        let mut state = self.state.lock();
        if state.sounds.remove(&sound).is_some() {
            state.released.push(sound);
        }
    }

    fn resolve_bus(&self, path: &str) -> Result<BusRef, AudioError> {
        if self.state.lock().bus_unavailable {
            return Err(AudioError::BusNotFound(path.to_string()));
        }
        Ok(BusRef::Named(path.to_string()))
    }

    fn play(&self, sound: SoundHandle, bus: &BusRef) -> Result<ChannelHandle, AudioError> {
        let mut state = self.state.lock();
        if !state.sounds.contains_key(&sound) {
            return Err(AudioError::InvalidHandle);
        }
        if state.play_fails {
            return Err(AudioError::PlaybackFailed("simulated playback failure".into()));
        }

        let channel = ChannelHandle(state.alloc_id());
        state.channels.insert(
            channel,
            MemoryChannel {
                sound,
                bus: bus.clone(),
                volume: 1.0,
                playing: true,
                stops: 0,
            },
        );
        Ok(channel)
    }

    fn is_playing(&self, channel: ChannelHandle) -> bool {
        self.state
            .lock()
            .channels
            .get(&channel)
            .map(|entry| entry.playing)
            .unwrap_or(false)
    }

    fn volume(&self, channel: ChannelHandle) -> Result<f32, AudioError> {
        match self.state.lock().channels.get(&channel) {
            Some(entry) if entry.playing => Ok(entry.volume),
            _ => Err(AudioError::InvalidChannel),
        }
    }

    fn set_volume(&self, channel: ChannelHandle, volume: f32) -> Result<(), AudioError> {
        match self.state.lock().channels.get_mut(&channel) {
            Some(entry) if entry.playing => {
                entry.volume = volume;
                Ok(())
            }
            _ => Err(AudioError::InvalidChannel),
        }
    }

    fn stop(&self, channel: ChannelHandle) {
        if let Some(entry) = self.state.lock().channels.get_mut(&channel) {
            entry.playing = false;
            entry.stops += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_maps_to_file_not_found() {
        let backend = MemoryBackend::new();
        let err = backend
            .load_sound(Path::new("/nonexistent/action.wav"), LoadMode::default())
            .unwrap_err();
        assert!(matches!(err, AudioError::FileNotFound { .. }));
        assert_eq!(backend.loaded_count(), 0);
    }

    #[test]
    fn test_load_play_stop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("use.mp3");
        std::fs::write(&path, b"ID3").unwrap();

        let backend = MemoryBackend::new();
        let sound = backend.load_sound(&path, LoadMode::default()).unwrap();
        assert_eq!(backend.sound_path(sound), Some(path));
        assert_eq!(backend.sound_mode(sound), Some(LoadMode::STREAM));

        let channel = backend.play(sound, &BusRef::Default).unwrap();
        assert!(backend.is_playing(channel));
        assert_eq!(backend.volume(channel).unwrap(), 1.0);

        backend.stop(channel);
        assert!(!backend.is_playing(channel));
        assert!(backend.volume(channel).is_err());
        assert_eq!(backend.stop_count(channel), 1);
    }

    #[test]
    fn test_simulated_failures() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("action.ogg");
        std::fs::write(&path, b"OggS").unwrap();

        let backend = MemoryBackend::new();
        backend.fail_load(&path);
        assert!(matches!(
            backend.load_sound(&path, LoadMode::default()),
            Err(AudioError::DecodeFailed(_))
        ));

        backend.set_bus_unavailable(true);
        assert!(backend.resolve_bus("bus:/Master/SFX").is_err());
    }

    #[test]
    fn test_release_is_recorded_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("action.wav");
        std::fs::write(&path, b"RIFF").unwrap();

        let backend = MemoryBackend::new();
        let sound = backend.load_sound(&path, LoadMode::default()).unwrap();
        backend.release_sound(sound);
        backend.release_sound(sound);
        assert_eq!(backend.released(), vec![sound]);
        assert_eq!(backend.loaded_count(), 0);
    }
}

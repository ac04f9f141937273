/// Per-item sound playback
///
/// A [`PlaybackController`] owns one item's [`SoundEntry`] and at most one
/// tracked channel (the last action sound started).
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::backend::{AudioBackend, BusRef, ChannelHandle, LoadMode, SoundHandle};
use super::discovery::Slot;
use super::fade::{FadeEffect, FadeOut, FadeScheduler};

/// Mixer bus item sounds are routed to
pub const DEFAULT_BUS_PATH: &str = "bus:/Master/SFX";

/// The two optional custom sounds of one item.
///
/// A `None` slot means the host plays its own default sound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SoundEntry {
    action: Option<SoundHandle>,
    use_: Option<SoundHandle>,
}

impl SoundEntry {
    pub fn new(action: Option<SoundHandle>, use_: Option<SoundHandle>) -> Self {
        Self { action, use_ }
    }

    pub fn action(&self) -> Option<SoundHandle> {
        self.action
    }

    pub fn use_sound(&self) -> Option<SoundHandle> {
        self.use_
    }

    pub fn get(&self, slot: Slot) -> Option<SoundHandle> {
        match slot {
            Slot::Action => self.action,
            Slot::Use => self.use_,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.action.is_none() && self.use_.is_none()
    }

    /// Loaded handles, action first
    pub fn handles(&self) -> impl Iterator<Item = SoundHandle> {
        self.action.into_iter().chain(self.use_)
    }
}

/// Playback settings shared by every controller of a registry
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackSettings {
    pub bus_path: String,
    pub fade: FadeEffect,
    /// How item sound files are loaded
    pub load_mode: LoadMode,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            bus_path: DEFAULT_BUS_PATH.to_string(),
            fade: FadeEffect::default(),
            load_mode: LoadMode::default(),
        }
    }
}

/// Plays one item's custom sounds.
///
/// Not thread-safe: every call is expected from the host's update loop.
/// Play calls never fail from the caller's point of view; backend errors are
/// logged.
pub struct PlaybackController {
    entry: SoundEntry,
    active_channel: Cell<Option<ChannelHandle>>,
    backend: Rc<dyn AudioBackend>,
    fades: Rc<RefCell<FadeScheduler>>,
    settings: Rc<PlaybackSettings>,
}

impl PlaybackController {
    pub(crate) fn new(
        entry: SoundEntry,
        backend: Rc<dyn AudioBackend>,
        fades: Rc<RefCell<FadeScheduler>>,
        settings: Rc<PlaybackSettings>,
    ) -> Self {
        Self {
            entry,
            active_channel: Cell::new(None),
            backend,
            fades,
            settings,
        }
    }

    pub fn entry(&self) -> &SoundEntry {
        &self.entry
    }

    /// True when the host should play its own sound for `slot`
    pub fn uses_default(&self, slot: Slot) -> bool {
        self.entry.get(slot).is_none()
    }

    /// Channel of the last action sound, if any
    pub fn active_channel(&self) -> Option<ChannelHandle> {
        self.active_channel.get()
    }

    /// Play the action sound and track its channel for stop/fade
    pub fn play_action(&self) {
        let Some(sound) = self.entry.action else {
            return;
        };

        let bus = self.resolve_bus();
        match self.backend.play(sound, &bus) {
            Ok(channel) => self.active_channel.set(Some(channel)),
            Err(e) => tracing::error!("Failed to play item action sound: {}", e),
        }
    }

    /// Play the use sound. One-shot: the channel is not tracked.
    pub fn play_use(&self) {
        let Some(sound) = self.entry.use_ else {
            return;
        };

        let bus = self.resolve_bus();
        if let Err(e) = self.backend.play(sound, &bus) {
            tracing::error!("Failed to play item use sound: {}", e);
        }
    }

    /// Hard-stop the tracked channel
    pub fn stop(&self) {
        if let Some(channel) = self.active_channel.get() {
            self.backend.stop(channel);
        }
    }

    /// Fade the tracked channel out over the configured duration, then stop it
    pub fn fade_stop(&self) {
        self.fade_stop_with(self.settings.fade.seconds);
    }

    /// Fade the tracked channel out over `seconds`, then stop it.
    ///
    /// Returns immediately; the fade advances on each registry update. The
    /// channel is forgotten at once, so a later play starts a fresh track and
    /// a second fade-stop is a no-op.
    pub fn fade_stop_with(&self, seconds: f32) {
        let Some(channel) = self.active_channel.take() else {
            return;
        };

        let fade = FadeOut::begin(
            self.backend.as_ref(),
            channel,
            self.settings.fade.with_seconds(seconds),
        );
        self.fades.borrow_mut().push(fade);
    }

    fn resolve_bus(&self) -> BusRef {
        match self.backend.resolve_bus(&self.settings.bus_path) {
            Ok(bus) => bus,
            Err(e) => {
                tracing::error!("Mixer bus unavailable, using default routing: {}", e);
                BusRef::Default
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_system::memory::MemoryBackend;

    struct Fixture {
        backend: Rc<MemoryBackend>,
        fades: Rc<RefCell<FadeScheduler>>,
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                backend: Rc::new(MemoryBackend::new()),
                fades: Rc::new(RefCell::new(FadeScheduler::new())),
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn sound(&self, name: &str) -> SoundHandle {
            let path = self.dir.path().join(name);
            std::fs::write(&path, b"RIFF").unwrap();
            self.backend.load_sound(&path, LoadMode::default()).unwrap()
        }

        fn controller(&self, entry: SoundEntry) -> PlaybackController {
            PlaybackController::new(
                entry,
                self.backend.clone(),
                self.fades.clone(),
                Rc::new(PlaybackSettings::default()),
            )
        }

        fn tick(&self) {
            self.fades.borrow_mut().tick(self.backend.as_ref(), 1.0 / 60.0);
        }
    }

    #[test]
    fn test_empty_slots_are_noops() {
        let fx = Fixture::new();
        let controller = fx.controller(SoundEntry::default());

        assert!(controller.uses_default(Slot::Action));
        assert!(controller.uses_default(Slot::Use));
        controller.play_action();
        controller.play_use();
        controller.fade_stop();

        assert!(fx.backend.channels().is_empty());
        assert!(fx.fades.borrow().is_idle());
    }

    #[test]
    fn test_action_is_tracked_use_is_not() {
        let fx = Fixture::new();
        let action = fx.sound("action.wav");
        let use_ = fx.sound("use.wav");
        let controller = fx.controller(SoundEntry::new(Some(action), Some(use_)));

        controller.play_use();
        assert_eq!(controller.active_channel(), None);

        controller.play_action();
        let channels = fx.backend.channels();
        assert_eq!(channels.len(), 2);
        assert_eq!(controller.active_channel(), Some(channels[1]));
        assert_eq!(
            fx.backend.channel_info(channels[1]),
            Some((action, BusRef::Named(DEFAULT_BUS_PATH.to_string())))
        );
    }

    #[test]
    fn test_new_action_replaces_tracked_channel_without_stopping() {
        let fx = Fixture::new();
        let action = fx.sound("action.wav");
        let controller = fx.controller(SoundEntry::new(Some(action), None));

        controller.play_action();
        let first = controller.active_channel().unwrap();
        controller.play_action();
        let second = controller.active_channel().unwrap();

        assert_ne!(first, second);
        assert!(fx.backend.is_playing(first));
        assert_eq!(fx.backend.stop_count(first), 0);
    }

    #[test]
    fn test_bus_failure_falls_back_to_default_routing() {
        let fx = Fixture::new();
        let action = fx.sound("action.wav");
        let controller = fx.controller(SoundEntry::new(Some(action), None));

        fx.backend.set_bus_unavailable(true);
        controller.play_action();

        let channel = controller.active_channel().unwrap();
        assert_eq!(fx.backend.channel_info(channel), Some((action, BusRef::Default)));
    }

    #[test]
    fn test_play_failure_is_swallowed() {
        let fx = Fixture::new();
        let action = fx.sound("action.wav");
        let controller = fx.controller(SoundEntry::new(Some(action), None));

        fx.backend.set_play_fails(true);
        controller.play_action();
        assert_eq!(controller.active_channel(), None);
    }

    #[test]
    fn test_stop_is_a_hard_cut() {
        let fx = Fixture::new();
        let action = fx.sound("action.wav");
        let controller = fx.controller(SoundEntry::new(Some(action), None));

        controller.play_action();
        let channel = controller.active_channel().unwrap();
        controller.stop();

        assert!(!fx.backend.is_playing(channel));
        assert_eq!(fx.backend.stop_count(channel), 1);
        assert!(fx.fades.borrow().is_idle());
    }

    #[test]
    fn test_fade_stop_forgets_channel_and_stops_once() {
        let fx = Fixture::new();
        let action = fx.sound("action.wav");
        let controller = fx.controller(SoundEntry::new(Some(action), None));

        controller.play_action();
        let channel = controller.active_channel().unwrap();
        controller.fade_stop();
        assert_eq!(controller.active_channel(), None);

        // Second fade-stop has nothing to fade
        controller.fade_stop();
        assert_eq!(fx.fades.borrow().active_count(), 1);

        for _ in 0..30 {
            fx.tick();
        }
        assert!(fx.fades.borrow().is_idle());
        assert_eq!(fx.backend.stop_count(channel), 1);
    }

    #[test]
    fn test_stale_fade_does_not_touch_new_channel() {
        let fx = Fixture::new();
        let action = fx.sound("action.wav");
        let controller = fx.controller(SoundEntry::new(Some(action), None));

        controller.play_action();
        let old = controller.active_channel().unwrap();
        controller.fade_stop();

        controller.play_action();
        let new = controller.active_channel().unwrap();

        for _ in 0..30 {
            fx.tick();
        }
        assert_eq!(fx.backend.stop_count(old), 1);
        assert!(fx.backend.is_playing(new));
        assert_eq!(fx.backend.volume(new).unwrap(), 1.0);
    }

    #[test]
    fn test_entry_handles() {
        let entry = SoundEntry::new(None, Some(SoundHandle(7)));
        assert!(!entry.is_empty());
        assert_eq!(entry.get(Slot::Use), Some(SoundHandle(7)));
        assert_eq!(entry.handles().collect::<Vec<_>>(), vec![SoundHandle(7)]);
        assert!(SoundEntry::default().is_empty());
    }
}

/// Fade-out effect
///
/// Linear fade to silence driven by explicit ticks. The host calls
/// [`FadeScheduler::tick`] once per frame with the frame's delta time; nothing
/// here sleeps or spawns threads.

use super::backend::{AudioBackend, ChannelHandle};

/// Default fade-out duration in seconds
pub const DEFAULT_FADE_SECONDS: f32 = 0.25;

/// Volume at or below which a fading channel is considered silent
pub const DEFAULT_FADE_FLOOR: f32 = 0.02;

/// Fade effect configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeEffect {
    /// Time to go from the starting volume to silence
    pub seconds: f32,

    /// Silence threshold
    pub floor: f32,
}

impl FadeEffect {
    pub fn new(seconds: f32, floor: f32) -> Self {
        Self { seconds, floor }
    }

    /// Same floor, different duration
    pub fn with_seconds(self, seconds: f32) -> Self {
        Self { seconds, ..self }
    }
}

impl Default for FadeEffect {
    fn default() -> Self {
        Self {
            seconds: DEFAULT_FADE_SECONDS,
            floor: DEFAULT_FADE_FLOOR,
        }
    }
}

/// State of a fade after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeStep {
    Running,
    Finished,
}

/// One running fade-out of a single channel
#[derive(Debug)]
pub struct FadeOut {
    channel: ChannelHandle,
    /// Volume captured when the fade began; `None` if it could not be read
    ceiling: Option<f32>,
    effect: FadeEffect,
    finished: bool,
}

impl FadeOut {
    /// Capture the channel's current volume and prepare the fade
    pub fn begin(backend: &dyn AudioBackend, channel: ChannelHandle, effect: FadeEffect) -> Self {
        let ceiling = backend.volume(channel).ok();
        tracing::debug!(
            "Fade-out of channel {:?} from {:?} over {}s",
            channel,
            ceiling,
            effect.seconds
        );

        Self {
            channel,
            ceiling,
            effect,
            finished: false,
        }
    }

    pub fn channel(&self) -> ChannelHandle {
        self.channel
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Advance the fade by `delta_seconds`.
    ///
    /// The channel is stopped exactly once, on the tick where it is found
    /// silent, invalid, or unwritable.
    pub fn tick(&mut self, backend: &dyn AudioBackend, delta_seconds: f32) -> FadeStep {
        if self.finished {
            return FadeStep::Finished;
        }

        let Some(ceiling) = self.ceiling else {
            return self.finish(backend);
        };

        if self.effect.seconds <= 0.0 || !backend.is_playing(self.channel) {
            return self.finish(backend);
        }

        let volume = match backend.volume(self.channel) {
            Ok(volume) => volume,
            Err(_) => return self.finish(backend),
        };

        if volume <= self.effect.floor {
            return self.finish(backend);
        }

        let next = (volume - ceiling * delta_seconds / self.effect.seconds).max(0.0);
        if backend.set_volume(self.channel, next).is_err() {
            return self.finish(backend);
        }

        FadeStep::Running
    }

    fn finish(&mut self, backend: &dyn AudioBackend) -> FadeStep {
        backend.stop(self.channel);
        self.finished = true;
        tracing::debug!("Fade-out of channel {:?} finished", self.channel);
        FadeStep::Finished
    }
}

/// Owns every running fade-out
#[derive(Debug, Default)]
pub struct FadeScheduler {
    tasks: Vec<FadeOut>,
}

impl FadeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fade: FadeOut) {
        self.tasks.push(fade);
    }

    /// Advance every fade by one tick and drop the finished ones
    pub fn tick(&mut self, backend: &dyn AudioBackend, delta_seconds: f32) {
        self.tasks
            .retain_mut(|fade| fade.tick(backend, delta_seconds) == FadeStep::Running);
    }

    /// Number of fades still running
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Cut every running fade short, stopping its channel immediately
    pub fn stop_all(&mut self, backend: &dyn AudioBackend) {
        for mut fade in self.tasks.drain(..) {
            fade.finish(backend);
        }
    }
}

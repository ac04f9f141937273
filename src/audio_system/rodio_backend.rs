/// Audio backend on rodio
///
/// One rodio `Sink` per playing channel. Mixer buses are modelled as named
/// gains applied when a channel starts.
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::backend::{AudioBackend, BusRef, ChannelHandle, LoadMode, SoundHandle};
use crate::error::AudioError;

enum SoundData {
    /// Whole file kept in memory
    Preloaded(Arc<Vec<u8>>),

    /// Decoded from disk on every play
    Streamed(PathBuf),
}

#[derive(Default)]
struct RodioState {
    next_id: u64,
    sounds: HashMap<SoundHandle, SoundData>,
    channels: HashMap<ChannelHandle, Sink>,
}

impl RodioState {
    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Audio backend playing through the default output device
///
/// Streamed sounds are checked with symphonia at load time, preloaded ones
/// with rodio's decoder. Neither understands AIFF, so `.aif`/`.aiff` files
/// are found by discovery but fail to load here (reported as `ErrUnknown`).
pub struct RodioBackend {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    buses: HashMap<String, f32>,
    state: Mutex<RodioState>,
}

impl RodioBackend {
    /// Open the default output device. `buses` maps bus paths to linear gain.
    pub fn new(buses: HashMap<String, f32>) -> Result<Self, AudioError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| AudioError::StreamInitFailed(Box::new(e)))?;

        tracing::info!("Audio output opened with {} mixer bus(es)", buses.len());

        Ok(Self {
            _stream: stream,
            stream_handle,
            buses,
            state: Mutex::new(RodioState::default()),
        })
    }

    fn bus_gain(&self, bus: &BusRef) -> f32 {
        match bus {
            BusRef::Default => 1.0,
            BusRef::Named(path) => self.buses.get(path).copied().unwrap_or(1.0),
        }
    }

    fn build_source(sound: &SoundData) -> Result<Box<dyn Source<Item = i16> + Send>, AudioError> {
        let source: Box<dyn Source<Item = i16> + Send> = match sound {
            // Note: We must clone here as rodio's Decoder requires owned data with 'static lifetime
            SoundData::Preloaded(data) => Box::new(
                Decoder::new(Cursor::new((**data).clone()))
                    .map_err(|e| AudioError::DecodeFailed(Box::new(e)))?,
            ),
            SoundData::Streamed(path) => {
                let file = File::open(path).map_err(|e| AudioError::LoadFailed {
                    path: path.display().to_string(),
                    source: Box::new(e),
                })?;
                Box::new(
                    Decoder::new(BufReader::new(file))
                        .map_err(|e| AudioError::DecodeFailed(Box::new(e)))?,
                )
            }
        };

        Ok(source)
    }
}

/// Check that a file holds a container with at least one decodable track
fn probe_container(path: &Path) -> Result<(), AudioError> {
    let src = File::open(path).map_err(|e| AudioError::LoadFailed {
        path: path.display().to_string(),
        source: Box::new(e),
    })?;
    let mss = MediaSourceStream::new(Box::new(src), Default::default());

    // Create a probe hint using the file extension
    let mut hint = Hint::new();
    if let Some(ext_str) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(ext_str);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| AudioError::DecodeFailed(Box::new(e)))?;

    probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| AudioError::UnsupportedFormat(path.display().to_string()))?;

    Ok(())
}

impl AudioBackend for RodioBackend {
    fn load_sound(&self, path: &Path, mode: LoadMode) -> Result<SoundHandle, AudioError> {
        if !path.is_file() {
            return Err(AudioError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let data = if mode.streaming {
            probe_container(path)?;
            SoundData::Streamed(path.to_path_buf())
        } else {
            let bytes = std::fs::read(path).map_err(|e| AudioError::LoadFailed {
                path: path.display().to_string(),
                source: Box::new(e),
            })?;
            // Verify the audio can be decoded
            Decoder::new(Cursor::new(bytes.clone()))
                .map_err(|e| AudioError::DecodeFailed(Box::new(e)))?;
            SoundData::Preloaded(Arc::new(bytes))
        };

        let mut state = self.state.lock();
        let sound = SoundHandle(state.alloc_id());
        state.sounds.insert(sound, data);

        tracing::debug!("Loaded {} as {:?} ({:?})", path.display(), sound, mode);
        Ok(sound)
    }

    fn release_sound(&self, sound: SoundHandle) {
        if self.state.lock().sounds.remove(&sound).is_some() {
            tracing::debug!("Released {:?}", sound);
        }
    }

    fn resolve_bus(&self, path: &str) -> Result<BusRef, AudioError> {
        if self.buses.contains_key(path) {
            Ok(BusRef::Named(path.to_string()))
        } else {
            Err(AudioError::BusNotFound(path.to_string()))
        }
    }

    fn play(&self, sound: SoundHandle, bus: &BusRef) -> Result<ChannelHandle, AudioError> {
        let mut state = self.state.lock();

        // Forget sinks that ran dry
        state.channels.retain(|_, sink| !sink.empty());

        let loaded = state.sounds.get(&sound).ok_or(AudioError::InvalidHandle)?;
        let source = Self::build_source(loaded)?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| AudioError::PlaybackFailed(Box::new(e)))?;
        sink.set_volume(self.bus_gain(bus));
        sink.append(source);
        sink.play();

        let channel = ChannelHandle(state.alloc_id());
        state.channels.insert(channel, sink);

        tracing::debug!("Playing {:?} on {} as {:?}", sound, bus, channel);
        Ok(channel)
    }

    fn is_playing(&self, channel: ChannelHandle) -> bool {
        self.state
            .lock()
            .channels
            .get(&channel)
            .map(|sink| !sink.empty())
            .unwrap_or(false)
    }

    fn volume(&self, channel: ChannelHandle) -> Result<f32, AudioError> {
        match self.state.lock().channels.get(&channel) {
            Some(sink) if !sink.empty() => Ok(sink.volume()),
            _ => Err(AudioError::InvalidChannel),
        }
    }

    fn set_volume(&self, channel: ChannelHandle, volume: f32) -> Result<(), AudioError> {
        match self.state.lock().channels.get(&channel) {
            Some(sink) if !sink.empty() => {
                sink.set_volume(volume.max(0.0));
                Ok(())
            }
            _ => Err(AudioError::InvalidChannel),
        }
    }

    fn stop(&self, channel: ChannelHandle) {
        if let Some(sink) = self.state.lock().channels.remove(&channel) {
            sink.stop();
        }
    }
}

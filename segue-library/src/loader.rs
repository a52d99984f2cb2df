//! Audio file decoding into analysis buffers

use rubato::{FftFixedInOut, Resampler};
use segue_analysis::AudioBuffer;
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::{MetadataOptions, StandardTagKey, Tag};
use symphonia::core::probe::Hint;
use thiserror::Error;
use tracing::{debug, warn};

/// Sample rate tracks are converted to unless configured otherwise
pub const DEFAULT_SAMPLE_RATE: u32 = 44100;
/// Resampler input chunk, in frames
const RESAMPLE_CHUNK: usize = 1024;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("No audio track found in file")]
    NoAudioTrack,
    #[error("Unsupported format")]
    UnsupportedFormat,
    #[error("Decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub duration_secs: f64,
    /// Rate of the file before resampling
    pub source_sample_rate: u32,
}

/// Decoded track ready for analysis
#[derive(Debug, Clone)]
pub struct LoadedTrack {
    pub buffer: AudioBuffer,
    pub metadata: TrackMetadata,
}

/// Decodes audio files with Symphonia and resamples them with rubato
pub struct TrackLoader {
    target_sample_rate: u32,
}

impl Default for TrackLoader {
    fn default() -> Self {
        Self::with_sample_rate(DEFAULT_SAMPLE_RATE)
    }
}

impl TrackLoader {
    pub fn with_sample_rate(target_sample_rate: u32) -> Self {
        Self { target_sample_rate }
    }

    pub fn target_sample_rate(&self) -> u32 {
        self.target_sample_rate
    }

    /// Decode a whole file into planar samples at the target rate
    pub fn load(&self, path: &Path) -> Result<LoadedTrack, LoadError> {
        let file = File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let mut probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| match e {
                SymphoniaError::Unsupported(_) => LoadError::UnsupportedFormat,
                other => LoadError::Decode(other.to_string()),
            })?;

        let mut metadata = TrackMetadata {
            title: path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Unknown")
                .to_string(),
            artist: "Unknown".to_string(),
            album: "Unknown".to_string(),
            ..Default::default()
        };
        // Tags found ahead of the container (e.g. ID3v2)
        if let Some(meta) = probed.metadata.get() {
            if let Some(revision) = meta.current() {
                apply_tags(&mut metadata, revision.tags());
            }
        }

        let mut format = probed.format;
        if let Some(revision) = format.metadata().current() {
            apply_tags(&mut metadata, revision.tags());
        }

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or(LoadError::NoAudioTrack)?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let source_rate = codec_params.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE);
        let channel_count = codec_params.channels.map_or(2, |c| c.count());
        if channel_count == 0 {
            return Err(LoadError::NoAudioTrack);
        }

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| LoadError::Decode(e.to_string()))?;

        let mut interleaved: Vec<f32> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(p) => p,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Stopped reading packets early");
                    break;
                }
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(e)) => {
                    debug!(error = e, "Skipping undecodable packet");
                    continue;
                }
                Err(e) => return Err(LoadError::Decode(e.to_string())),
            };

            let spec = *decoded.spec();
            let mut sample_buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);
            interleaved.extend_from_slice(sample_buf.samples());
        }

        let decoded = AudioBuffer::from_interleaved(&interleaved, channel_count, source_rate);
        metadata.duration_secs = decoded.duration();
        metadata.source_sample_rate = source_rate;

        let buffer = if source_rate != self.target_sample_rate && decoded.frames() > 0 {
            let channels = self.resample(&decoded, source_rate)?;
            AudioBuffer::new(self.target_sample_rate, channels)
        } else {
            decoded
        };

        debug!(
            path = %path.display(),
            frames = buffer.frames(),
            rate = buffer.sample_rate(),
            "Loaded track"
        );
        Ok(LoadedTrack { buffer, metadata })
    }

    /// Resample every channel of `input` to the target rate
    fn resample(&self, input: &AudioBuffer, source_rate: u32) -> Result<Vec<Vec<f32>>, LoadError> {
        let channel_count = input.channel_count();
        let frames = input.frames();

        let mut resampler = FftFixedInOut::<f32>::new(
            source_rate as usize,
            self.target_sample_rate as usize,
            RESAMPLE_CHUNK,
            channel_count,
        )
        .map_err(|e| LoadError::Decode(e.to_string()))?;

        let chunk_size = resampler.input_frames_next();
        let mut output: Vec<Vec<f32>> = vec![Vec::new(); channel_count];

        let mut pos = 0;
        while pos + chunk_size <= frames {
            let chunk: Vec<&[f32]> = (0..channel_count)
                .map(|ch| &input.channel_data(ch)[pos..pos + chunk_size])
                .collect();
            let resampled = resampler
                .process(&chunk, None)
                .map_err(|e| LoadError::Decode(e.to_string()))?;
            for (out, data) in output.iter_mut().zip(resampled) {
                out.extend(data);
            }
            pos += chunk_size;
        }

        // Zero-pad the tail and keep only its share of the output
        if pos < frames {
            let remaining = frames - pos;
            let padded: Vec<Vec<f32>> = (0..channel_count)
                .map(|ch| {
                    let mut v = input.channel_data(ch)[pos..].to_vec();
                    v.resize(chunk_size, 0.0);
                    v
                })
                .collect();
            let resampled = resampler
                .process(&padded, None)
                .map_err(|e| LoadError::Decode(e.to_string()))?;
            let keep = remaining * self.target_sample_rate as usize / source_rate as usize;
            for (out, data) in output.iter_mut().zip(resampled) {
                out.extend(&data[..keep.min(data.len())]);
            }
        }

        Ok(output)
    }
}

fn apply_tags(metadata: &mut TrackMetadata, tags: &[Tag]) {
    for tag in tags {
        match tag.std_key {
            Some(StandardTagKey::TrackTitle) => metadata.title = tag.value.to_string(),
            Some(StandardTagKey::Artist) => metadata.artist = tag.value.to_string(),
            Some(StandardTagKey::Album) => metadata.album = tag.value.to_string(),
            _ => {}
        }
    }
}

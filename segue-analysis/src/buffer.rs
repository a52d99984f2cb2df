//! Planar audio buffer handed to the analyzers

/// Decoded audio, one `Vec<f32>` per channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Create a buffer from planar channel data
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Self {
        Self {
            sample_rate,
            channels,
        }
    }

    /// Create a mono buffer
    pub fn mono(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self::new(sample_rate, vec![samples])
    }

    /// Deinterleave `samples` into `channel_count` planar channels
    ///
    /// Trailing samples that do not fill a whole frame are dropped.
    pub fn from_interleaved(samples: &[f32], channel_count: usize, sample_rate: u32) -> Self {
        let channel_count = channel_count.max(1);
        let frames = samples.len() / channel_count;
        let channels = (0..channel_count)
            .map(|ch| {
                (0..frames)
                    .map(|f| samples[f * channel_count + ch])
                    .collect()
            })
            .collect();
        Self::new(sample_rate, channels)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Samples of one channel, empty if the channel does not exist
    pub fn channel_data(&self, channel: usize) -> &[f32] {
        self.channels.get(channel).map_or(&[], Vec::as_slice)
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / self.sample_rate as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_interleaved() {
        let buffer = AudioBuffer::from_interleaved(&[1.0, -1.0, 2.0, -2.0, 3.0], 2, 44100);
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frames(), 2);
        assert_eq!(buffer.channel_data(0), &[1.0, 2.0]);
        assert_eq!(buffer.channel_data(1), &[-1.0, -2.0]);
    }

    #[test]
    fn test_missing_channel_is_empty() {
        let buffer = AudioBuffer::mono(48000, vec![0.0; 10]);
        assert!(buffer.channel_data(3).is_empty());
    }

    #[test]
    fn test_duration() {
        let buffer = AudioBuffer::mono(48000, vec![0.0; 96000]);
        assert!((buffer.duration() - 2.0).abs() < 1e-9);
        assert_eq!(AudioBuffer::default().duration(), 0.0);
    }
}

use std::borrow::Cow;

use resampler::Resampler;

use crate::errors::AudioError;
use crate::samplecodec::clamp_unit;
use crate::wavefile::WaveFile;

/// * How two overlapping samples are combined by `merge()`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergeAlgorithm {
    /// * `(a + b) / 2`, the tail of the longer stream is halved
    #[default]
    Average,

    /// * `Average`, then everything doubled and clamped
    AverageX2,

    /// * `a + b - sign(a + b) * |a * b|`, the tail is copied as is
    Sum,
}

/// * `10 ^ (db / 20)`
pub fn db_to_gain(db: f64) -> f64 {
    10f64.powf(db / 20.0)
}

/// * Scale every sample by `db` decibels, clamped into `[-1.0, 1.0]`.
pub fn change_volume_samples(samples: &[f64], db: f64) -> Vec<f64> {
    let gain = db_to_gain(db);
    samples.iter().map(|&s| (s * gain).clamp(-1.0, 1.0)).collect()
}

/// * Zero has no sign here, unlike `f64::signum()`.
fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn merge_average(stream1: &[f64], stream2: &[f64]) -> Vec<f64> {
    let overlap = stream1.len().min(stream2.len());
    let longer = if stream1.len() > stream2.len() { stream1 } else { stream2 };
    let mut merged = Vec::<f64>::with_capacity(longer.len());
    merged.extend(stream1.iter().zip(stream2).map(|(v1, v2)| (v1 + v2) * 0.5));
    merged.extend(longer[overlap..].iter().map(|v| v * 0.5));
    merged
}

fn merge_sum(stream1: &[f64], stream2: &[f64]) -> Vec<f64> {
    let overlap = stream1.len().min(stream2.len());
    let longer = if stream1.len() > stream2.len() { stream1 } else { stream2 };
    let mut merged = Vec::<f64>::with_capacity(longer.len());
    merged.extend(stream1.iter().zip(stream2).map(|(v1, v2)| {
        let value = v1 + v2;
        value - sign(value) * (v1 * v2).abs()
    }));
    merged.extend_from_slice(&longer[overlap..]);
    merged
}

/// * Combine two streams of one channel. The result is as long as the longer stream.
pub fn merge_samples(stream1: &[f64], stream2: &[f64], algorithm: MergeAlgorithm) -> Vec<f64> {
    match algorithm {
        MergeAlgorithm::Average => merge_average(stream1, stream2),
        MergeAlgorithm::AverageX2 => merge_average(stream1, stream2)
            .into_iter()
            .map(|v| clamp_unit(v * 2.0))
            .collect(),
        MergeAlgorithm::Sum => merge_sum(stream1, stream2),
    }
}

/// * The signal processing. Every operation returns a new document and leaves `self` untouched.
impl WaveFile {
    pub fn change_volume(&self, db: f64) -> WaveFile {
        let channels = self
            .channels()
            .iter()
            .map(|channel| change_volume_samples(channel, db))
            .collect();
        self.with_channels(channels)
    }

    /// * Resample every channel to `sample_rate`. The output has exactly `ceil(samples_count * sample_rate / self.sample_rate())` samples.
    pub fn change_sample_rate(&self, sample_rate: u32) -> Result<WaveFile, AudioError> {
        if sample_rate == self.sample_rate() {
            return Ok(self.clone());
        }
        let resampler = Resampler::new(self.sample_rate(), sample_rate)?;
        let channels = self
            .channels()
            .iter()
            .map(|channel| resampler.resample(channel))
            .collect();
        let mut ret = self.with_channels(channels);
        ret.set_sample_rate(sample_rate)?;
        Ok(ret)
    }

    /// * Mix `other` into a copy of `self`.
    /// * The one with the lower sample rate is upsampled first, never the other way round.
    /// * Equal channel counts pair up by index, a mono side is mixed into every channel of the other side, anything else fails.
    pub fn merge(&self, other: &WaveFile, algorithm: MergeAlgorithm) -> Result<WaveFile, AudioError> {
        let (file1, file2): (Cow<WaveFile>, Cow<WaveFile>) = if self.sample_rate() < other.sample_rate() {
            (Cow::Owned(self.change_sample_rate(other.sample_rate())?), Cow::Borrowed(other))
        } else if self.sample_rate() > other.sample_rate() {
            (Cow::Borrowed(self), Cow::Owned(other.change_sample_rate(self.sample_rate())?))
        } else {
            (Cow::Borrowed(self), Cow::Borrowed(other))
        };

        let channels1 = file1.channels();
        let channels2 = file2.channels();
        let merge_map: Vec<(usize, usize)> = match (channels1.len(), channels2.len()) {
            (c1, c2) if c1 == c2 => (0..c1).map(|i| (i, i)).collect(),
            (1, c2) => (0..c2).map(|i| (0, i)).collect(),
            (c1, 1) => (0..c1).map(|i| (i, 0)).collect(),
            (c1, c2) => return Err(AudioError::IncompatibleChannelCounts(c1 as u16, c2 as u16)),
        };

        let channels = merge_map
            .into_iter()
            .map(|(i1, i2)| merge_samples(&channels1[i1], &channels2[i2], algorithm))
            .collect();
        Ok(file1.with_channels(channels))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wave(rate: u32, channels: Vec<Vec<f64>>) -> WaveFile {
        let mut wave = WaveFile::new();
        wave.set_channels(channels).unwrap();
        wave.set_sample_rate(rate).unwrap();
        wave
    }

    #[test]
    fn gain_law() {
        assert_eq!(db_to_gain(0.0), 1.0);
        assert!((db_to_gain(20.0) - 10.0).abs() < 1e-12);
        assert!((db_to_gain(-6.0) - 0.501187).abs() < 1e-6);
    }

    #[test]
    fn zero_db_is_identity_and_source_is_untouched() {
        let source = wave(8000, vec![vec![0.1, -0.7, 1.0, -1.0]]);
        assert_eq!(source.change_volume(0.0), source);

        let louder = source.change_volume(6.0);
        assert_eq!(source.channel(0), Some(&[0.1, -0.7, 1.0, -1.0][..]));
        assert_eq!(louder.channel(0).unwrap()[2], 1.0);
        assert_eq!(louder.channel(0).unwrap()[3], -1.0);
    }

    #[test]
    fn volume_round_trip_without_clipping() {
        let source = wave(8000, vec![vec![0.1, -0.2, 0.3, -0.05]]);
        let back = source.change_volume(4.5).change_volume(-4.5);
        for (a, b) in source.channel(0).unwrap().iter().zip(back.channel(0).unwrap()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn average_halves_the_tail() {
        assert_eq!(merge_samples(&[0.5, 0.5, 0.5], &[0.25], MergeAlgorithm::Average), vec![0.375, 0.25, 0.25]);
        assert_eq!(merge_samples(&[0.2], &[0.4, -0.8], MergeAlgorithm::Average), vec![0.30000000000000004, -0.4]);
    }

    #[test]
    fn average_x2_clamps() {
        assert_eq!(merge_samples(&[0.9, 0.1], &[0.8], MergeAlgorithm::AverageX2), vec![1.0, 0.1]);
        assert_eq!(merge_samples(&[-0.9], &[-0.8], MergeAlgorithm::AverageX2), vec![-1.0]);
    }

    #[test]
    fn sum_pulls_toward_zero() {
        assert_eq!(merge_samples(&[0.5], &[0.5], MergeAlgorithm::Sum), vec![0.75]);
        assert_eq!(merge_samples(&[-0.5], &[-0.5], MergeAlgorithm::Sum), vec![-0.75]);
        assert_eq!(merge_samples(&[1.0], &[1.0], MergeAlgorithm::Sum), vec![1.0]);
        // a + b == 0 has no sign, so nothing is subtracted
        assert_eq!(merge_samples(&[0.5], &[-0.5], MergeAlgorithm::Sum), vec![0.0]);
        assert_eq!(merge_samples(&[0.1], &[0.2, 0.9], MergeAlgorithm::Sum)[1], 0.9);
    }

    #[test]
    fn merge_with_silence_keeps_the_signal() {
        let signal = vec![0.3, -0.9, 0.123456789, -1.0, 1.0, 0.0];
        let source = wave(8000, vec![signal.clone(), signal.iter().map(|v| -v).collect()]);
        let silence = wave(8000, vec![vec![0.0; 6]; 2]);
        for algorithm in [MergeAlgorithm::Sum, MergeAlgorithm::AverageX2] {
            assert_eq!(source.merge(&silence, algorithm).unwrap().channels(), source.channels());
            assert_eq!(silence.merge(&source, algorithm).unwrap().channels(), source.channels());
        }
    }

    #[test]
    fn mono_is_broadcast() {
        let stereo = wave(8000, vec![vec![0.5; 3], vec![-0.5; 3]]);
        let mono = wave(8000, vec![vec![0.25; 3]]);

        let merged = mono.merge(&stereo, MergeAlgorithm::Average).unwrap();
        assert_eq!(merged.channel_count(), 2);
        assert_eq!(merged.block_align(), 4);
        assert_eq!(merged.channels(), &[vec![0.375; 3], vec![-0.125; 3]]);

        let merged = stereo.merge(&mono, MergeAlgorithm::Average).unwrap();
        assert_eq!(merged.channels(), &[vec![0.375; 3], vec![-0.125; 3]]);
    }

    #[test]
    fn incompatible_channel_counts() {
        let stereo = wave(8000, vec![vec![0.0; 3]; 2]);
        let surround = wave(8000, vec![vec![0.0; 3]; 6]);
        assert_eq!(
            stereo.merge(&surround, MergeAlgorithm::Sum).unwrap_err(),
            AudioError::IncompatibleChannelCounts(2, 6)
        );
    }

    #[test]
    fn lower_rate_is_upsampled() {
        let low = wave(22050, vec![vec![0.0, 0.2, 0.4, 0.6]]);
        let high = wave(44100, vec![vec![0.0; 8]]);
        for (a, b) in [(&low, &high), (&high, &low)] {
            let merged = a.merge(b, MergeAlgorithm::Sum).unwrap();
            assert_eq!(merged.sample_rate(), 44100);
            assert_eq!(merged.samples_count(), 8);
        }
        // the first input still decides the other metadata
        let merged = low.merge(&high, MergeAlgorithm::Sum).unwrap();
        let expected = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.6];
        for (got, want) in merged.channel(0).unwrap().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn change_sample_rate_identity_and_length() {
        let source = wave(44100, vec![vec![0.5; 400], vec![-0.5; 400]]);
        assert_eq!(source.change_sample_rate(44100).unwrap(), source);
        let resampled = source.change_sample_rate(48000).unwrap();
        assert_eq!(resampled.samples_count(), 436);
        assert_eq!(resampled.sample_rate(), 48000);
        assert_eq!(source.sample_rate(), 44100);
        assert!(matches!(source.change_sample_rate(0), Err(AudioError::InvalidArguments(_))));
    }
}

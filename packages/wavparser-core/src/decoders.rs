use std::path::Path;

use crate::errors::AudioReadError;
use crate::samplecodec::normalize;
use crate::wavcore::AudioFormat;
use crate::wavefile::WaveFile;

/// * What a compressed-format decoder hands over: integer samples at the declared bit depth, one buffer per channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedStream {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub samples: Vec<Vec<i32>>,
}

/// * A decoder for a compressed audio file. The bitstream is entirely its business.
pub trait StreamDecoder {
    fn decode_file(&self, path: &Path) -> Result<DecodedStream, AudioReadError>;
}

/// * Is the FLAC decoder compiled in
pub fn is_flac_available() -> bool {
    cfg!(feature = "flac")
}

pub fn is_flac_path(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("flac"))
}

/// * Decode a `.flac` file with the FLAC decoder, or fail if it isn't compiled in.
pub fn decode_flac(path: &Path) -> Result<DecodedStream, AudioReadError> {
    #[cfg(feature = "flac")]
    {
        FlacDecoder.decode_file(path)
    }

    #[cfg(not(feature = "flac"))]
    {
        Err(AudioReadError::DecodeError(format!(
            "can't decode {}, the \"flac\" feature is disabled",
            path.display()
        )))
    }
}

#[cfg(feature = "flac")]
pub use flac::FlacDecoder;

#[cfg(feature = "flac")]
mod flac {
    use std::path::Path;

    use log::debug;

    use super::{DecodedStream, StreamDecoder};
    use crate::errors::AudioReadError;

    /// * FLAC files through `claxon`
    #[derive(Debug, Clone, Copy, Default)]
    pub struct FlacDecoder;

    /// * The frame count in STREAMINFO is untrusted, never reserve more than this up front.
    const MAX_RESERVED_FRAMES: usize = 1 << 20;

    fn decode_error(err: claxon::Error) -> AudioReadError {
        AudioReadError::DecodeError(err.to_string())
    }

    impl StreamDecoder for FlacDecoder {
        fn decode_file(&self, path: &Path) -> Result<DecodedStream, AudioReadError> {
            debug!("Decoding {} as FLAC", path.display());
            let mut reader = claxon::FlacReader::open(path).map_err(decode_error)?;
            let streaminfo = reader.streaminfo();
            let channels = streaminfo.channels as usize;
            let frames = streaminfo.samples.unwrap_or(0).min(MAX_RESERVED_FRAMES as u64) as usize;

            let mut samples = Vec::with_capacity(channels);
            for _ in 0..channels {
                let mut channel = Vec::<i32>::new();
                channel
                    .try_reserve(frames)
                    .map_err(|e| AudioReadError::DecodeError(e.to_string()))?;
                samples.push(channel);
            }
            for (i, sample) in reader.samples().enumerate() {
                samples[i % channels].push(sample.map_err(decode_error)?);
            }
            Ok(DecodedStream {
                sample_rate: streaminfo.sample_rate,
                channels: channels as u16,
                bits_per_sample: streaminfo.bits_per_sample as u16,
                samples,
            })
        }
    }
}

impl WaveFile {
    /// * Build a document from a decoder's output. Only 16-bit and 24-bit streams are accepted.
    pub fn from_decoded(stream: DecodedStream) -> Result<Self, AudioReadError> {
        let (max, min_abs) = match stream.bits_per_sample {
            16 => (i16::MAX as f64, -(i16::MIN as f64)),
            24 => (8388607.0, 8388608.0),
            other => return Err(AudioReadError::UnsupportedBitsPerSample(other)),
        };
        if stream.sample_rate == 0 {
            return Err(AudioReadError::FormatError(String::from("the decoded stream has a zero sample rate")));
        }
        if stream.channels == 0 || stream.samples.len() != stream.channels as usize {
            return Err(AudioReadError::DecodeError(format!(
                "the decoder declared {} channels but produced {}",
                stream.channels,
                stream.samples.len()
            )));
        }
        let samples_count = stream.samples[0].len();
        if stream.samples.iter().any(|channel| channel.len() != samples_count) {
            return Err(AudioReadError::DecodeError(String::from("the decoded channels are not in the same size")));
        }

        let channels = stream
            .samples
            .iter()
            .map(|channel| channel.iter().map(|&s| normalize(s as i64, max, min_abs)).collect())
            .collect();
        let block_align = stream.channels * (stream.bits_per_sample / 8);
        Ok(Self::from_parts(
            channels,
            stream.sample_rate,
            stream.bits_per_sample,
            block_align,
            AudioFormat::Pcm,
            0,
            Default::default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(bits_per_sample: u16, samples: Vec<Vec<i32>>) -> DecodedStream {
        DecodedStream {
            sample_rate: 48000,
            channels: samples.len() as u16,
            bits_per_sample,
            samples,
        }
    }

    #[test]
    fn flac_paths_are_recognized() {
        assert!(is_flac_path(Path::new("a/b/song.flac")));
        assert!(is_flac_path(Path::new("SONG.FLAC")));
        assert!(!is_flac_path(Path::new("song.wav")));
        assert!(!is_flac_path(Path::new("flac")));
        assert_eq!(is_flac_available(), cfg!(feature = "flac"));
    }

    #[test]
    fn decoded_24_bit_is_normalized() {
        let wave = WaveFile::from_decoded(stream(24, vec![vec![8388607, -8388608, 0], vec![0, 0, -4194304]])).unwrap();
        assert_eq!(wave.channels(), &[vec![1.0, -1.0, 0.0], vec![0.0, 0.0, -0.5]]);
        assert_eq!(wave.bits_per_sample(), 24);
        assert_eq!(wave.block_align(), 6);
        assert_eq!(wave.sample_rate(), 48000);
    }

    #[test]
    fn decoded_other_depths_are_rejected() {
        assert_eq!(
            WaveFile::from_decoded(stream(8, vec![vec![0]])).unwrap_err(),
            AudioReadError::UnsupportedBitsPerSample(8)
        );
        assert_eq!(
            WaveFile::from_decoded(stream(32, vec![vec![0]])).unwrap_err(),
            AudioReadError::UnsupportedBitsPerSample(32)
        );
    }

    #[test]
    fn ragged_decoder_output_is_rejected() {
        assert!(matches!(
            WaveFile::from_decoded(stream(16, vec![vec![0, 1], vec![0]])),
            Err(AudioReadError::DecodeError(_))
        ));
    }

    #[cfg(feature = "flac")]
    #[test]
    fn missing_flac_file_is_a_decode_error() {
        let err = WaveFile::open("this/file/does/not/exist.flac").unwrap_err();
        assert!(matches!(err, AudioReadError::DecodeError(_)));
    }

    #[cfg(feature = "flac")]
    #[test]
    fn huge_declared_frame_count_does_not_abort() {
        #[rustfmt::skip]
        let header = [
            b'f', b'L', b'a', b'C',
            0x80, 0x00, 0x00, 0x22, // last metadata block, STREAMINFO, 34 bytes
            0x10, 0x00, 0x10, 0x00, // block size 4096..4096
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // frame sizes unknown
            // 44100Hz, 2 channels, 16 bits, 2^36 - 1 samples
            0x0a, 0xc4, 0x42, 0xff, 0xff, 0xff, 0xff, 0xff,
            0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // MD5
        ];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("liar.flac");
        std::fs::write(&path, header).unwrap();
        match FlacDecoder.decode_file(&path) {
            Ok(stream) => assert!(stream.samples.iter().all(Vec::is_empty)),
            Err(e) => assert!(matches!(e, AudioReadError::DecodeError(_)), "{e}"),
        }
    }
}

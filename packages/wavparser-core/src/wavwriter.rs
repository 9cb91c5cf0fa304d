use std::io::Write;

use crate::errors::AudioWriteError;
use crate::samplecodec::WaveSampleType;
use crate::wavcore::{ChunkHeader, FmtChunk, ListInfo, format_tags::WAVE_FORMAT_PCM};
use crate::wavefile::WaveFile;

/// * The software tag stamped into the `ISFT` entry of every file this crate writes.
pub const SOFTWARE_TAG: &str = concat!("wavparser-", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// * Goes to the `ISFT` entry of the `LIST`/`INFO` chunk
    pub software_tag: String,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            software_tag: SOFTWARE_TAG.to_string(),
        }
    }
}

/// * The RIFF container writer. Everything is known up front, so the sizes are computed before anything is written and the output needn't be seekable.
#[derive(Debug)]
pub struct WaveWriter;

impl WaveWriter {
    /// * Write `fmt `, `LIST` and `data` chunks in a `RIFF`/`WAVE` container. The samples are always written as integer PCM.
    pub fn write<W: Write + ?Sized>(wave: &WaveFile, writer: &mut W, options: &WriterOptions) -> Result<(), AudioWriteError> {
        let channels = wave.channels();
        let samples_count = wave.samples_count();
        if channels.iter().any(|channel| channel.len() != samples_count) {
            return Err(AudioWriteError::ChannelsNotInSameSize);
        }
        let num_channels = u16::try_from(channels.len())
            .map_err(|_| AudioWriteError::Unsupported(format!("{} channels", channels.len())))?;
        if num_channels == 0 {
            return Err(AudioWriteError::Unsupported(String::from("a file without channels")));
        }
        let sample_type = WaveSampleType::for_writing(wave.bits_per_sample())?;

        let frame_size = num_channels as u64 * sample_type.sizeof() as u64;
        let block_align = u16::try_from(frame_size)
            .map_err(|_| AudioWriteError::Unsupported(format!("{frame_size} bytes per frame")))?;
        let fmt = FmtChunk {
            format_tag: WAVE_FORMAT_PCM,
            channels: num_channels,
            sample_rate: wave.sample_rate(),
            byte_rate: wave.sample_rate().wrapping_mul(block_align as u32),
            block_align,
            bits_per_sample: wave.bits_per_sample(),
            extension: None,
        };

        let mut list = ListInfo {
            info: wave.info().clone(),
        };
        list.info.insert(String::from("ISFT"), options.software_tag.clone());

        let data_size = frame_size * samples_count as u64;
        let riff_size = 4 + (8 + fmt.payload_size() as u64) + (8 + list.payload_size() as u64) + (8 + data_size);
        if riff_size > u32::MAX as u64 {
            return Err(AudioWriteError::ChunkSizeTooBig(format!(
                "the RIFF container would be {riff_size} bytes long"
            )));
        }

        ChunkHeader::new(b"RIFF", riff_size as u32).write(writer)?;
        writer.write_all(b"WAVE")?;
        fmt.write(writer)?;
        list.write(writer)?;

        ChunkHeader::new(b"data", data_size as u32).write(writer)?;
        let encoder = sample_type.get_encoder();
        let mut buf = Vec::<u8>::with_capacity(data_size as usize);
        for i in 0..samples_count {
            for channel in channels.iter() {
                encoder(channel[i], &mut buf);
            }
        }
        writer.write_all(&buf)?;
        Ok(())
    }

    /// * The byte length `write()` would produce.
    pub fn written_size(wave: &WaveFile, options: &WriterOptions) -> u64 {
        let mut info = wave.info().clone();
        info.insert(String::from("ISFT"), options.software_tag.clone());
        let list = ListInfo { info };
        let data_size = wave.channel_count() as u64 * (wave.bits_per_sample() as u64 / 8) * wave.samples_count() as u64;
        12 + (8 + FmtChunk::BASIC_SIZE as u64) + (8 + list.payload_size() as u64) + (8 + data_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readwrite::LeIO;

    fn written(wave: &WaveFile, options: &WriterOptions) -> Vec<u8> {
        let mut bytes = Vec::new();
        WaveWriter::write(wave, &mut bytes, options).unwrap();
        bytes
    }

    #[test]
    fn layout_of_a_tiny_stereo_file() {
        let mut wave = WaveFile::new();
        wave.set_channels(vec![vec![1.0, 0.0], vec![-1.0, -0.5]]).unwrap();
        let options = WriterOptions {
            software_tag: String::from("abc"),
        };
        let bytes = written(&wave, &options);

        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32::from_le_slice(&bytes[4..8]) as usize, bytes.len() - 8);
        assert_eq!(&bytes[8..12], b"WAVE");

        // fmt: always PCM, 16 bytes
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32::from_le_slice(&bytes[16..20]), 16);
        assert_eq!(u16::from_le_slice(&bytes[20..22]), 1);
        assert_eq!(u16::from_le_slice(&bytes[22..24]), 2);
        assert_eq!(u32::from_le_slice(&bytes[24..28]), 44100);
        assert_eq!(u32::from_le_slice(&bytes[28..32]), 44100 * 4);
        assert_eq!(u16::from_le_slice(&bytes[32..34]), 4);
        assert_eq!(u16::from_le_slice(&bytes[34..36]), 16);

        // LIST/INFO/ISFT "abc\0"
        assert_eq!(&bytes[36..40], b"LIST");
        assert_eq!(u32::from_le_slice(&bytes[40..44]), 16);
        assert_eq!(&bytes[44..48], b"INFO");
        assert_eq!(&bytes[48..52], b"ISFT");
        assert_eq!(u32::from_le_slice(&bytes[52..56]), 4);
        assert_eq!(&bytes[56..60], b"abc\0");

        // data: sample index outer, channel index inner
        assert_eq!(&bytes[60..64], b"data");
        assert_eq!(u32::from_le_slice(&bytes[64..68]), 8);
        assert_eq!(&bytes[68..], &[0xFF, 0x7F, 0x00, 0x80, 0x00, 0x00, 0x00, 0xC0]);
        assert_eq!(bytes.len() as u64, WaveWriter::written_size(&wave, &options));
    }

    #[test]
    fn default_tag_names_the_crate() {
        assert!(WriterOptions::default().software_tag.starts_with("wavparser-"));
    }

    #[test]
    fn unsupported_depth_is_an_error() {
        let mut wave = WaveFile::new();
        wave.set_bits_per_sample(12);
        assert!(matches!(
            WaveWriter::write(&wave, &mut Vec::new(), &WriterOptions::default()),
            Err(AudioWriteError::Unsupported(_))
        ));
    }
}

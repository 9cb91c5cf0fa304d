use std::io::{ErrorKind, Read};

use log::{debug, warn};

use crate::errors::AudioReadError;
use crate::readwrite::{LeIO, Reader, read_flag};
use crate::samplecodec::WaveSampleType;
use crate::wavcore::{AudioFormat, ChunkHeader, FmtChunk, ListInfo};
use crate::wavefile::WaveFile;

/// * The parsed `fmt ` chunk together with what was resolved from it.
#[derive(Debug, Clone, Copy)]
struct FormatInfo {
    fmt: FmtChunk,
    audio_format: AudioFormat,
    sample_type: WaveSampleType,
}

/// * The RIFF container reader. Walks the chunks from the current position of the reader and builds a `WaveFile`.
#[derive(Debug)]
pub struct WaveReader<'a, R>
where
    R: Reader + ?Sized,
{
    reader: &'a mut R,
    riff_end: u64,
    format: Option<FormatInfo>,
    channels: Option<Vec<Vec<f64>>>,
    start_data_offset: u64,
    info: ListInfo,
}

impl<'a, R> WaveReader<'a, R>
where
    R: Reader + ?Sized,
{
    /// * Parse a whole RIFF/WAVE file. The reader must be at the `RIFF` flag.
    pub fn parse(reader: &'a mut R) -> Result<WaveFile, AudioReadError> {
        let start_of_riff = reader.stream_position()?;
        if &read_flag(reader)? != b"RIFF" {
            return Err(AudioReadError::NotRiff);
        }
        let riff_size = u32::read_le(reader)?;
        if &read_flag(reader)? != b"WAVE" {
            return Err(AudioReadError::NotWave);
        }

        let mut this = Self {
            reader,
            riff_end: start_of_riff + riff_size as u64 + 8,
            format: None,
            channels: None,
            start_data_offset: 0,
            info: ListInfo::new(),
        };
        this.read_chunks()?;
        this.finish()
    }

    fn read_chunks(&mut self) -> Result<(), AudioReadError> {
        loop {
            let position = self.reader.stream_position()?;
            if position + 8 > self.riff_end {
                warn!(
                    "{} bytes at 0x{position:x} hit the end of the RIFF container but can't hold a chunk header",
                    self.riff_end.saturating_sub(position)
                );
                return Ok(());
            }
            let chunk = match ChunkHeader::read(self.reader) {
                Ok(chunk) => chunk,
                Err(e) if e.kind() == ErrorKind::UnexpectedEof && self.channels.is_some() => {
                    warn!("The file ends at 0x{position:x} before the end of the RIFF container at 0x{:x}", self.riff_end);
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            let chunk_end = chunk.chunk_end();
            if chunk_end > self.riff_end {
                return Err(AudioReadError::ChunkOverflow {
                    chunk: chunk.flag_str(),
                    end: chunk_end,
                    bound: self.riff_end,
                });
            }
            let is_last_chunk = chunk_end == self.riff_end;

            match &chunk.flag {
                b"fmt " => {
                    if self.format.is_some() {
                        return Err(AudioReadError::FormatError(String::from("Duplicated \"fmt \" chunk")));
                    }
                    self.format = Some(Self::interpret_fmt(FmtChunk::read(self.reader, chunk.size)?)?);
                }
                b"data" => {
                    let Some(format) = self.format else {
                        return Err(AudioReadError::DataBeforeFormat);
                    };
                    if self.channels.is_some() {
                        return Err(AudioReadError::FormatError(String::from("Duplicated \"data\" chunk")));
                    }
                    self.start_data_offset = chunk.chunk_start_pos;
                    self.channels = Some(self.read_data(&format, chunk.size)?);
                }
                b"LIST" => match ListInfo::read(self.reader, chunk.size) {
                    Ok(Some(list)) => self.info.info.extend(list.info),
                    Ok(None) => debug!("Skipping a \"LIST\" chunk that isn't an \"INFO\" list"),
                    Err(e) => warn!("Skipping a malformed \"LIST\" chunk at 0x{:x}: {e}", chunk.chunk_start_pos),
                },
                _ => {
                    debug!("Skipping the \"{}\" chunk of {} bytes", chunk.flag_str(), chunk.size);
                }
            }

            if is_last_chunk {
                return Ok(());
            }
            chunk.seek_to_next_chunk(self.reader)?;
        }
    }

    fn interpret_fmt(fmt: FmtChunk) -> Result<FormatInfo, AudioReadError> {
        let audio_format = fmt.audio_format()?;
        let sample_type = WaveSampleType::resolve(fmt.bits_per_sample, &audio_format)?;
        if fmt.channels == 0 {
            return Err(AudioReadError::FormatError(String::from("the \"fmt \" chunk declares zero channels")));
        }
        if fmt.sample_rate == 0 {
            return Err(AudioReadError::FormatError(String::from("the \"fmt \" chunk declares a zero sample rate")));
        }
        let frame_size = fmt.channels as u64 * sample_type.sizeof() as u64;
        if (fmt.block_align as u64) < frame_size {
            return Err(AudioReadError::FormatError(format!(
                "block align {} can't hold {} channels of {}",
                fmt.block_align, fmt.channels, sample_type
            )));
        }
        Ok(FormatInfo {
            fmt,
            audio_format,
            sample_type,
        })
    }

    /// * Decode the `data` chunk into one buffer per channel. The padding bytes `block_align` adds to each frame are skipped.
    fn read_data(&mut self, format: &FormatInfo, chunk_size: u32) -> Result<Vec<Vec<f64>>, AudioReadError> {
        let block_align = format.fmt.block_align as usize;
        let sample_size = format.sample_type.sizeof() as usize;
        let num_channels = format.fmt.channels as usize;
        let frame_size = num_channels * sample_size;
        let samples_count = chunk_size as usize / block_align;

        let mut data = Vec::<u8>::new();
        (&mut *self.reader).take(chunk_size as u64).read_to_end(&mut data)?;
        if data.len() < chunk_size as usize {
            warn!(
                "The \"data\" chunk declares {chunk_size} bytes but only {} bytes are there, the missing samples stay silent",
                data.len()
            );
        }

        let decoder = format.sample_type.get_decoder();
        let mut channels = vec![vec![0.0; samples_count]; num_channels];
        for (i, frame) in data.chunks_exact(block_align).take(samples_count).enumerate() {
            for (channel, sample) in channels.iter_mut().zip(frame[..frame_size].chunks_exact(sample_size)) {
                channel[i] = decoder(sample);
            }
        }
        Ok(channels)
    }

    fn finish(self) -> Result<WaveFile, AudioReadError> {
        let Some(format) = self.format else {
            return Err(AudioReadError::MissingData(String::from("fmt ")));
        };
        let Some(channels) = self.channels else {
            return Err(AudioReadError::MissingData(String::from("data")));
        };
        Ok(WaveFile::from_parts(
            channels,
            format.fmt.sample_rate,
            format.fmt.bits_per_sample,
            format.fmt.block_align,
            format.audio_format,
            self.start_data_offset,
            self.info.info,
        ))
    }
}

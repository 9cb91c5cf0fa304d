use std::{
    collections::BTreeMap,
    fmt::{self, Display, Formatter},
    fs::{self, File},
    io::{BufReader, BufWriter, Cursor, Write},
    path::Path,
    time::Duration,
};

use log::debug;

use crate::decoders;
use crate::errors::{AudioError, AudioReadError, AudioWriteError};
use crate::readwrite::Reader;
use crate::wavcore::AudioFormat;
use crate::wavreader::WaveReader;
use crate::wavwriter::{WaveWriter, WriterOptions};

const TICKS_PER_SECOND: u128 = 10_000_000;
const NANOS_PER_TICK: u128 = 100;

/// * A decoded wave file: one buffer of normalized samples per channel, plus the format it came with.
/// * Every channel always has the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveFile {
    channels: Vec<Vec<f64>>,
    sample_rate: u32,
    bits_per_sample: u16,
    block_align: u16,
    audio_format: AudioFormat,
    start_data_offset: u64,
    info: BTreeMap<String, String>,
}

impl Default for WaveFile {
    fn default() -> Self {
        Self {
            channels: vec![Vec::new(), Vec::new()],
            sample_rate: 44100,
            bits_per_sample: 16,
            block_align: 4,
            audio_format: AudioFormat::Pcm,
            start_data_offset: 0,
            info: BTreeMap::new(),
        }
    }
}

impl WaveFile {
    /// * An empty stereo 44100 Hz 16-bit document.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        channels: Vec<Vec<f64>>,
        sample_rate: u32,
        bits_per_sample: u16,
        block_align: u16,
        audio_format: AudioFormat,
        start_data_offset: u64,
        info: BTreeMap<String, String>,
    ) -> Self {
        Self {
            channels,
            sample_rate,
            bits_per_sample,
            block_align,
            audio_format,
            start_data_offset,
            info,
        }
    }

    /// * Same metadata, different samples. Used by every transform so the source document is never touched.
    pub(crate) fn with_channels(&self, channels: Vec<Vec<f64>>) -> Self {
        let mut ret = Self {
            channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            block_align: self.block_align,
            audio_format: self.audio_format,
            start_data_offset: self.start_data_offset,
            info: self.info.clone(),
        };
        if ret.channels.len() != self.channels.len() {
            ret.block_align = ret.canonical_block_align();
        }
        ret
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AudioReadError> {
        WaveReader::parse(&mut Cursor::new(bytes))
    }

    pub fn from_reader<R: Reader + ?Sized>(reader: &mut R) -> Result<Self, AudioReadError> {
        WaveReader::parse(reader)
    }

    /// * Read the whole file into memory, then parse it. `.flac` files go to the FLAC decoder.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AudioReadError> {
        let path = path.as_ref();
        if decoders::is_flac_path(path) {
            return Self::from_decoded(decoders::decode_flac(path)?);
        }
        let bytes = fs::read(path)?;
        debug!("Parsing {} ({} bytes)", path.display(), bytes.len());
        Self::from_bytes(&bytes)
    }

    /// * Parse straight from the file through a `BufReader`. The result is identical to `open()`.
    pub fn open_unbuffered<P: AsRef<Path>>(path: P) -> Result<Self, AudioReadError> {
        let path = path.as_ref();
        if decoders::is_flac_path(path) {
            return Self::from_decoded(decoders::decode_flac(path)?);
        }
        let mut reader = BufReader::new(File::open(path)?);
        Self::from_reader(&mut reader)
    }

    /// * `open()`, then resample to `sample_rate` when one is given.
    pub fn open_with_sample_rate<P: AsRef<Path>>(path: P, sample_rate: Option<u32>) -> Result<Self, AudioReadError> {
        let wave = Self::open(path)?;
        match sample_rate {
            Some(sample_rate) => Ok(wave.change_sample_rate(sample_rate)?),
            None => Ok(wave),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, AudioWriteError> {
        self.to_bytes_with(&WriterOptions::default())
    }

    pub fn to_bytes_with(&self, options: &WriterOptions) -> Result<Vec<u8>, AudioWriteError> {
        let mut bytes = Vec::with_capacity(WaveWriter::written_size(self, options) as usize);
        WaveWriter::write(self, &mut bytes, options)?;
        Ok(bytes)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), AudioWriteError> {
        self.save_with(path, &WriterOptions::default())
    }

    pub fn save_with<P: AsRef<Path>>(&self, path: P, options: &WriterOptions) -> Result<(), AudioWriteError> {
        let mut writer = BufWriter::new(File::create(path)?);
        WaveWriter::write(self, &mut writer, options)?;
        writer.flush()?;
        Ok(())
    }

    pub fn channels(&self) -> &[Vec<f64>] {
        &self.channels
    }

    pub fn channel(&self, index: usize) -> Option<&[f64]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// * Samples can be changed in place, the length can't.
    pub fn channel_mut(&mut self, index: usize) -> Option<&mut [f64]> {
        self.channels.get_mut(index).map(Vec::as_mut_slice)
    }

    /// * Replace the whole sample matrix. There must be at least one channel and every channel must have the same length.
    pub fn set_channels(&mut self, channels: Vec<Vec<f64>>) -> Result<(), AudioError> {
        let Some(first) = channels.first() else {
            return Err(AudioError::InvalidArguments(String::from("a wave file needs at least one channel")));
        };
        if channels.len() > u16::MAX as usize {
            return Err(AudioError::InvalidArguments(format!("{} channels are too many", channels.len())));
        }
        if channels.iter().any(|channel| channel.len() != first.len()) {
            return Err(AudioError::InvalidArguments(String::from("the lengths of the channels are not equal")));
        }
        self.channels = channels;
        self.block_align = self.canonical_block_align();
        Ok(())
    }

    pub fn into_channels(self) -> Vec<Vec<f64>> {
        self.channels
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    pub fn samples_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// * Relabel the samples with another rate, nothing gets resampled. See `change_sample_rate()` for that.
    pub fn set_sample_rate(&mut self, sample_rate: u32) -> Result<(), AudioError> {
        if sample_rate == 0 {
            return Err(AudioError::InvalidArguments(String::from("the sample rate must be positive")));
        }
        self.sample_rate = sample_rate;
        Ok(())
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    /// * The bit depth the document is written with. The writer rejects depths outside 8, 16, 24, 32, 64.
    pub fn set_bits_per_sample(&mut self, bits_per_sample: u16) {
        self.bits_per_sample = bits_per_sample;
        self.block_align = self.canonical_block_align();
    }

    pub fn block_align(&self) -> u16 {
        self.block_align
    }

    fn canonical_block_align(&self) -> u16 {
        (self.channels.len() as u64 * (self.bits_per_sample / 8) as u64).min(u16::MAX as u64) as u16
    }

    pub fn audio_format(&self) -> AudioFormat {
        self.audio_format
    }

    /// * The format tag from the sub-format GUID, only for extensible files.
    pub fn ext_audio_format(&self) -> Option<u16> {
        match self.audio_format {
            AudioFormat::Extensible { guid, .. } => Some(guid.format_tag()),
            _ => None,
        }
    }

    /// * Where the first sample byte was in the parsed source.
    pub fn start_data_offset(&self) -> u64 {
        self.start_data_offset
    }

    /// * The `LIST`/`INFO` entries, e.g. `ISFT`.
    pub fn info(&self) -> &BTreeMap<String, String> {
        &self.info
    }

    pub fn info_mut(&mut self) -> &mut BTreeMap<String, String> {
        &mut self.info
    }

    /// * The time `samples_count` samples take, rounded half-to-even to 100 ns ticks.
    pub fn get_span_for_samples(&self, samples_count: u64) -> Duration {
        let numerator = samples_count as u128 * TICKS_PER_SECOND;
        let rate = self.sample_rate as u128;
        let mut ticks = numerator / rate;
        let twice_remainder = (numerator % rate) * 2;
        if twice_remainder > rate || (twice_remainder == rate && ticks & 1 == 1) {
            ticks += 1;
        }
        Duration::new(
            (ticks / TICKS_PER_SECOND) as u64,
            ((ticks % TICKS_PER_SECOND) * NANOS_PER_TICK) as u32,
        )
    }

    /// * How many whole samples fit into `span`.
    pub fn get_floor_samples_count(&self, span: Duration) -> u64 {
        (span.as_nanos() * self.sample_rate as u128 / 1_000_000_000) as u64
    }

    /// * Negative or non-finite spans hold no samples.
    pub fn get_floor_samples_count_secs(&self, seconds: f64) -> u64 {
        match Duration::try_from_secs_f64(seconds) {
            Ok(span) => self.get_floor_samples_count(span),
            Err(_) => 0,
        }
    }

    pub fn duration(&self) -> Duration {
        self.get_span_for_samples(self.samples_count() as u64)
    }

    /// * Append `floor(duration * sample_rate)` zero samples to every channel.
    pub fn add_silence(&mut self, duration: Duration) {
        let count = self.get_floor_samples_count(duration) as usize;
        for channel in self.channels.iter_mut() {
            channel.resize(channel.len() + count, 0.0);
        }
    }
}

impl Display for WaveFile {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}Hz {} channels, {} bits", self.sample_rate, self.channel_count(), self.bits_per_sample)?;
        if self.samples_count() > 0 {
            write!(f, ", duration: {:?}", self.duration())?;
        }
        Ok(())
    }
}

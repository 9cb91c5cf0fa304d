use std::{
    collections::BTreeMap,
    fmt::{self, Debug, Display, Formatter},
    io::{self, Cursor, Read, Seek, SeekFrom, Write},
};

use crate::errors::AudioReadError;
use crate::readwrite::{LeIO, read_flag};

/// * The format tags this codec understands. Everything else is rejected while parsing the `fmt ` chunk.
pub mod format_tags {
    pub const WAVE_FORMAT_PCM: u16 = 0x0001;
    pub const WAVE_FORMAT_IEEE_FLOAT: u16 = 0x0003;
    pub const WAVE_FORMAT_EXTENSIBLE: u16 = 0xFFFE;
}

use format_tags::*;

/// * The sub-format GUIDs of `WAVE_FORMAT_EXTENSIBLE`. The first field carries the format tag.
pub mod guids {
    use super::GUID;

    pub const GUID_PCM_FORMAT: GUID = GUID(0x00000001, 0x0000, 0x0010, [0x80, 0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71]);
    pub const GUID_IEEE_FLOAT_FORMAT: GUID = GUID(0x00000003, 0x0000, 0x0010, [0x80, 0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71]);
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct GUID(pub u32, pub u16, pub u16, pub [u8; 8]);

impl GUID {
    pub fn read<T: Read + ?Sized>(r: &mut T) -> io::Result<Self> {
        let data1 = u32::read_le(r)?;
        let data2 = u16::read_le(r)?;
        let data3 = u16::read_le(r)?;
        let mut data4 = [0u8; 8];
        r.read_exact(&mut data4)?;
        Ok(Self(data1, data2, data3, data4))
    }

    pub fn write<T: Write + ?Sized>(&self, w: &mut T) -> io::Result<()> {
        self.0.write_le(w)?;
        self.1.write_le(w)?;
        self.2.write_le(w)?;
        w.write_all(&self.3)
    }

    /// * The first two bytes of the GUID as stored in the file, read as a little-endian `u16`.
    pub fn format_tag(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl Debug for GUID {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl Display for GUID {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{:08x}-{:04x}-{:04x}-{:02x}{:02x}-{:02x}{:02x}{:02x}{:02x}{:02x}{:02x}",
            self.0, self.1, self.2, self.3[0], self.3[1], self.3[2], self.3[3], self.3[4], self.3[5], self.3[6], self.3[7]
        )
    }
}

/// * How the samples of the `data` chunk are encoded, resolved once from the `fmt ` chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AudioFormat {
    #[default]
    Pcm,
    IeeeFloat,

    /// * `sub_format` is the resolved tag, either `WAVE_FORMAT_PCM` or `WAVE_FORMAT_IEEE_FLOAT`.
    Extensible { sub_format: u16, guid: GUID },
}

impl AudioFormat {
    /// * The tag written in the `fmt ` chunk.
    pub fn format_tag(&self) -> u16 {
        match self {
            Self::Pcm => WAVE_FORMAT_PCM,
            Self::IeeeFloat => WAVE_FORMAT_IEEE_FLOAT,
            Self::Extensible { .. } => WAVE_FORMAT_EXTENSIBLE,
        }
    }

    /// * The tag that actually decides the sample codec.
    pub fn resolved_tag(&self) -> u16 {
        match self {
            Self::Extensible { sub_format, .. } => *sub_format,
            other => other.format_tag(),
        }
    }

    pub fn is_float(&self) -> bool {
        self.resolved_tag() == WAVE_FORMAT_IEEE_FLOAT
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkHeader {
    /// * The 4-byte chunk id
    pub flag: [u8; 4],

    /// * The declared payload size
    pub size: u32,

    /// * Where the payload begins
    pub chunk_start_pos: u64,
}

impl ChunkHeader {
    pub fn new(flag: &[u8; 4], size: u32) -> Self {
        Self {
            flag: *flag,
            size,
            chunk_start_pos: 0,
        }
    }

    pub fn read<R: Read + Seek + ?Sized>(r: &mut R) -> io::Result<Self> {
        let flag = read_flag(r)?;
        let size = u32::read_le(r)?;
        Ok(Self {
            flag,
            size,
            chunk_start_pos: r.stream_position()?,
        })
    }

    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.flag)?;
        self.size.write_le(w)
    }

    pub fn chunk_end(&self) -> u64 {
        self.chunk_start_pos + self.size as u64
    }

    pub fn seek_to_next_chunk<R: Read + Seek + ?Sized>(&self, r: &mut R) -> io::Result<u64> {
        r.seek(SeekFrom::Start(self.chunk_end()))
    }

    pub fn flag_str(&self) -> String {
        String::from_utf8_lossy(&self.flag).to_string()
    }
}

/// * The `WAVEFORMATEXTENSIBLE` part of the `fmt ` chunk
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtensibleData {
    pub valid_bits_per_sample: u16,
    pub channel_mask: u32,
    pub sub_format: GUID,
}

impl ExtensibleData {
    pub const SIZE: u16 = 22;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FmtChunk {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub extension: Option<ExtensibleData>,
}

impl FmtChunk {
    /// * The size of the basic `WAVEFORMAT` + `wBitsPerSample` part.
    pub const BASIC_SIZE: u32 = 16;

    /// * A plain PCM `fmt ` chunk with a tight block align.
    pub fn new_pcm(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        let block_align = channels * (bits_per_sample / 8);
        Self {
            format_tag: WAVE_FORMAT_PCM,
            channels,
            sample_rate,
            byte_rate: sample_rate.wrapping_mul(block_align as u32),
            block_align,
            bits_per_sample,
            extension: None,
        }
    }

    /// * Parse the payload of a `fmt ` chunk of `chunk_size` bytes. The reader must be at the start of the payload.
    pub fn read<R: Read + ?Sized>(r: &mut R, chunk_size: u32) -> Result<Self, AudioReadError> {
        if chunk_size < Self::BASIC_SIZE {
            return Err(AudioReadError::FormatError(format!(
                "the \"fmt \" chunk is only {chunk_size} bytes long"
            )));
        }
        let mut payload = vec![0u8; chunk_size as usize];
        r.read_exact(&mut payload)?;
        Self::parse(&payload)
    }

    fn parse(payload: &[u8]) -> Result<Self, AudioReadError> {
        let mut r = Cursor::new(payload);
        let format_tag = u16::read_le(&mut r)?;
        match format_tag {
            WAVE_FORMAT_PCM | WAVE_FORMAT_IEEE_FLOAT | WAVE_FORMAT_EXTENSIBLE => (),
            other => return Err(AudioReadError::UnsupportedFormat(other)),
        }
        let mut ret = Self {
            format_tag,
            channels: u16::read_le(&mut r)?,
            sample_rate: u32::read_le(&mut r)?,
            byte_rate: u32::read_le(&mut r)?,
            block_align: u16::read_le(&mut r)?,
            bits_per_sample: u16::read_le(&mut r)?,
            extension: None,
        };
        let is_extensible = format_tag == WAVE_FORMAT_EXTENSIBLE;

        let header_left = payload.len() as u64 - Self::BASIC_SIZE as u64;
        if header_left == 0 {
            if is_extensible {
                return Err(AudioReadError::MissingExtension);
            }
            return Ok(ret);
        }
        if header_left < 2 {
            if is_extensible {
                return Err(AudioReadError::MissingExtension);
            }
            // A stray byte, nothing to interpret.
            return Ok(ret);
        }

        let extra_size = u16::read_le(&mut r)?;
        if extra_size as u64 != header_left - 2 {
            return Err(AudioReadError::MalformedExtension {
                declared: extra_size,
                actual: header_left - 2,
            });
        }
        if extra_size == 0 {
            if is_extensible {
                return Err(AudioReadError::EmptyExtension);
            }
            return Ok(ret);
        }
        if extra_size < ExtensibleData::SIZE {
            return Err(AudioReadError::MalformedExtension {
                declared: ExtensibleData::SIZE,
                actual: extra_size as u64,
            });
        }

        let valid_bits_per_sample = u16::read_le(&mut r)?;
        if valid_bits_per_sample != ret.bits_per_sample {
            return Err(AudioReadError::MismatchedValidBits {
                valid_bits: valid_bits_per_sample,
                bits_per_sample: ret.bits_per_sample,
            });
        }
        if !is_extensible {
            // The sub-format GUID only means something under WAVE_FORMAT_EXTENSIBLE.
            return Ok(ret);
        }
        let channel_mask = u32::read_le(&mut r)?;
        let sub_format = GUID::read(&mut r)?;
        ret.extension = Some(ExtensibleData {
            valid_bits_per_sample,
            channel_mask,
            sub_format,
        });
        Ok(ret)
    }

    /// * Resolve the tagged audio format, following the sub-format GUID of an extensible header.
    pub fn audio_format(&self) -> Result<AudioFormat, AudioReadError> {
        match (self.format_tag, &self.extension) {
            (WAVE_FORMAT_PCM, _) => Ok(AudioFormat::Pcm),
            (WAVE_FORMAT_IEEE_FLOAT, _) => Ok(AudioFormat::IeeeFloat),
            (WAVE_FORMAT_EXTENSIBLE, Some(extension)) => {
                let sub_format = extension.sub_format.format_tag();
                match sub_format {
                    WAVE_FORMAT_PCM | WAVE_FORMAT_IEEE_FLOAT => Ok(AudioFormat::Extensible {
                        sub_format,
                        guid: extension.sub_format,
                    }),
                    other => Err(AudioReadError::UnsupportedSubFormat(other)),
                }
            }
            (WAVE_FORMAT_EXTENSIBLE, None) => Err(AudioReadError::MissingExtension),
            (other, _) => Err(AudioReadError::UnsupportedFormat(other)),
        }
    }

    /// * The payload size as written by `write()`.
    pub fn payload_size(&self) -> u32 {
        match self.extension {
            None => Self::BASIC_SIZE,
            Some(_) => Self::BASIC_SIZE + 2 + ExtensibleData::SIZE as u32,
        }
    }

    /// * Write the whole chunk, header included.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        ChunkHeader::new(b"fmt ", self.payload_size()).write(w)?;
        self.format_tag.write_le(w)?;
        self.channels.write_le(w)?;
        self.sample_rate.write_le(w)?;
        self.byte_rate.write_le(w)?;
        self.block_align.write_le(w)?;
        self.bits_per_sample.write_le(w)?;
        if let Some(extension) = self.extension {
            ExtensibleData::SIZE.write_le(w)?;
            extension.valid_bits_per_sample.write_le(w)?;
            extension.channel_mask.write_le(w)?;
            extension.sub_format.write(w)?;
        }
        Ok(())
    }
}

/// * The `INFO` list: 4-byte tag to text, e.g. `ISFT` to the name of the software that wrote the file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListInfo {
    pub info: BTreeMap<String, String>,
}

impl ListInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tag: &str, text: &str) -> Self {
        self.info.insert(tag.to_string(), text.to_string());
        self
    }

    /// * Parse the payload of a `LIST` chunk. Returns `None` when the list isn't an `INFO` list.
    pub fn read<R: Read + ?Sized>(r: &mut R, chunk_size: u32) -> Result<Option<Self>, AudioReadError> {
        if chunk_size < 4 {
            return Err(AudioReadError::FormatError(String::from(
                "the \"LIST\" chunk is too small to hold the list type",
            )));
        }
        let mut payload = vec![0u8; chunk_size as usize];
        r.read_exact(&mut payload)?;
        if &payload[0..4] != b"INFO" {
            return Ok(None);
        }

        let mut ret = Self::new();
        let mut pos = 4usize;
        while pos + 8 <= payload.len() {
            let tag = String::from_utf8_lossy(&payload[pos..pos + 4]).to_string();
            let size = u32::from_le_slice(&payload[pos + 4..pos + 8]) as usize;
            pos += 8;
            let end = pos + size;
            if end > payload.len() {
                return Err(AudioReadError::FormatError(format!(
                    "the \"{tag}\" entry of the \"INFO\" list overruns its \"LIST\" chunk"
                )));
            }
            let text = String::from_utf8_lossy(&payload[pos..end]);
            ret.info.insert(tag, text.trim_end_matches('\0').to_string());
            pos = end + (size & 1);
        }
        Ok(Some(ret))
    }

    fn entry_size(text: &str) -> u32 {
        // Text, a NUL terminator, then padding up to an even length.
        let size = text.len() as u32 + 1;
        size + (size & 1)
    }

    pub fn payload_size(&self) -> u32 {
        4 + self
            .info
            .values()
            .map(|text| 8 + Self::entry_size(text))
            .sum::<u32>()
    }

    /// * Write the whole `LIST` chunk, header included. Every entry is NUL-terminated and even-padded.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        ChunkHeader::new(b"LIST", self.payload_size()).write(w)?;
        w.write_all(b"INFO")?;
        for (tag, text) in self.info.iter() {
            let mut flag = [b' '; 4];
            for (dst, src) in flag.iter_mut().zip(tag.bytes()) {
                *dst = src;
            }
            let size = Self::entry_size(text);
            ChunkHeader::new(&flag, size).write(w)?;
            w.write_all(text.as_bytes())?;
            w.write_all(&vec![0u8; size as usize - text.len()])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::guids::*;

    fn basic_fmt(format_tag: u16, bits: u16) -> Vec<u8> {
        let mut buf = Vec::new();
        format_tag.write_le(&mut buf).unwrap();
        2u16.write_le(&mut buf).unwrap(); // channels
        44100u32.write_le(&mut buf).unwrap();
        (44100u32 * 2 * (bits as u32 / 8)).write_le(&mut buf).unwrap();
        (2 * bits / 8).write_le(&mut buf).unwrap();
        bits.write_le(&mut buf).unwrap();
        buf
    }

    fn extensible_fmt(valid_bits: u16, sub_format: GUID) -> Vec<u8> {
        let mut buf = basic_fmt(WAVE_FORMAT_EXTENSIBLE, 32);
        22u16.write_le(&mut buf).unwrap();
        valid_bits.write_le(&mut buf).unwrap();
        3u32.write_le(&mut buf).unwrap(); // front left | front right
        sub_format.write(&mut buf).unwrap();
        buf
    }

    fn read_fmt(payload: &[u8]) -> Result<FmtChunk, AudioReadError> {
        FmtChunk::read(&mut Cursor::new(payload), payload.len() as u32)
    }

    #[test]
    fn plain_pcm_header() {
        let fmt = read_fmt(&basic_fmt(WAVE_FORMAT_PCM, 16)).unwrap();
        assert_eq!(fmt.channels, 2);
        assert_eq!(fmt.sample_rate, 44100);
        assert_eq!(fmt.block_align, 4);
        assert_eq!(fmt.audio_format().unwrap(), AudioFormat::Pcm);
    }

    #[test]
    fn pcm_header_with_empty_extra_block() {
        let mut payload = basic_fmt(WAVE_FORMAT_IEEE_FLOAT, 32);
        0u16.write_le(&mut payload).unwrap();
        let fmt = read_fmt(&payload).unwrap();
        assert_eq!(fmt.audio_format().unwrap(), AudioFormat::IeeeFloat);
        assert!(fmt.extension.is_none());
    }

    #[test]
    fn unknown_format_tag_is_rejected() {
        assert_eq!(read_fmt(&basic_fmt(0x0002, 4)), Err(AudioReadError::UnsupportedFormat(0x0002)));
    }

    #[test]
    fn too_short_header_is_rejected() {
        let payload = basic_fmt(WAVE_FORMAT_PCM, 16);
        assert!(matches!(read_fmt(&payload[..14]), Err(AudioReadError::FormatError(_))));
    }

    #[test]
    fn extensible_without_extension() {
        assert_eq!(read_fmt(&basic_fmt(WAVE_FORMAT_EXTENSIBLE, 16)), Err(AudioReadError::MissingExtension));

        let mut payload = basic_fmt(WAVE_FORMAT_EXTENSIBLE, 16);
        0u16.write_le(&mut payload).unwrap();
        assert_eq!(read_fmt(&payload), Err(AudioReadError::EmptyExtension));
    }

    #[test]
    fn extra_size_must_match_header_size() {
        let mut payload = basic_fmt(WAVE_FORMAT_PCM, 16);
        4u16.write_le(&mut payload).unwrap();
        payload.extend_from_slice(&[0, 0]);
        assert_eq!(
            read_fmt(&payload),
            Err(AudioReadError::MalformedExtension { declared: 4, actual: 2 })
        );
    }

    #[test]
    fn pcm_extra_block_is_checked_too() {
        let mut payload = basic_fmt(WAVE_FORMAT_PCM, 16);
        22u16.write_le(&mut payload).unwrap();
        12u16.write_le(&mut payload).unwrap(); // valid bits
        payload.extend_from_slice(&[0u8; 20]);
        assert_eq!(
            read_fmt(&payload),
            Err(AudioReadError::MismatchedValidBits { valid_bits: 12, bits_per_sample: 16 })
        );

        // Matching valid bits pass, the GUID is ignored.
        payload[18..20].copy_from_slice(&16u16.to_le_bytes());
        let fmt = read_fmt(&payload).unwrap();
        assert_eq!(fmt.audio_format().unwrap(), AudioFormat::Pcm);
        assert!(fmt.extension.is_none());

        let mut payload = basic_fmt(WAVE_FORMAT_IEEE_FLOAT, 32);
        2u16.write_le(&mut payload).unwrap();
        32u16.write_le(&mut payload).unwrap();
        assert_eq!(
            read_fmt(&payload),
            Err(AudioReadError::MalformedExtension { declared: 22, actual: 2 })
        );
    }

    #[test]
    fn extensible_float_resolves_to_float() {
        let fmt = read_fmt(&extensible_fmt(32, GUID_IEEE_FLOAT_FORMAT)).unwrap();
        assert_eq!(fmt.extension.unwrap().channel_mask, 3);
        let format = fmt.audio_format().unwrap();
        assert_eq!(format, AudioFormat::Extensible { sub_format: WAVE_FORMAT_IEEE_FLOAT, guid: GUID_IEEE_FLOAT_FORMAT });
        assert!(format.is_float());
        assert_eq!(format.format_tag(), WAVE_FORMAT_EXTENSIBLE);
    }

    #[test]
    fn extensible_valid_bits_must_match() {
        assert_eq!(
            read_fmt(&extensible_fmt(24, GUID_PCM_FORMAT)),
            Err(AudioReadError::MismatchedValidBits { valid_bits: 24, bits_per_sample: 32 })
        );
    }

    #[test]
    fn unknown_sub_format_is_rejected() {
        let adpcm = GUID(0x00000002, 0x0000, 0x0010, [0x80, 0x00, 0x00, 0xaa, 0x00, 0x38, 0x9b, 0x71]);
        let fmt = read_fmt(&extensible_fmt(32, adpcm)).unwrap();
        assert_eq!(fmt.audio_format(), Err(AudioReadError::UnsupportedSubFormat(2)));
    }

    #[test]
    fn fmt_chunk_writes_back_identically() {
        let payload = extensible_fmt(32, GUID_PCM_FORMAT);
        let fmt = read_fmt(&payload).unwrap();
        let mut written = Vec::new();
        fmt.write(&mut written).unwrap();
        assert_eq!(&written[0..4], b"fmt ");
        assert_eq!(u32::from_le_slice(&written[4..8]), 40);
        assert_eq!(&written[8..], &payload[..]);
    }

    #[test]
    fn guid_formatting() {
        assert_eq!(GUID_PCM_FORMAT.to_string(), "00000001-0000-0010-8000-00aa00389b71");
        assert_eq!(GUID_IEEE_FLOAT_FORMAT.format_tag(), WAVE_FORMAT_IEEE_FLOAT);
    }

    #[test]
    fn list_info_is_even_padded_and_reads_back() {
        let list = ListInfo::new().with("ISFT", "wavparser-0.1.0");
        let mut written = Vec::new();
        list.write(&mut written).unwrap();
        // "wavparser-0.1.0" is 15 bytes, plus NUL makes 16
        assert_eq!(written.len(), 8 + 4 + 8 + 16);
        assert_eq!(u32::from_le_slice(&written[4..8]) as usize, written.len() - 8);
        assert_eq!(written.len() % 2, 0);

        let odd = ListInfo::new().with("ISFT", "abc");
        let mut odd_written = Vec::new();
        odd.write(&mut odd_written).unwrap();
        assert_eq!(u32::from_le_slice(&odd_written[16..20]), 4);

        let mut r = Cursor::new(&written[8..]);
        let read = ListInfo::read(&mut r, written.len() as u32 - 8).unwrap().unwrap();
        assert_eq!(read, list);
    }

    #[test]
    fn non_info_list_is_skipped() {
        let payload = b"adtl\0\0\0\0".to_vec();
        assert_eq!(ListInfo::read(&mut Cursor::new(&payload), 8).unwrap(), None);
    }
}

use std::{
    error,
    fmt::{Display, Formatter},
    io::{self, ErrorKind},
};

use resampler::ResamplerError;

/// * The error info from `std::io::Error` but this must contains the message
#[derive(Debug, Clone, PartialEq)]
pub struct IOErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl IOErrorInfo {
    pub fn new(kind: ErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

/// The error info for parsing an audio file. Every one of them aborts the parse.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioReadError {
    NotRiff,
    NotWave,
    ChunkOverflow { chunk: String, end: u64, bound: u64 },
    DataBeforeFormat,
    UnsupportedFormat(u16),
    UnsupportedSubFormat(u16),
    MissingExtension,
    MalformedExtension { declared: u16, actual: u64 },
    EmptyExtension,
    MismatchedValidBits { valid_bits: u16, bits_per_sample: u16 },
    UnsupportedBitsPerSample(u16),
    FormatError(String),
    MissingData(String),
    DecodeError(String),
    IOError(IOErrorInfo),
}

impl error::Error for AudioReadError {}

impl Display for AudioReadError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::NotRiff => write!(f, "This is not a RIFF file"),
            Self::NotWave => write!(f, "This is not a WAVE file"),
            Self::ChunkOverflow { chunk, end, bound } => write!(
                f,
                "The \"{chunk}\" chunk ends at 0x{end:x}, beyond the end of the RIFF container at 0x{bound:x}"
            ),
            Self::DataBeforeFormat => write!(f, "The \"data\" chunk appears before the \"fmt \" chunk"),
            Self::UnsupportedFormat(tag) => write!(f, "Unsupported wave format 0x{tag:04x}, not a plain PCM or IEEE float file"),
            Self::UnsupportedSubFormat(tag) => write!(f, "Unsupported extensible sub format 0x{tag:04x}"),
            Self::MissingExtension => write!(f, "The extensible \"fmt \" chunk doesn't contain the additional header"),
            Self::MalformedExtension { declared, actual } => write!(
                f,
                "The additional header of the \"fmt \" chunk is malformed, it declares {declared} bytes but {actual} bytes are left"
            ),
            Self::EmptyExtension => write!(f, "The extensible \"fmt \" chunk contains an empty additional header"),
            Self::MismatchedValidBits { valid_bits, bits_per_sample } => write!(
                f,
                "Unsupported: valid bits per sample {valid_bits} isn't equal to bits per sample {bits_per_sample}"
            ),
            Self::UnsupportedBitsPerSample(bits) => write!(f, "This bits per sample ({bits}) is not implemented"),
            Self::FormatError(info) => write!(f, "Invalid format: {info}"),
            Self::MissingData(data) => write!(f, "Missing data: \"{data}\""),
            Self::DecodeError(info) => write!(f, "Decode error: {info}"),
            Self::IOError(ioerror) => write!(f, "IO error: {:?}", ioerror),
        }
    }
}

impl From<io::Error> for AudioReadError {
    fn from(ioerr: io::Error) -> Self {
        AudioReadError::IOError(IOErrorInfo {
            kind: ioerr.kind(),
            message: ioerr.to_string(),
        })
    }
}

/// The error info for writing an audio file
#[derive(Debug, Clone, PartialEq)]
pub enum AudioWriteError {
    IOError(IOErrorInfo),
    Unsupported(String),
    ChannelsNotInSameSize,
    ChunkSizeTooBig(String),
}

impl error::Error for AudioWriteError {}

impl Display for AudioWriteError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::IOError(errkind) => write!(f, "IO error: {:?}", errkind),
            Self::Unsupported(info) => write!(f, "Unsupported format: {info}"),
            Self::ChannelsNotInSameSize => write!(f, "The lengths of the channels are not equal."),
            Self::ChunkSizeTooBig(info) => write!(f, "Chunk size is too big: {info}"),
        }
    }
}

impl From<io::Error> for AudioWriteError {
    fn from(ioerr: io::Error) -> Self {
        AudioWriteError::IOError(IOErrorInfo {
            kind: ioerr.kind(),
            message: ioerr.to_string(),
        })
    }
}

/// The error info for processing an audio file. The input documents stay untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum AudioError {
    IncompatibleChannelCounts(u16, u16),
    InvalidArguments(String),
}

impl error::Error for AudioError {}

impl Display for AudioError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::IncompatibleChannelCounts(c1, c2) => write!(f, "File 1 has {c1} channels. File 2 has {c2} channels. Can't merge"),
            Self::InvalidArguments(info) => write!(f, "Invalid arguments: {info}"),
        }
    }
}

impl From<ResamplerError> for AudioError {
    fn from(err: ResamplerError) -> Self {
        Self::InvalidArguments(err.to_string())
    }
}

impl From<AudioError> for AudioReadError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::IncompatibleChannelCounts(..) => Self::FormatError(err.to_string()),
            AudioError::InvalidArguments(info) => Self::FormatError(info),
        }
    }
}

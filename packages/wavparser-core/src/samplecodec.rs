use std::fmt::{self, Display, Formatter};

use crate::errors::{AudioReadError, AudioWriteError};
use crate::readwrite::LeIO;
use crate::wavcore::AudioFormat;

/// * The sample codecs of the `data` chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaveSampleType {
    U8,
    S16,
    S24,
    S32,
    S64,
    F32,
    F64,
}

use WaveSampleType::{F32, F64, S16, S24, S32, S64, U8};

/// * Decodes the bytes of one sample into `[-1.0, 1.0]`
pub type SampleDecoder = fn(&[u8]) -> f64;

/// * Encodes one sample and appends its bytes
pub type SampleEncoder = fn(f64, &mut Vec<u8>);

impl WaveSampleType {
    /// * Pick the codec from the bit depth and the resolved audio format.
    pub fn resolve(bits_per_sample: u16, audio_format: &AudioFormat) -> Result<Self, AudioReadError> {
        match (bits_per_sample, audio_format.is_float()) {
            (8, false) => Ok(U8),
            (16, false) => Ok(S16),
            (24, false) => Ok(S24),
            (32, false) => Ok(S32),
            (64, false) => Ok(S64),
            (32, true) => Ok(F32),
            (64, true) => Ok(F64),
            (other, _) => Err(AudioReadError::UnsupportedBitsPerSample(other)),
        }
    }

    /// * The writer only emits integer PCM.
    pub fn for_writing(bits_per_sample: u16) -> Result<Self, AudioWriteError> {
        match bits_per_sample {
            8 => Ok(U8),
            16 => Ok(S16),
            24 => Ok(S24),
            32 => Ok(S32),
            64 => Ok(S64),
            other => Err(AudioWriteError::Unsupported(format!("{other} bits per sample"))),
        }
    }

    pub fn sizeof(&self) -> u16 {
        match self {
            U8 => 1,
            S16 => 2,
            S24 => 3,
            S32 | F32 => 4,
            S64 | F64 => 8,
        }
    }

    pub fn bits(&self) -> u16 {
        self.sizeof() * 8
    }

    pub fn is_float(&self) -> bool {
        matches!(self, F32 | F64)
    }

    pub fn get_decoder(&self) -> SampleDecoder {
        match self {
            U8 => decode_u8,
            S16 => decode_s16,
            S24 => decode_s24,
            S32 => decode_s32,
            S64 => decode_s64,
            F32 => decode_f32,
            F64 => decode_f64,
        }
    }

    pub fn get_encoder(&self) -> SampleEncoder {
        match self {
            U8 => encode_u8,
            S16 => encode_s16,
            S24 => encode_s24,
            S32 => encode_s32,
            S64 => encode_s64,
            F32 => encode_f32,
            F64 => encode_f64,
        }
    }

    /// * `bytes` must hold at least `sizeof()` bytes.
    pub fn decode_sample(&self, bytes: &[u8]) -> f64 {
        (self.get_decoder())(bytes)
    }

    pub fn encode_sample(&self, value: f64, buf: &mut Vec<u8>) {
        (self.get_encoder())(value, buf)
    }
}

impl Display for WaveSampleType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            U8 => write!(f, "8-bit unsigned PCM"),
            S16 => write!(f, "16-bit PCM"),
            S24 => write!(f, "24-bit PCM"),
            S32 => write!(f, "32-bit PCM"),
            S64 => write!(f, "64-bit PCM"),
            F32 => write!(f, "32-bit IEEE float"),
            F64 => write!(f, "64-bit IEEE float"),
        }
    }
}

/// * Asymmetric full-scale normalization: the positive and the negative extremum both map to exactly 1.0 in magnitude.
#[inline(always)]
pub fn normalize(value: i64, max: f64, min_abs: f64) -> f64 {
    if value >= 0 {
        value as f64 / max
    } else {
        value as f64 / min_abs
    }
}

/// * The inverse of `normalize()`. The result is rounded to the nearest integer, out-of-range input saturates.
#[inline(always)]
pub fn quantize(value: f64, max: f64, min_abs: f64) -> i64 {
    let value = clamp_unit(value);
    if value >= 0.0 {
        (value * max).round() as i64
    } else {
        (value * min_abs).round() as i64
    }
}

/// * Clamp into `[-1.0, 1.0]`, `NaN` becomes silence.
#[inline(always)]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(-1.0, 1.0) }
}

const I24_MAX: i32 = 0x7FFFFF;
const I24_MIN: i32 = -0x800000;

fn decode_u8(bytes: &[u8]) -> f64 {
    normalize(bytes[0] as i64 - 128, i8::MAX as f64, -(i8::MIN as f64))
}

fn decode_s16(bytes: &[u8]) -> f64 {
    normalize(i16::from_le_slice(bytes) as i64, i16::MAX as f64, -(i16::MIN as f64))
}

fn decode_s24(bytes: &[u8]) -> f64 {
    // Put the three bytes into the top of an i32, the arithmetic shift does the sign extension.
    let value = i32::from_le_bytes([0, bytes[0], bytes[1], bytes[2]]) >> 8;
    normalize(value as i64, I24_MAX as f64, -(I24_MIN as f64))
}

fn decode_s32(bytes: &[u8]) -> f64 {
    normalize(i32::from_le_slice(bytes) as i64, i32::MAX as f64, -(i32::MIN as f64))
}

fn decode_s64(bytes: &[u8]) -> f64 {
    normalize(i64::from_le_slice(bytes), i64::MAX as f64, -(i64::MIN as f64))
}

fn decode_f32(bytes: &[u8]) -> f64 {
    clamp_unit(f32::from_le_slice(bytes) as f64)
}

fn decode_f64(bytes: &[u8]) -> f64 {
    clamp_unit(f64::from_le_slice(bytes))
}

fn encode_u8(value: f64, buf: &mut Vec<u8>) {
    let value = quantize(value, i8::MAX as f64, -(i8::MIN as f64));
    buf.push((value + 128) as u8);
}

fn encode_s16(value: f64, buf: &mut Vec<u8>) {
    let value = quantize(value, i16::MAX as f64, -(i16::MIN as f64)) as i16;
    buf.extend_from_slice(&value.to_le_bytes());
}

fn encode_s24(value: f64, buf: &mut Vec<u8>) {
    let value = quantize(value, I24_MAX as f64, -(I24_MIN as f64)) as i32;
    buf.extend_from_slice(&value.to_le_bytes()[0..3]);
}

fn encode_s32(value: f64, buf: &mut Vec<u8>) {
    let value = quantize(value, i32::MAX as f64, -(i32::MIN as f64)) as i32;
    buf.extend_from_slice(&value.to_le_bytes());
}

fn encode_s64(value: f64, buf: &mut Vec<u8>) {
    let value = quantize(value, i64::MAX as f64, -(i64::MIN as f64));
    buf.extend_from_slice(&value.to_le_bytes());
}

fn encode_f32(value: f64, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&(clamp_unit(value) as f32).to_le_bytes());
}

fn encode_f64(value: f64, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&clamp_unit(value).to_le_bytes());
}

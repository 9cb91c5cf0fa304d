/// * Integer helpers the step table is computed from.
pub mod rational;

use std::fmt::{self, Display, Formatter};

pub use rational::{gcd, lcm};

#[derive(Debug, Clone, PartialEq)]
pub enum ResamplerError {
    ZeroSampleRate(u32, u32),
    StepTableTooLarge(u32, u32),
}

impl std::error::Error for ResamplerError {}

impl Display for ResamplerError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::ZeroSampleRate(src, dst) => write!(f, "Can't resample between {src}Hz and {dst}Hz, sample rates must be positive"),
            Self::StepTableTooLarge(src, dst) => write!(f, "Can't resample between {src}Hz and {dst}Hz, the rates share too small a common factor"),
        }
    }
}

/// * One output sub-step inside a stride: where to read in the input and how far to blend toward the next input sample.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Step {
    offset: usize,
    frac: f64,
}

/// How the Resampler works
///   1. Let `L = lcm(src, dst)`. Every `L / dst` input samples (a stride) produce exactly `L / src` output samples.
///   2. The position of output sample `j` of a stride, measured in input samples, is `j * (L / dst) / (L / src)`.
///      The integer part and the fraction of that position only depend on the rate pair, so they are computed once
///      in `new()` and reused for every stride of every channel.
///   3. The first output of a stride is the input sample itself, the others are linear interpolations between the two
///      neighbouring input samples.
///   4. The input is padded with copies of its last sample up to a whole number of strides plus one guard sample,
///      then the output is truncated to `ceil(len * dst / src)`.
#[derive(Debug, Clone)]
pub struct Resampler {
    src_sample_rate: u32,
    dst_sample_rate: u32,
    step_in: usize,
    step_out: usize,
    steps: Vec<Step>,
}

impl Resampler {
    /// * The longest stride `new()` accepts, on either side. A stride this long is both the step table size and the input padding.
    pub const MAX_STRIDE: usize = 1 << 22;

    pub fn new(src_sample_rate: u32, dst_sample_rate: u32) -> Result<Self, ResamplerError> {
        if src_sample_rate == 0 || dst_sample_rate == 0 {
            return Err(ResamplerError::ZeroSampleRate(src_sample_rate, dst_sample_rate));
        }
        let common = lcm(src_sample_rate as u64, dst_sample_rate as u64);
        let step_out = common / dst_sample_rate as u64;
        let step_in = common / src_sample_rate as u64;
        if step_in.max(step_out) > Self::MAX_STRIDE as u64 {
            return Err(ResamplerError::StepTableTooLarge(src_sample_rate, dst_sample_rate));
        }
        let (step_in, step_out) = (step_in as usize, step_out as usize);

        // Exact integer arithmetic for the position, only the remainder becomes a float.
        let steps = (0..step_in)
            .map(|j| {
                let position = j as u64 * step_out as u64;
                Step {
                    offset: (position / step_in as u64) as usize,
                    frac: (position % step_in as u64) as f64 / step_in as f64,
                }
            })
            .collect();

        Ok(Self {
            src_sample_rate,
            dst_sample_rate,
            step_in,
            step_out,
            steps,
        })
    }

    pub fn get_src_sample_rate(&self) -> u32 {
        self.src_sample_rate
    }

    pub fn get_dst_sample_rate(&self) -> u32 {
        self.dst_sample_rate
    }

    /// * Output samples generated per stride, `lcm / src`.
    pub fn get_step_in(&self) -> usize {
        self.step_in
    }

    /// * Input samples consumed per stride, `lcm / dst`.
    pub fn get_step_out(&self) -> usize {
        self.step_out
    }

    pub fn is_identity(&self) -> bool {
        self.src_sample_rate == self.dst_sample_rate
    }

    /// * The exact number of samples `resample()` returns for an input of `input_length` samples: `ceil(len * step_in / step_out)`.
    pub fn get_output_length(&self, input_length: usize) -> usize {
        let numerator = input_length as u128 * self.step_in as u128;
        numerator.div_ceil(self.step_out as u128) as usize
    }

    /// * Resample one channel. The input is never modified, a new buffer is returned.
    pub fn resample(&self, input: &[f64]) -> Vec<f64> {
        let Some(&fill) = input.last() else {
            return Vec::new();
        };
        if self.is_identity() {
            return input.to_vec();
        }
        let desired_length = self.get_output_length(input.len());

        let strides = input.len().div_ceil(self.step_out);
        let mut padded = Vec::<f64>::with_capacity(strides * self.step_out + 1);
        padded.extend_from_slice(input);
        padded.resize(strides * self.step_out + 1, fill);

        let mut output = Vec::<f64>::with_capacity(strides * self.step_in);
        for i in (0..padded.len() - 1).step_by(self.step_out) {
            output.push(padded[i]);
            for step in self.steps.iter().skip(1) {
                let v1 = padded[i + step.offset];
                let v2 = padded[i + step.offset + 1];
                if v1 == v2 {
                    output.push(v1);
                    continue;
                }
                output.push((1.0 - step.frac) * v1 + step.frac * v2);
            }
        }

        output.truncate(desired_length);
        output
    }
}

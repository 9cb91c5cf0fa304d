#![doc = include_str!("../Readme.md")]

pub use wavparser_core::{WaveFile, WaveReader, WaveWriter, WriterOptions, MergeAlgorithm, SOFTWARE_TAG, is_flac_available};

/// * Errors returned from most of the function in this library.
pub mod errors {
    pub use wavparser_core::errors::{AudioError, AudioReadError, AudioWriteError, IOErrorInfo};
}

/// * WAV file format specs
pub mod format_specs {
    pub use wavparser_core::format_specs::*;
}

/// * WAV chunks
pub mod chunks {
    pub use wavparser_core::chunks::*;
}

/// * Volume change, sample rate conversion and merging
pub mod processing {
    pub use wavparser_core::processing::{MergeAlgorithm, change_volume_samples, db_to_gain, merge_samples};
}

/// * Compressed formats are decoded by external decoders through this seam
pub mod decoders {
    pub use wavparser_core::decoders::*;
}

/// * Utilities for IO
pub mod io_utils {
    pub use wavparser_core::io_utils::*;
}

/// * The exact-ratio resampler
pub mod resampler {
    pub use ::resampler::{Resampler, ResamplerError, gcd, lcm};
}

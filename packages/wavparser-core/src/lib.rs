mod readwrite;
mod samplecodec;
mod wavcore;
mod wavefile;
mod wavreader;
mod wavwriter;

/// * Volume change, sample rate conversion and merging, all on `WaveFile`.
pub mod processing;

/// * The seam for compressed formats: a decoder hands over integer samples, `WaveFile::from_decoded()` normalizes them.
pub mod decoders;

/// * Errors returned from most of the function in this library.
pub mod errors;

/// * The resampler
#[doc(inline)]
pub use resampler;

pub use wavefile::WaveFile;
pub use wavreader::WaveReader;
pub use wavwriter::{SOFTWARE_TAG, WaveWriter, WriterOptions};
pub use processing::MergeAlgorithm;
pub use decoders::is_flac_available;

/// * Utilities for IO
pub mod io_utils {
    pub use crate::readwrite::{LeIO, Reader};
}

/// * WAV file format specs
pub mod format_specs {
    pub use crate::wavcore::AudioFormat;
    pub use crate::samplecodec::{SampleDecoder, SampleEncoder, WaveSampleType, clamp_unit, normalize, quantize};

    /// * All of the supported WAV format tags
    pub mod format_tags {
        pub use crate::wavcore::format_tags::*;
    }

    /// * All of the supported WAV format GUIDs from the extensible data from the `fmt ` chunk.
    pub mod guids {
        pub use crate::wavcore::guids::*;
    }
}

/// * WAV chunks
pub mod chunks {
    pub use crate::wavcore::{ChunkHeader, ExtensibleData, FmtChunk, GUID, ListInfo};
}

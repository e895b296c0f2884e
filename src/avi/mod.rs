//! AVI and OpenDML (AVI 2.0) files.
//!
//! RIFF chunks frame everything: a 4-byte tag, a 32-bit little-endian
//! size and the data, padded to an even length. Files over 1GiB are split
//! into a `RIFF AVI ` segment followed by `RIFF AVIX` segments and indexed
//! with the OpenDML two-level index (`indx` -> `ix##`).

mod chunks;
mod headers;
mod index;
mod reader;
mod riff;
mod writer;

pub use chunks::{ChunkEntry, ChunkTable};
pub use headers::{
    BitmapInfoHeader,
    Dmlh,
    MainHeader,
    StreamFormat,
    StreamHeader,
    WaveFormatEx,
    AVIF_HASINDEX,
    AVIF_ISINTERLEAVED,
    WAVE_FORMAT_PCM,
};
pub use index::{
    chunk_tag,
    ix_tag,
    stream_of,
    Idx1Entry,
    StandardIndex,
    StandardIndexEntry,
    SuperIndex,
    SuperIndexEntry,
    AVIIF_KEYFRAME,
    NOT_KEYFRAME,
};
pub use reader::{AviReader, AviStream};
pub use riff::{write_chunk, RiffChunk};
pub use writer::{AviWriteOptions, AviWriter};

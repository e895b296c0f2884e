//! Read and write QuickTime/MP4 and AVI container trees, and convert
//! decoded video between pixel formats.
//!
//! Both QuickTime atoms and RIFF chunks are handled as cursors over a
//! `ByteStream`: headers are read in place, and on write a header is
//! reserved first and its size patched in once the contents are known.
//! Codecs beyond the uncompressed formats are not included; the
//! `VideoCodec` trait is the seam for plugging them in.
//!
//! The implementation mostly follows
//! <https://developer.apple.com/documentation/quicktime-file-format>
//! and the OpenDML AVI File Format Extensions.
//!
//! ```ignore
//! use movkit::{QuickTime, ReadOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), movkit::ContainerError> {
//!     let mut qt = QuickTime::open(Path::new("VIDEO.MOV"), ReadOptions::default())?;
//!
//!     for track in qt.tracks() {
//!         println!("{track:?}")
//!     }
//!
//!     // Derives duration from the movie header.
//!     println!("{:?}", qt.duration());
//!
//!     // Raw bytes of the first sample in the first track.
//!     let sample = qt.read_sample(0, 0)?;
//!     println!("{} bytes", sample.len());
//!
//!     Ok(())
//! }
//! ```

pub mod fourcc;
pub mod stream;
pub mod errors;
pub mod logging;
pub mod consts;
pub(crate) mod support;
pub mod atom;
pub mod atom_types;
pub mod track;
pub mod colormodels;
pub mod codecs;
pub mod quicktime;
pub mod writer;
pub mod avi;
pub mod probe;

#[cfg(test)]
mod tests;

pub use fourcc::FourCC;
pub use stream::ByteStream;
pub use errors::ContainerError;
pub use logging::{LogSink, LOG_TARGET};
pub use consts::{CONTAINER, TOP_LEVEL, mp4_time_zero};
pub use atom::{Atom, RawAtom, MaybeKnown, QtAtom, QtAtomNode};
pub use atom_types::{
    AtomBody,
    Cmov,
    Ctab,
    Ctts,
    Dref,
    Elst,
    Ftyp,
    Hdlr,
    Iods,
    Mdhd,
    Mvhd,
    Smhd,
    Stsc,
    Stsd,
    Stss,
    Stsz,
    Stts,
    Tkhd,
    Udta,
    Vmhd,
    Moov,
    Trak,
    Mdia,
    Minf,
    Stbl,
    ChunkOffsets,
    MediaKind,
    SampleDescription, // stsd component
    VideoDescription, // stsd component
    AudioDescription, // stsd component
};
pub use track::{Track, SampleOffsets, SampleOffset};
pub use colormodels::{ColorModel, FrameBuffer, SourceFrame, DestFrame, Rect, transfer, convert};
pub use codecs::{VideoCodec, codec_for};
pub use quicktime::{QuickTime, ReadOptions};
pub use writer::{QuickTimeWriter, WriteOptions, FileType};
pub use avi::{AviReader, AviWriter, AviWriteOptions};
pub use probe::{probe, Container, ContainerKind};

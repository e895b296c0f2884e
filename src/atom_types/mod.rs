//! Atom types. Each reads from and writes to a `ByteStream`
//! through the `AtomBody` trait.

/// Implements `AtomBody` for a fixed-layout, big-endian `binrw` type.
macro_rules! binrw_atom {
    ($name:ty, $tag:expr) => {
        impl crate::atom_types::AtomBody for $name {
            const TAG: crate::FourCC = $tag;

            fn read_body(
                stream: &mut crate::ByteStream,
                _atom: &crate::atom::Atom
            ) -> Result<Self, crate::ContainerError> {
                stream.read_be()
            }

            fn write_body(&self, stream: &mut crate::ByteStream) -> Result<(), crate::ContainerError> {
                stream.write_be(self)
            }
        }
    };
}

mod cmov;
mod ctab;
mod ctts;
mod dref;
mod elst;
mod ftyp;
mod hdlr;
mod iods;
mod mdhd;
mod mvhd;
mod smhd;
mod stco;
mod stsc;
mod stsd;
mod stss;
mod stsz;
mod stts;
mod tkhd;
mod udta;
mod vmhd;
mod containers;

pub use cmov::{compress_moov, decompress_moov, Cmov};
pub use ctab::{Ctab, ColorEntry};
pub use ctts::{Ctts, CompositionOffset};
pub use dref::{Dref, DrefEntry};
pub use elst::{Elst, EditEntry};
pub use ftyp::Ftyp;
pub use hdlr::{Hdlr, NameStyle};
pub use iods::Iods;
pub use mdhd::Mdhd;
pub use mvhd::Mvhd;
pub use smhd::Smhd;
pub use stco::ChunkOffsets;
pub use stsc::{Stsc, SampleToChunk};
pub use stsd::{
    Stsd,
    MediaKind,
    SampleDescription,
    SampleEntry,
    VideoDescription,
    AudioDescription,
    AudioVersion,
    Extension,
    Esds,
    Pasp,
    Fiel,
    read_descriptor_length,
    write_descriptor_length,
};
pub use stss::Stss;
pub use stsz::Stsz;
pub use stts::{Stts, TimeToSample};
pub use tkhd::Tkhd;
pub use udta::{Udta, UserItem, UserText, NAME, COPYRIGHT, INFO};
pub use vmhd::Vmhd;
pub use containers::{Moov, Trak, Mdia, Minf, MediaHeader, Stbl};

use crate::{atom::{write_atom, Atom}, ByteStream, ContainerError, FourCC};

/// One atom type: its tag, and how its data load
/// (everything after the header) is read and written.
pub trait AtomBody: Sized {
    const TAG: FourCC;

    /// Reads the data load. The stream is positioned directly
    /// after the header of `atom`.
    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError>;

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError>;

    /// Writes header, data load, and patched size.
    fn write(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        write_atom(stream, Self::TAG, |s| self.write_body(s))?;
        Ok(())
    }

    /// Reads header and data load at the current position.
    fn read(stream: &mut ByteStream) -> Result<Self, ContainerError> {
        let atom = Atom::read_header(stream)?;
        if atom.tag != Self::TAG {
            return Err(ContainerError::MalformedAtomGraph{
                tag: atom.tag,
                offset: atom.start,
                reason: format!("expected '{}'", Self::TAG)
            })
        }
        let body = Self::read_body(stream, &atom)?;
        atom.skip(stream)?;
        Ok(body)
    }
}

/// Identity matrix in the 3x3 fixed point layout used by `mvhd`/`tkhd`.
pub(crate) const IDENTITY_MATRIX: [u32; 9] = [
    0x00010000, 0, 0,
    0, 0x00010000, 0,
    0, 0, 0x40000000,
];

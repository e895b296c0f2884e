//! Opaque atoms kept verbatim for round-tripping
//! vendor extensions.

use crate::{atom::{write_atom, Atom}, ByteStream, ContainerError, FourCC};

/// Unknown atom, captured as raw bytes at read time
/// and replayed unmodified at write time.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAtom {
    pub tag: FourCC,
    /// Data load, excluding header.
    pub data: Vec<u8>,
}

impl RawAtom {
    pub fn new(tag: FourCC, data: &[u8]) -> Self {
        Self{tag, data: data.to_owned()}
    }

    /// Reads the data load of `atom`. The stream is left at the
    /// end of the atom.
    pub fn read(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        stream.seek_to(atom.data_offset())?;
        let data = stream.read_fixed_bytes(atom.data_size())?;
        Ok(Self{tag: atom.tag, data})
    }

    pub fn write(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        write_atom(stream, self.tag, |s| s.write_fixed_bytes(&self.data))?;
        Ok(())
    }
}

/// Either a parsed atom or one kept as raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum MaybeKnown<T> {
    Known(T),
    Raw(RawAtom),
}

impl<T> MaybeKnown<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            MaybeKnown::Known(t) => Some(t),
            MaybeKnown::Raw(_) => None,
        }
    }

    pub fn raw(&self) -> Option<&RawAtom> {
        match self {
            MaybeKnown::Known(_) => None,
            MaybeKnown::Raw(r) => Some(r),
        }
    }
}

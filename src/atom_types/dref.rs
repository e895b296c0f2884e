//! Data reference atom (`dref`).
//! Declares source(s) of media data in track.
//!
//! Location: `moov/trak[multiple]/mdia/minf/dinf/dref`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/data_reference_atoms>

use crate::{atom::{write_atom, Atom}, ByteStream, ContainerError, FourCC};

use super::AtomBody;

/// Data reference atom (`dref`).
///
/// Location: `moov/trak[multiple]/mdia/minf/dinf/dref`
#[derive(Debug, Clone, PartialEq)]
pub struct Dref {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    pub(crate) table: Vec<DrefEntry>,
}

/// One data reference, itself an atom (`alis`, `url `, `rsrc`...).
#[derive(Debug, Clone, PartialEq)]
pub struct DrefEntry {
    pub kind: FourCC,
    pub version: u8,
    /// `1` means the media data is in the same file.
    pub flags: [u8; 3],
    pub data: Vec<u8>,
}

impl Default for Dref {
    /// Single self-contained alias.
    fn default() -> Self {
        Self {
            version: 0,
            flags: [0; 3],
            table: vec![DrefEntry::self_contained(FourCC::Alis)],
        }
    }
}

impl DrefEntry {
    pub fn self_contained(kind: FourCC) -> Self {
        Self{kind, version: 0, flags: [0, 0, 1], data: Vec::new()}
    }

    pub fn is_self_contained(&self) -> bool {
        self.flags[2] & 1 == 1
    }
}

impl AtomBody for Dref {
    const TAG: FourCC = FourCC::Dref;

    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        let version = stream.read_u8()?;
        let flags: [u8; 3] = stream.read_be()?;
        let number_of_entries = stream.read_u32()?;
        let mut table = Vec::new();
        for _ in 0 .. number_of_entries {
            if stream.position() >= atom.end {
                break
            }
            let entry = Atom::read_header(stream)?;
            let version = stream.read_u8()?;
            let flags: [u8; 3] = stream.read_be()?;
            let rest = entry.end.min(atom.end).saturating_sub(stream.position());
            let data = stream.read_fixed_bytes(rest)?;
            table.push(DrefEntry{kind: entry.tag, version, flags, data});
            entry.skip(stream)?;
        }
        Ok(Self{version, flags, table})
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        stream.write_u8(self.version)?;
        stream.write_be(&self.flags)?;
        stream.write_u32(u32::try_from(self.table.len())?)?;
        for entry in self.table.iter() {
            write_atom(stream, entry.kind, |s| {
                s.write_u8(entry.version)?;
                s.write_be(&entry.flags)?;
                s.write_fixed_bytes(&entry.data)
            })?;
        }
        Ok(())
    }
}

impl Dref {
    pub fn table(&self) -> &[DrefEntry] {
        &self.table
    }
}

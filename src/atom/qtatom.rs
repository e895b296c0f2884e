//! QT atoms, as used in QTVR sample data and atom containers.
//!
//! Same size + tag + backpatch discipline as regular atoms,
//! but the header also carries an atom ID and a child count:
//!
//! ```ignore
//! | size: u32 | tag: [u8; 4] | id: u32 | reserved: u16 | child count: u16 | reserved: u32 |
//! ```
//!
//! A QT atom container starts with 10 reserved bytes and a lock count,
//! followed by the root atom (usually `sean`).
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/qt_atoms_and_atom_containers>

use crate::{consts::{HEADER_LENGTH, QTATOM_HEADER_LENGTH}, ByteStream, ContainerError, FourCC};

/// QT atom cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QtAtom {
    pub start: u64,
    pub end: u64,
    pub size: u64,
    pub tag: FourCC,
    /// Atom ID, unique among siblings with the same tag.
    pub id: u32,
    pub child_count: u16,
}

impl QtAtom {
    /// Reads a QT atom header. `wide` placeholders are skipped
    /// exactly as for regular atoms.
    pub fn read_header(stream: &mut ByteStream) -> Result<Self, ContainerError> {
        loop {
            let start = stream.position();
            if stream.remaining() < HEADER_LENGTH {
                return Err(ContainerError::TruncatedHeader{offset: start, available: stream.remaining()})
            }
            let size = stream.read_u32()? as u64;
            let tag = stream.read_fourcc()?;
            if tag == FourCC::Wide {
                continue
            }
            if stream.remaining() < QTATOM_HEADER_LENGTH - HEADER_LENGTH {
                return Err(ContainerError::TruncatedHeader{offset: start, available: stream.remaining() + HEADER_LENGTH})
            }
            let id = stream.read_u32()?;
            let _reserved = stream.read_u16()?;
            let child_count = stream.read_u16()?;
            let _reserved = stream.read_u32()?;

            let end = start.checked_add(size).unwrap_or_else(|| stream.len());
            return Ok(Self{start, end, size: end - start, tag, id, child_count})
        }
    }

    /// Reserves a header with zero size. `child_count` is final,
    /// only the size is patched by `write_footer()`.
    pub fn write_header(
        stream: &mut ByteStream,
        tag: FourCC,
        id: u32,
        child_count: u16,
    ) -> Result<Self, ContainerError> {
        let start = stream.position();
        stream.write_u32(0)?;
        stream.write_fourcc(&tag)?;
        stream.write_u32(id)?;
        stream.write_u16(0)?;
        stream.write_u16(child_count)?;
        stream.write_u32(0)?;
        Ok(Self{start, end: start, size: 0, tag, id, child_count})
    }

    pub fn write_footer(mut self, stream: &mut ByteStream) -> Result<Self, ContainerError> {
        self.end = stream.position();
        self.size = self.end - self.start;
        let size = u32::try_from(self.size)?;
        stream.seek_to(self.start)?;
        stream.write_u32(size)?;
        stream.seek_to(self.end)?;
        Ok(self)
    }

    pub fn is(&self, tag: &[u8; 4]) -> bool {
        self.tag.is(tag)
    }

    pub fn skip(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        let end = match self.start == self.end {
            true => self.end + 1,
            false => self.end,
        };
        stream.seek_to(end)?;
        Ok(())
    }

    pub fn data_offset(&self) -> u64 {
        self.start + QTATOM_HEADER_LENGTH
    }

    pub fn data_size(&self) -> u64 {
        self.end.saturating_sub(self.data_offset())
    }
}

/// Contents of a QT atom: either child atoms or leaf data.
#[derive(Debug, Clone, PartialEq)]
pub enum QtPayload {
    Children(Vec<QtAtomNode>),
    Leaf(Vec<u8>),
}

/// A fully read QT atom tree.
#[derive(Debug, Clone, PartialEq)]
pub struct QtAtomNode {
    pub tag: FourCC,
    pub id: u32,
    pub payload: QtPayload,
}

impl QtAtomNode {
    pub fn leaf(tag: FourCC, id: u32, data: &[u8]) -> Self {
        Self{tag, id, payload: QtPayload::Leaf(data.to_owned())}
    }

    pub fn branch(tag: FourCC, id: u32, children: Vec<QtAtomNode>) -> Self {
        Self{tag, id, payload: QtPayload::Children(children)}
    }

    /// Reads the atom at the current position, including all descendants.
    pub fn read(stream: &mut ByteStream) -> Result<Self, ContainerError> {
        let atom = QtAtom::read_header(stream)?;
        let payload = match atom.child_count {
            0 => QtPayload::Leaf(stream.read_fixed_bytes(atom.data_size())?),
            n => {
                let mut children = Vec::with_capacity(n as usize);
                for _ in 0 .. n {
                    if stream.position() >= atom.end {
                        stream.log.warn(format_args!(
                            "QT atom '{}' @ {} declares {n} children, found {}",
                            atom.tag, atom.start, children.len()
                        ));
                        break
                    }
                    children.push(Self::read(stream)?);
                }
                QtPayload::Children(children)
            }
        };
        atom.skip(stream)?;
        Ok(Self{tag: atom.tag, id: atom.id, payload})
    }

    pub fn write(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        let child_count = match &self.payload {
            QtPayload::Children(c) => u16::try_from(c.len())?,
            QtPayload::Leaf(_) => 0,
        };
        let atom = QtAtom::write_header(stream, self.tag, self.id, child_count)?;
        match &self.payload {
            QtPayload::Children(children) => {
                for child in children.iter() {
                    child.write(stream)?;
                }
            },
            QtPayload::Leaf(data) => stream.write_fixed_bytes(data)?,
        }
        atom.write_footer(stream)?;
        Ok(())
    }

    /// Reads a QT atom container: 10 reserved bytes,
    /// lock count, root atom.
    pub fn read_container(stream: &mut ByteStream) -> Result<Self, ContainerError> {
        let _reserved = stream.read_fixed_bytes(10)?;
        let _lock_count = stream.read_u16()?;
        Self::read(stream)
    }

    pub fn write_container(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        stream.write_fixed_bytes(&[0; 10])?;
        stream.write_u16(0)?;
        self.write(stream)
    }

    /// First child with `tag` and `id`.
    pub fn find(&self, tag: &[u8; 4], id: u32) -> Option<&QtAtomNode> {
        match &self.payload {
            QtPayload::Children(c) => c.iter().find(|n| n.tag.is(tag) && n.id == id),
            QtPayload::Leaf(_) => None,
        }
    }
}

//! Chunk offset atoms, 32-bit (`stco`) and 64-bit (`co64`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stco` (or `co64`)
//!
//! See:
//! - <https://developer.apple.com/documentation/quicktime-file-format/chunk_offset_atom>
//! - <https://developer.apple.com/documentation/quicktime-file-format/64-bit_chunk_offset_atom>

use crate::{atom::{write_atom, Atom}, ByteStream, ContainerError, FourCC};

/// Chunk offsets from either `stco` or `co64`,
/// held as 64-bit values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkOffsets {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    /// Absolute byte offsets of each chunk.
    pub(crate) offsets: Vec<u64>,
    /// Read from `co64`, or always write `co64`.
    pub(crate) wide: bool,
}

impl ChunkOffsets {
    pub fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        let wide = match atom.tag {
            FourCC::Co64 => true,
            FourCC::Stco => false,
            tag => return Err(ContainerError::MalformedAtomGraph{
                tag,
                offset: atom.start,
                reason: "expected 'stco' or 'co64'".to_owned()
            }),
        };
        let version = stream.read_u8()?;
        let flags: [u8; 3] = stream.read_be()?;
        let no_of_entries = stream.read_u32()? as u64;
        let entry_size = if wide {8} else {4};
        if no_of_entries * entry_size > stream.remaining() {
            return Err(ContainerError::UnexpectedEof{
                offset: stream.position(),
                wanted: no_of_entries * entry_size
            })
        }
        let offsets = (0 .. no_of_entries)
            .map(|_| match wide {
                true => stream.read_u64(),
                false => stream.read_u32().map(|o| o as u64),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self{version, flags, offsets, wide})
    }

    /// Writes `co64` if any offset needs it (or if read from `co64`),
    /// `stco` otherwise.
    pub fn write(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        let wide = self.needs_co64();
        let tag = if wide {FourCC::Co64} else {FourCC::Stco};
        write_atom(stream, tag, |s| {
            s.write_u8(self.version)?;
            s.write_be(&self.flags)?;
            s.write_u32(u32::try_from(self.offsets.len())?)?;
            for offset in self.offsets.iter() {
                match wide {
                    true => s.write_u64(*offset)?,
                    false => s.write_u32(*offset as u32)?,
                }
            }
            Ok(())
        })?;
        Ok(())
    }

    pub fn needs_co64(&self) -> bool {
        self.wide || self.offsets.iter().any(|o| *o > u32::MAX as u64)
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Offset of `chunk` (1-based).
    pub fn offset_of_chunk(&self, chunk: u32) -> Option<u64> {
        self.offsets.get((chunk as usize).checked_sub(1)?).copied()
    }

    pub fn push(&mut self, offset: u64) {
        self.offsets.push(offset)
    }

    /// Shifts all offsets by `delta` bytes,
    /// e.g. after moving `mdat`.
    pub fn shift(&mut self, delta: i64) {
        self.offsets.iter_mut()
            .for_each(|o| *o = o.saturating_add_signed(delta));
    }
}

//! AVI indexes.
//!
//! - `idx1`: classic index, one 16-byte entry per chunk in the first
//!   `RIFF` segment, offsets relative to the `movi` list type.
//! - `indx`: OpenDML super index in each `strl`, pointing to the
//!   standard indexes of that stream.
//! - `ix##`: OpenDML standard index, a base offset plus 32-bit
//!   offsets relative to it. Bit 31 of the size is set for chunks
//!   that are not keyframes.
//!
//! See: OpenDML AVI File Format Extensions, version 1.02.

use binrw::binrw;

use crate::{ByteStream, ContainerError, FourCC};

use super::riff::RiffChunk;

/// `idx1` flag: the chunk is a keyframe.
pub const AVIIF_KEYFRAME: u32 = 0x10;
/// `idx1` flag: the entry points to a `LIST`, e.g. `rec `.
pub const AVIIF_LIST: u32 = 0x01;

pub const AVI_INDEX_OF_INDEXES: u8 = 0x00;
pub const AVI_INDEX_OF_CHUNKS: u8 = 0x01;

/// Standard index size bit marking a non-keyframe.
pub const NOT_KEYFRAME: u32 = 0x8000_0000;

/// `indx` fixed part: longs per entry, sub type, type,
/// entries in use, chunk ID, 3 reserved.
pub const SUPER_INDEX_HEADER_LENGTH: u64 = 24;
pub const SUPER_INDEX_ENTRY_LENGTH: u64 = 16;
/// `ix##` fixed part: longs per entry, sub type, type,
/// entries in use, chunk ID, base offset, reserved.
pub const STANDARD_INDEX_HEADER_LENGTH: u64 = 24;
pub const STANDARD_INDEX_ENTRY_LENGTH: u64 = 8;

/// Chunk tag for stream `stream`, e.g. `00dc`, `01wb`.
pub fn chunk_tag(stream: usize, kind: &[u8; 2]) -> FourCC {
    let digits = format!("{:02}", stream % 100);
    let d = digits.as_bytes();
    FourCC::from_bytes([d[0], d[1], kind[0], kind[1]])
}

/// Standard index tag for stream `stream`, e.g. `ix00`.
pub fn ix_tag(stream: usize) -> FourCC {
    let digits = format!("{:02}", stream % 100);
    let d = digits.as_bytes();
    FourCC::from_bytes([b'i', b'x', d[0], d[1]])
}

/// Stream number encoded in a chunk tag (`00dc` -> 0).
/// `None` for tags not starting with two decimal digits.
pub fn stream_of(tag: &FourCC) -> Option<usize> {
    let b = tag.to_bytes();
    match (b[0], b[1]) {
        (t @ b'0'..=b'9', u @ b'0'..=b'9') => Some(((t - b'0') * 10 + (u - b'0')) as usize),
        _ => None,
    }
}

/// Classic index entry (`idx1`).
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, PartialEq)]
pub struct Idx1Entry {
    pub chunk_id: FourCC,
    pub flags: u32,
    /// Offset of the chunk header, usually relative to the `movi` list type.
    pub offset: u32,
    pub size: u32,
}

impl Idx1Entry {
    pub const LENGTH: u64 = 16;

    pub fn is_keyframe(&self) -> bool {
        self.flags & AVIIF_KEYFRAME != 0
    }

    pub fn read_all(stream: &mut ByteStream, chunk: &RiffChunk) -> Result<Vec<Self>, ContainerError> {
        let count = chunk.data_size() / Self::LENGTH;
        (0 .. count)
            .map(|_| stream.read_le())
            .collect()
    }

    pub fn write_all(stream: &mut ByteStream, entries: &[Self]) -> Result<RiffChunk, ContainerError> {
        RiffChunk::write_header(stream, FourCC::Idx1)?
            .finish(stream, |s| {
                for entry in entries.iter() {
                    s.write_le(entry)?;
                }
                Ok(())
            })
    }
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SuperIndexEntry {
    /// Absolute offset of the `ix##` chunk header.
    pub offset: u64,
    /// Size of the `ix##` chunk including its header.
    pub size: u32,
    /// Samples covered by the standard index.
    pub duration: u32,
}

/// OpenDML super index (`indx`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SuperIndex {
    /// Chunk ID the indexed chunks carry, e.g. `00dc`.
    pub chunk_id: FourCC,
    pub entries: Vec<SuperIndexEntry>,
}

impl SuperIndex {
    pub fn new(chunk_id: FourCC) -> Self {
        Self{chunk_id, entries: Vec::new()}
    }

    /// Payload size of an `indx` chunk reserving `capacity` entries.
    pub fn reserved_size(capacity: usize) -> u64 {
        SUPER_INDEX_HEADER_LENGTH + SUPER_INDEX_ENTRY_LENGTH * capacity as u64
    }

    pub fn read(stream: &mut ByteStream, chunk: &RiffChunk) -> Result<Self, ContainerError> {
        if chunk.data_size() < SUPER_INDEX_HEADER_LENGTH {
            return Err(ContainerError::UnexpectedEof{
                offset: chunk.data_offset(),
                wanted: SUPER_INDEX_HEADER_LENGTH
            })
        }
        let _longs_per_entry = stream.read_u16_le()?;
        let _sub_type = stream.read_u8()?;
        let index_type = stream.read_u8()?;
        let in_use = stream.read_u32_le()? as u64;
        let chunk_id = stream.read_fourcc()?;
        let _reserved: [u32; 3] = stream.read_le()?;

        if index_type != AVI_INDEX_OF_INDEXES {
            return Err(ContainerError::MalformedAtomGraph{
                tag: chunk.tag,
                offset: chunk.start,
                reason: format!("index type {index_type}, expected index of indexes")
            })
        }

        let fits = (chunk.data_size() - SUPER_INDEX_HEADER_LENGTH) / SUPER_INDEX_ENTRY_LENGTH;
        if in_use > fits {
            stream.log.warn(format_args!(
                "'indx' @ {} has {in_use} entries in use, room for {fits}", chunk.start
            ));
        }
        let entries = (0 .. in_use.min(fits))
            .map(|_| stream.read_le())
            .collect::<Result<Vec<SuperIndexEntry>, _>>()?;

        Ok(Self{chunk_id, entries})
    }

    /// Writes the payload, padding unused entries up to `capacity`
    /// so that the chunk can be rewritten in place later.
    pub fn write(&self, stream: &mut ByteStream, capacity: usize) -> Result<(), ContainerError> {
        if self.entries.len() > capacity {
            return Err(ContainerError::WriterState(format!(
                "super index for '{}' holds {} entries, capacity is {capacity}",
                self.chunk_id, self.entries.len()
            )))
        }
        stream.write_u16_le(4)?;
        stream.write_u8(0)?;
        stream.write_u8(AVI_INDEX_OF_INDEXES)?;
        stream.write_u32_le(self.entries.len() as u32)?;
        stream.write_fourcc(&self.chunk_id)?;
        stream.write_le(&[0u32; 3])?;
        for entry in self.entries.iter() {
            stream.write_le(entry)?;
        }
        let unused = (capacity - self.entries.len()) as u64 * SUPER_INDEX_ENTRY_LENGTH;
        stream.write_fixed_bytes(&vec![0; unused as usize])
    }
}

#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StandardIndexEntry {
    /// Offset of the chunk data relative to the table's base offset.
    pub offset: u32,
    /// Data size, bit 31 set for non-keyframes.
    pub size: u32,
}

impl StandardIndexEntry {
    pub fn new(offset: u32, size: u32, keyframe: bool) -> Self {
        let size = match keyframe {
            true => size & !NOT_KEYFRAME,
            false => size | NOT_KEYFRAME,
        };
        Self{offset, size}
    }

    pub fn data_size(&self) -> u32 {
        self.size & !NOT_KEYFRAME
    }

    pub fn is_keyframe(&self) -> bool {
        self.size & NOT_KEYFRAME == 0
    }
}

/// OpenDML standard index (`ix##`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StandardIndex {
    pub chunk_id: FourCC,
    pub base_offset: u64,
    pub entries: Vec<StandardIndexEntry>,
}

impl StandardIndex {
    pub fn read(stream: &mut ByteStream, chunk: &RiffChunk) -> Result<Self, ContainerError> {
        if chunk.data_size() < STANDARD_INDEX_HEADER_LENGTH {
            return Err(ContainerError::UnexpectedEof{
                offset: chunk.data_offset(),
                wanted: STANDARD_INDEX_HEADER_LENGTH
            })
        }
        let longs_per_entry = stream.read_u16_le()?;
        let _sub_type = stream.read_u8()?;
        let index_type = stream.read_u8()?;
        let in_use = stream.read_u32_le()? as u64;
        let chunk_id = stream.read_fourcc()?;
        let base_offset = stream.read_u64_le()?;
        let _reserved = stream.read_u32_le()?;

        if index_type != AVI_INDEX_OF_CHUNKS || longs_per_entry != 2 {
            return Err(ContainerError::MalformedAtomGraph{
                tag: chunk.tag,
                offset: chunk.start,
                reason: format!("index type {index_type} with {longs_per_entry} longs per entry")
            })
        }

        let fits = (chunk.data_size() - STANDARD_INDEX_HEADER_LENGTH) / STANDARD_INDEX_ENTRY_LENGTH;
        if in_use > fits {
            stream.log.warn(format_args!(
                "'{}' @ {} has {in_use} entries in use, room for {fits}", chunk.tag, chunk.start
            ));
        }
        let entries = (0 .. in_use.min(fits))
            .map(|_| stream.read_le())
            .collect::<Result<Vec<StandardIndexEntry>, _>>()?;

        Ok(Self{chunk_id, base_offset, entries})
    }

    pub fn write(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        stream.write_u16_le(2)?;
        stream.write_u8(0)?;
        stream.write_u8(AVI_INDEX_OF_CHUNKS)?;
        stream.write_u32_le(u32::try_from(self.entries.len())?)?;
        stream.write_fourcc(&self.chunk_id)?;
        stream.write_u64_le(self.base_offset)?;
        stream.write_u32_le(0)?;
        for entry in self.entries.iter() {
            stream.write_le(entry)?;
        }
        Ok(())
    }

    /// Absolute offset of the data of entry `index`.
    pub fn data_offset(&self, index: usize) -> Option<u64> {
        self.entries.get(index)
            .map(|e| self.base_offset + e.offset as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags() {
        assert_eq!(chunk_tag(0, b"dc"), FourCC::from_str("00dc"));
        assert_eq!(chunk_tag(12, b"wb"), FourCC::from_str("12wb"));
        assert_eq!(ix_tag(3), FourCC::from_str("ix03"));
        assert_eq!(stream_of(&FourCC::from_str("01wb")), Some(1));
        assert_eq!(stream_of(&FourCC::from_str("ix01")), None);
        assert_eq!(stream_of(&FourCC::from_str("rec ")), None);
    }

    #[test]
    fn keyframe_bit() {
        let key = StandardIndexEntry::new(0, 100, true);
        let delta = StandardIndexEntry::new(0, 100, false);
        assert!(key.is_keyframe());
        assert!(!delta.is_keyframe());
        assert_eq!(delta.size, 0x8000_0064);
        assert_eq!(delta.data_size(), 100);
    }

    #[test]
    fn super_index_keeps_reserved_size() {
        let mut stream = ByteStream::memory(Vec::new());
        let mut indx = SuperIndex::new(FourCC::from_str("00dc"));
        indx.entries.push(SuperIndexEntry{offset: 1000, size: 48, duration: 2});
        let chunk = RiffChunk::write_header(&mut stream, FourCC::Indx).unwrap()
            .finish(&mut stream, |s| indx.write(s, 4))
            .unwrap();
        assert_eq!(chunk.data_size(), SuperIndex::reserved_size(4));

        stream.seek_to(chunk.data_offset()).unwrap();
        assert_eq!(SuperIndex::read(&mut stream, &chunk).unwrap(), indx);
    }

    #[test]
    fn super_index_over_capacity() {
        let mut stream = ByteStream::memory(Vec::new());
        let mut indx = SuperIndex::new(FourCC::from_str("00dc"));
        indx.entries.resize(3, SuperIndexEntry::default());
        assert!(matches!(indx.write(&mut stream, 2), Err(ContainerError::WriterState(_))));
    }
}

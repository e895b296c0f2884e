//! RIFF chunk cursor.
//!
//! ```ignore
//! | tag: [u8; 4] | size: u32 LE | list type: [u8; 4] (RIFF/LIST only) | data ... | pad (odd size) |
//! ```
//!
//! `size` excludes the 8-byte header and the pad byte.

use crate::{ByteStream, ContainerError, FourCC};

/// Tag + size.
pub const CHUNK_HEADER_LENGTH: u64 = 8;

/// Tag + size + list type.
pub const LIST_HEADER_LENGTH: u64 = 12;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiffChunk {
    /// Absolute byte offset of the chunk header.
    pub start: u64,
    /// Absolute byte offset directly after the data, excluding padding.
    pub end: u64,
    pub tag: FourCC,
    /// Set for `RIFF` and `LIST` chunks.
    pub list_type: Option<FourCC>,
}

impl RiffChunk {
    /// Reads a chunk header at the current position.
    pub fn read_header(stream: &mut ByteStream) -> Result<Self, ContainerError> {
        let start = stream.position();
        if stream.remaining() < CHUNK_HEADER_LENGTH {
            return Err(ContainerError::TruncatedHeader{offset: start, available: stream.remaining()})
        }
        let tag = stream.read_fourcc()?;
        let size = stream.read_u32_le()? as u64;
        let list_type = match Self::is_list_tag(&tag) && size >= 4 {
            true => Some(stream.read_fourcc()?),
            false => None,
        };
        Ok(Self{start, end: start + CHUNK_HEADER_LENGTH + size, tag, list_type})
    }

    fn is_list_tag(tag: &FourCC) -> bool {
        tag == &FourCC::Riff || tag == &FourCC::List
    }

    /// Reserves a chunk header with zero size.
    pub fn write_header(stream: &mut ByteStream, tag: FourCC) -> Result<Self, ContainerError> {
        let start = stream.position();
        stream.write_fourcc(&tag)?;
        stream.write_u32_le(0)?;
        Ok(Self{start, end: start, tag, list_type: None})
    }

    /// Reserves a `RIFF` or `LIST` header.
    pub fn write_list(stream: &mut ByteStream, tag: FourCC, list_type: FourCC) -> Result<Self, ContainerError> {
        let mut chunk = Self::write_header(stream, tag)?;
        stream.write_fourcc(&list_type)?;
        chunk.list_type = Some(list_type);
        Ok(chunk)
    }

    /// Pads to an even length, patches the size and
    /// returns to the (padded) end of the chunk.
    pub fn write_footer(mut self, stream: &mut ByteStream) -> Result<Self, ContainerError> {
        self.end = stream.position();
        let size = u32::try_from(self.end - self.start - CHUNK_HEADER_LENGTH)?;
        if size % 2 == 1 {
            stream.write_u8(0)?;
        }
        let next = stream.position();
        stream.seek_to(self.start + 4)?;
        stream.write_u32_le(size)?;
        stream.seek_to(next)?;
        Ok(self)
    }

    /// Runs `body` between header and footer, rewinding on error.
    pub fn finish<F>(self, stream: &mut ByteStream, body: F) -> Result<Self, ContainerError>
    where
        F: FnOnce(&mut ByteStream) -> Result<(), ContainerError>
    {
        match body(stream) {
            Ok(()) => self.write_footer(stream),
            Err(err) => {
                let _ = stream.seek_to(self.start);
                Err(err)
            }
        }
    }

    pub fn is(&self, tag: &[u8; 4]) -> bool {
        self.tag.is(tag)
    }

    /// `true` for a `LIST` or `RIFF` chunk with this list type.
    pub fn is_list(&self, list_type: &FourCC) -> bool {
        self.list_type.as_ref() == Some(list_type)
    }

    /// Size field value.
    pub fn size(&self) -> u64 {
        self.end - self.start - CHUNK_HEADER_LENGTH
    }

    pub fn data_offset(&self) -> u64 {
        match self.list_type {
            Some(_) => self.start + LIST_HEADER_LENGTH,
            None => self.start + CHUNK_HEADER_LENGTH,
        }
    }

    pub fn data_size(&self) -> u64 {
        self.end.saturating_sub(self.data_offset())
    }

    /// Offset of the next sibling, i.e. `end` rounded up to even.
    pub fn next(&self) -> u64 {
        self.end + (self.end - self.start) % 2
    }

    pub fn skip(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        stream.seek_to(self.next())?;
        Ok(())
    }

    /// Clamps `end` to `limit` (typically the parent's end or the stream length),
    /// logging a warning if the declared size overshoots it.
    pub(crate) fn clamp(&mut self, limit: u64, stream: &ByteStream) {
        if self.end > limit {
            stream.log.warn(format_args!(
                "RIFF chunk '{}' @ {} declares {} bytes, only {} available",
                self.tag, self.start, self.size(), limit.saturating_sub(self.start + CHUNK_HEADER_LENGTH)
            ));
            self.end = limit;
        }
    }
}

/// Writes one plain chunk holding `data`.
pub fn write_chunk(stream: &mut ByteStream, tag: FourCC, data: &[u8]) -> Result<RiffChunk, ContainerError> {
    RiffChunk::write_header(stream, tag)?
        .finish(stream, |s| s.write_fixed_bytes(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_chunk_is_padded() {
        let mut stream = ByteStream::memory(Vec::new());
        let chunk = write_chunk(&mut stream, FourCC::from_str("00dc"), &[1, 2, 3]).unwrap();
        assert_eq!(chunk.size(), 3);
        assert_eq!(chunk.next(), 12);
        let bytes = stream.into_bytes().unwrap();
        assert_eq!(bytes, vec![b'0', b'0', b'd', b'c', 3, 0, 0, 0, 1, 2, 3, 0]);
    }

    #[test]
    fn list_header() {
        let mut stream = ByteStream::memory(Vec::new());
        let list = RiffChunk::write_list(&mut stream, FourCC::List, FourCC::Movi).unwrap();
        write_chunk(&mut stream, FourCC::from_str("01wb"), &[0; 4]).unwrap();
        list.write_footer(&mut stream).unwrap();

        stream.seek_to(0).unwrap();
        let read = RiffChunk::read_header(&mut stream).unwrap();
        assert!(read.is_list(&FourCC::Movi));
        assert_eq!(read.size(), 16);
        assert_eq!(read.data_offset(), 12);
        assert_eq!(read.data_size(), 12);

        let child = RiffChunk::read_header(&mut stream).unwrap();
        assert!(child.is(b"01wb"));
        assert_eq!(child.list_type, None);
    }

    #[test]
    fn truncated() {
        let mut stream = ByteStream::memory(b"RIFF".to_vec());
        assert!(matches!(
            RiffChunk::read_header(&mut stream),
            Err(ContainerError::TruncatedHeader{offset: 0, available: 4})
        ));
    }
}

use std::ops::Range;

use crate::{consts::{HEADER_LENGTH, HEADER_LENGTH_64}, ByteStream, ContainerError, FourCC, CONTAINER};

/// Atom cursor: the `[start, end)` window and tag of
/// one atom in the stream.
/// 8 or 16 bytes header, depending on whether
/// 32 or 64-bit sized.
///
/// ```ignore
/// | [X X X X] [Y Y Y Y] [Z Z Z Z Z Z Z Z] |
///    |         |         |
///    |         |         64bit size (optional, only if 32 bit size == 1)
///    |         FourCC
///    32bit size
/// ```
///
/// Invariant: `end == start + size`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Atom {
    /// Absolute byte offset of the atom header.
    pub start: u64,
    /// Absolute byte offset directly after the atom.
    pub end: u64,
    /// Total atom size in bytes including 8/16 byte header.
    pub size: u64,
    pub tag: FourCC,
    /// Set to `true` if the size is stored in
    /// the 64-bit field following the tag.
    pub use_64: bool,
}

impl Atom {
    /// Reads an atom header at the current position.
    ///
    /// `wide` placeholders are transparent: the header that
    /// follows one is returned instead.
    pub fn read_header(stream: &mut ByteStream) -> Result<Self, ContainerError> {
        let limit = stream.len();
        match Self::read_header_within(stream, limit)? {
            Some(atom) => Ok(atom),
            None => Err(ContainerError::TruncatedHeader{
                offset: stream.position(),
                available: stream.remaining()
            }),
        }
    }

    /// Reads the header of a child atom that must start before `limit`,
    /// usually the end of its parent.
    ///
    /// Returns `None` if fewer than 8 bytes are left before `limit`,
    /// e.g. when a `wide` placeholder is the last child of its parent.
    /// A size that overflows the offset range is clamped to the end
    /// of the stream.
    pub fn read_header_within(stream: &mut ByteStream, limit: u64) -> Result<Option<Self>, ContainerError> {
        loop {
            let start = stream.position();
            if limit.saturating_sub(start) < HEADER_LENGTH {
                return Ok(None)
            }
            if stream.remaining() < HEADER_LENGTH {
                return Err(ContainerError::TruncatedHeader{offset: start, available: stream.remaining()})
            }
            let size32 = stream.read_u32()?;
            let tag = stream.read_fourcc()?;

            let (size, use_64) = match size32 {
                1 => {
                    if stream.remaining() < 8 {
                        return Err(ContainerError::TruncatedHeader{offset: start, available: stream.remaining() + 8})
                    }
                    (stream.read_u64()?, true)
                },
                s => (s as u64, false),
            };

            if tag == FourCC::Wide {
                stream.log.trace(format_args!("'wide' placeholder @ {start}"));
                continue
            }

            let end = match start.checked_add(size) {
                Some(end) => end,
                None => {
                    stream.log.warn(format_args!(
                        "'{tag}' @ {start}: size {size} overflows, clamping to end of stream"
                    ));
                    stream.len()
                }
            };

            return Ok(Some(Self {
                start,
                end,
                size: end - start,
                tag,
                use_64,
            }))
        }
    }

    /// Reserves an 8-byte header with a zero size at the current position.
    /// The size is patched in by `write_footer()`.
    pub fn write_header(stream: &mut ByteStream, tag: FourCC) -> Result<Self, ContainerError> {
        let start = stream.position();
        stream.write_u32(0)?;
        stream.write_fourcc(&tag)?;
        Ok(Self {
            start,
            end: start,
            size: 0,
            tag,
            use_64: false,
        })
    }

    /// Reserves a 16-byte header for an atom that may exceed 4GiB.
    pub fn write_header64(stream: &mut ByteStream, tag: FourCC) -> Result<Self, ContainerError> {
        let start = stream.position();
        stream.write_u32(1)?;
        stream.write_fourcc(&tag)?;
        stream.write_u64(0)?;
        Ok(Self {
            start,
            end: start,
            size: 0,
            tag,
            use_64: true,
        })
    }

    /// Patches the true size into the header reserved by `write_header()`
    /// and returns to the end of the atom, so that sibling writes
    /// continue from there.
    pub fn write_footer(mut self, stream: &mut ByteStream) -> Result<Self, ContainerError> {
        self.end = stream.position();
        self.size = self.end - self.start;

        if self.use_64 {
            stream.seek_to(self.start + HEADER_LENGTH)?;
            stream.write_u64(self.size)?;
        } else {
            let size = u32::try_from(self.size)
                .map_err(|_| ContainerError::MalformedAtomGraph{
                    tag: self.tag,
                    offset: self.start,
                    reason: format!("{} bytes do not fit a 32-bit atom size", self.size)
                })?;
            stream.seek_to(self.start)?;
            stream.write_u32(size)?;
        }
        stream.seek_to(self.end)?;
        Ok(self)
    }

    /// Runs `body` between `write_header()` and `write_footer()`.
    /// If `body` fails the stream is rewound to the start of the atom.
    pub fn finish<F>(self, stream: &mut ByteStream, body: F) -> Result<Self, ContainerError>
    where
        F: FnOnce(&mut ByteStream) -> Result<(), ContainerError>
    {
        match body(stream) {
            Ok(()) => self.write_footer(stream),
            Err(err) => {
                // best effort, the original error is what matters
                let _ = stream.seek_to(self.start);
                Err(err)
            }
        }
    }

    /// 4-byte literal comparison.
    pub fn is(&self, tag: &[u8; 4]) -> bool {
        self.tag.is(tag)
    }

    /// Seeks to the end of the atom. A zero-sized atom advances
    /// one byte so that walkers always make progress.
    pub fn skip(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        let end = match self.start == self.end {
            true => self.end + 1,
            false => self.end,
        };
        stream.seek_to(end)?;
        Ok(())
    }

    pub fn header_size(&self) -> u64 {
        match self.use_64 {
            true => HEADER_LENGTH_64,
            false => HEADER_LENGTH,
        }
    }

    /// Absolute offset of the data load, i.e. directly after the header.
    pub fn data_offset(&self) -> u64 {
        self.start + self.header_size()
    }

    /// Size of data load, excluding header.
    pub fn data_size(&self) -> u64 {
        self.end.saturating_sub(self.data_offset())
    }

    pub fn bounds(&self) -> Range<u64> {
        self.start .. self.end
    }

    pub fn contains(&self, other: &Atom) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    pub fn is_container(&self) -> bool {
        CONTAINER.contains(&self.tag)
    }

    /// Pseudo atom spanning the whole stream,
    /// the parent of all top-level atoms.
    pub fn root(stream: &ByteStream) -> Self {
        Self {
            start: 0,
            end: stream.len(),
            size: stream.len(),
            tag: FourCC::default(),
            use_64: false,
        }
    }
}

/// Writes one atom: header, `body`, then patched size.
/// Uses a 64-bit header if the stream is set to force wide sizes.
pub fn write_atom<F>(stream: &mut ByteStream, tag: FourCC, body: F) -> Result<Atom, ContainerError>
where
    F: FnOnce(&mut ByteStream) -> Result<(), ContainerError>
{
    let atom = match stream.wide_sizes {
        true => Atom::write_header64(stream, tag)?,
        false => Atom::write_header(stream, tag)?,
    };
    atom.finish(stream, body)
}

/// Writes one atom with a 64-bit header.
pub fn write_atom64<F>(stream: &mut ByteStream, tag: FourCC, body: F) -> Result<Atom, ContainerError>
where
    F: FnOnce(&mut ByteStream) -> Result<(), ContainerError>
{
    let atom = Atom::write_header64(stream, tag)?;
    atom.finish(stream, body)
}

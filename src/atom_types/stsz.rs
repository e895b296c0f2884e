//! Sample size atom (`stsz`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stsz`
//!
//! Note that `stsz` lists sample size not chunk size.
//! `stco` or `co64` list chunk offsets, not offsets to individual samples.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sample_size_atom>

use crate::{atom::Atom, ByteStream, ContainerError, FourCC};

use super::AtomBody;

/// Sample size atom (`stsz`).
///
/// Location: `moov/trak[multiple]/mdia/minf/stbl/stsz`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/sample_size_atom>
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stsz {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    /// Sample size.
    /// If 0 the table lists individual sizes,
    /// else all `sample_count` samples have this size
    /// and the table is empty.
    pub(crate) sample_size: u32,
    pub(crate) sample_count: u32,
    pub(crate) sizes: Vec<u32>,
}

impl AtomBody for Stsz {
    const TAG: FourCC = FourCC::Stsz;

    fn read_body(stream: &mut ByteStream, _atom: &Atom) -> Result<Self, ContainerError> {
        let version = stream.read_u8()?;
        let flags: [u8; 3] = stream.read_be()?;
        let sample_size = stream.read_u32()?;
        let sample_count = stream.read_u32()?;
        let sizes = match sample_size {
            0 => {
                if sample_count as u64 * 4 > stream.remaining() {
                    return Err(ContainerError::UnexpectedEof{
                        offset: stream.position(),
                        wanted: sample_count as u64 * 4
                    })
                }
                (0 .. sample_count)
                    .map(|_| stream.read_u32())
                    .collect::<Result<Vec<_>, _>>()?
            },
            _ => Vec::new(),
        };
        Ok(Self{version, flags, sample_size, sample_count, sizes})
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        stream.write_u8(self.version)?;
        stream.write_be(&self.flags)?;
        stream.write_u32(self.sample_size)?;
        match self.sample_size {
            0 => {
                stream.write_u32(u32::try_from(self.sizes.len())?)?;
                for size in self.sizes.iter() {
                    stream.write_u32(*size)?;
                }
            },
            _ => stream.write_u32(self.sample_count)?,
        }
        Ok(())
    }
}

impl Stsz {
    /// Table with one shared size for all samples.
    pub fn constant(sample_size: u32, sample_count: u32) -> Self {
        Self{sample_size, sample_count, ..Default::default()}
    }

    pub fn len(&self) -> u64 {
        match self.sample_size {
            0 => self.sizes.len() as u64,
            _ => self.sample_count as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    /// Size in bytes of `sample` (0-based).
    pub fn size_of_sample(&self, sample: u64) -> Option<u32> {
        match self.sample_size {
            0 => self.sizes.get(usize::try_from(sample).ok()?).copied(),
            s if sample < self.sample_count as u64 => Some(s),
            _ => None,
        }
    }

    /// Total size in bytes of samples `first .. first + count`.
    pub fn range_size(&self, first: u64, count: u64) -> u64 {
        (first .. first + count)
            .filter_map(|s| self.size_of_sample(s))
            .map(|s| s as u64)
            .sum()
    }

    /// Returns discrete list of sample sizes in bytes.
    pub fn sizes(&self) -> Vec<u32> {
        match self.sample_size {
            0 => self.sizes.clone(),
            s => vec![s; self.sample_count as usize],
        }
    }

    /// Appends the size of one sample.
    pub fn push(&mut self, size: u32) {
        match self.sample_size {
            0 => self.sizes.push(size),
            s if s == size => self.sample_count += 1,
            s => {
                // constant size broken, expand to a table
                self.sizes = vec![s; self.sample_count as usize];
                self.sizes.push(size);
                self.sample_size = 0;
            }
        }
        self.sample_count = self.sample_count.max(self.sizes.len() as u32);
    }
}

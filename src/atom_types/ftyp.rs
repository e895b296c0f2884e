//! File type compatibility atom (`ftyp`).
//!
//! Location: `ftyp` (the very first atom in an MP4 file)
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/file_type_compatibility_atom>

use crate::{atom::Atom, ByteStream, ContainerError, FourCC};

use super::AtomBody;

/// File type compatibility atom (`ftyp`).
///
/// Location: `ftyp` (the very first atom in an MP4 file)
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/file_type_compatibility_atom>
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ftyp {
    pub(crate) major_brand: FourCC,
    /// MP4: seems to be set to 0.
    /// QuickTime: Four binary-coded decimal values, indicating the century, year, and month of format spec.
    pub(crate) minor_version: u32,
    pub(crate) compatible_brands: Vec<FourCC>,
}

impl AtomBody for Ftyp {
    const TAG: FourCC = FourCC::Ftyp;

    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        let major_brand = stream.read_fourcc()?;
        let minor_version = stream.read_u32()?;
        let count = atom.data_size().saturating_sub(8) / 4;
        let compatible_brands = (0 .. count)
            .map(|_| stream.read_fourcc())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self{major_brand, minor_version, compatible_brands})
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        stream.write_fourcc(&self.major_brand)?;
        stream.write_u32(self.minor_version)?;
        for brand in self.compatible_brands.iter() {
            stream.write_fourcc(brand)?;
        }
        Ok(())
    }
}

impl Ftyp {
    pub fn new(major_brand: &[u8; 4], minor_version: u32, compatible: &[&[u8; 4]]) -> Self {
        Self {
            major_brand: FourCC::from(major_brand),
            minor_version,
            compatible_brands: compatible.iter().map(|b| FourCC::from(*b)).collect(),
        }
    }

    pub fn major_brand(&self) -> FourCC {
        self.major_brand
    }

    pub fn minor_version(&self) -> u32 {
        self.minor_version
    }

    pub fn compatible_brands(&self) -> &[FourCC] {
        &self.compatible_brands
    }
}

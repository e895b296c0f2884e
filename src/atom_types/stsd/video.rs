//! Video sample description.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/video_sample_description>

use crate::{
    atom::Atom,
    support::{counted_string, to_counted},
    ByteStream,
    ContainerError,
    FourCC,
};

use super::{extension::{read_extensions, write_extensions}, Esds, Extension, Fiel, Pasp};

#[derive(Debug, Clone, PartialEq)]
pub struct VideoDescription {
    /// Sample description version.
    pub version: u16,
    pub revision_level: u16,
    /// Developer of the compressor that generated the compressed data.
    pub vendor: FourCC,
    /// Degree of temporal compression (0-1023).
    pub temporal_quality: u32,
    /// Degree of spatial compression (0-1024).
    pub spatial_quality: u32,
    /// Width of the source image in pixels.
    pub width: u16,
    /// Height of the source image in pixels.
    pub height: u16,
    /// Horizontal resolution in pixels per inch (16.16 fixed point in file).
    pub horizontal_resolution: f64,
    /// Vertical resolution in pixels per inch (16.16 fixed point in file).
    pub vertical_resolution: f64,
    pub data_size: u32,
    /// How many frames of compressed data are stored in each sample.
    pub frame_count: u16,
    /// Stored as a 32-byte Pascal string, e.g. "jpeg".
    pub compressor_name: String,
    /// Pixel depth, e.g. 24 for RGB, 32 for RGBA.
    pub depth: u16,
    /// Color table ID, -1 for the default table.
    pub color_table_id: i16,
    pub extensions: Vec<Extension>,
}

impl Default for VideoDescription {
    fn default() -> Self {
        Self {
            version: 0,
            revision_level: 0,
            vendor: FourCC::Custom(*b"lqt "),
            temporal_quality: 0,
            spatial_quality: 1024,
            width: 0,
            height: 0,
            horizontal_resolution: 72.0,
            vertical_resolution: 72.0,
            data_size: 0,
            frame_count: 1,
            compressor_name: String::new(),
            depth: 24,
            color_table_id: -1,
            extensions: Vec::new(),
        }
    }
}

impl VideoDescription {
    pub fn new(width: u16, height: u16, depth: u16, compressor_name: &str) -> Self {
        Self {
            width,
            height,
            depth,
            compressor_name: compressor_name.to_owned(),
            ..Default::default()
        }
    }

    pub(crate) fn read(stream: &mut ByteStream, entry: &Atom) -> Result<Self, ContainerError> {
        let version = stream.read_u16()?;
        let revision_level = stream.read_u16()?;
        let vendor = stream.read_fourcc()?;
        let temporal_quality = stream.read_u32()?;
        let spatial_quality = stream.read_u32()?;
        let width = stream.read_u16()?;
        let height = stream.read_u16()?;
        let horizontal_resolution = stream.read_fixed32()?;
        let vertical_resolution = stream.read_fixed32()?;
        let data_size = stream.read_u32()?;
        let frame_count = stream.read_u16()?;
        let compressor_name = counted_string(&stream.read_fixed_bytes(32)?);
        let depth = stream.read_u16()?;
        let color_table_id = stream.read_i16()?;

        let extensions = read_extensions(stream, entry)?;

        Ok(Self {
            version,
            revision_level,
            vendor,
            temporal_quality,
            spatial_quality,
            width,
            height,
            horizontal_resolution,
            vertical_resolution,
            data_size,
            frame_count,
            compressor_name,
            depth,
            color_table_id,
            extensions,
        })
    }

    pub(crate) fn write(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        stream.write_u16(self.version)?;
        stream.write_u16(self.revision_level)?;
        stream.write_fourcc(&self.vendor)?;
        stream.write_u32(self.temporal_quality)?;
        stream.write_u32(self.spatial_quality)?;
        stream.write_u16(self.width)?;
        stream.write_u16(self.height)?;
        stream.write_fixed32(self.horizontal_resolution)?;
        stream.write_fixed32(self.vertical_resolution)?;
        stream.write_u32(self.data_size)?;
        stream.write_u16(self.frame_count)?;
        stream.write_fixed_bytes(&to_counted(&self.compressor_name, 32))?;
        stream.write_u16(self.depth)?;
        stream.write_i16(self.color_table_id)?;
        write_extensions(stream, &self.extensions)
    }

    pub fn pasp(&self) -> Option<&Pasp> {
        self.extensions.iter().find_map(|e| match e {
            Extension::Pasp(p) => Some(p),
            _ => None,
        })
    }

    pub fn fiel(&self) -> Option<&Fiel> {
        self.extensions.iter().find_map(|e| match e {
            Extension::Fiel(f) => Some(f),
            _ => None,
        })
    }

    pub fn esds(&self) -> Option<&Esds> {
        self.extensions.iter().find_map(|e| match e {
            Extension::Esds(e) => Some(e),
            _ => None,
        })
    }
}

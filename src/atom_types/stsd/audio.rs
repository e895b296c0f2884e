//! Sound sample description, versions 0, 1 and 2.
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sound_sample_descriptions>

use crate::{
    atom::Atom,
    stream::correct_sample_rate,
    ByteStream,
    ContainerError,
    FourCC,
};

use super::{extension::{read_extensions, write_extensions}, Esds, Extension};

/// Size of the version 2 fields, as stored in `sizeOfStructOnly`.
const V2_STRUCT_SIZE: u32 = 72;
const V2_ALWAYS_7F000000: u32 = 0x7f00_0000;

/// Version specific fields.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum AudioVersion {
    #[default]
    V0,
    V1 {
        samples_per_packet: u32,
        bytes_per_packet: u32,
        bytes_per_frame: u32,
        bytes_per_sample: u32,
    },
    /// Channel count, sample size and rate are stored in the
    /// version 2 fields, the version 0 fields hold fixed values.
    V2 {
        format_flags: u32,
        const_bytes_per_packet: u32,
        const_frames_per_packet: u32,
    },
}

impl AudioVersion {
    fn number(&self) -> u16 {
        match self {
            Self::V0 => 0,
            Self::V1 {..} => 1,
            Self::V2 {..} => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AudioDescription {
    pub revision_level: u16,
    pub vendor: FourCC,
    pub channels: u32,
    /// Bits per sample.
    pub sample_size: u32,
    pub compression_id: i16,
    pub packet_size: u16,
    /// Sample rate in Hz.
    pub sample_rate: f64,
    pub version: AudioVersion,
    pub extensions: Vec<Extension>,
}

impl Default for AudioDescription {
    fn default() -> Self {
        Self {
            revision_level: 0,
            vendor: FourCC::default(),
            channels: 2,
            sample_size: 16,
            compression_id: 0,
            packet_size: 0,
            sample_rate: 44100.0,
            version: AudioVersion::V0,
            extensions: Vec::new(),
        }
    }
}

impl AudioDescription {
    pub fn new(channels: u32, sample_rate: f64, sample_size: u32) -> Self {
        Self{channels, sample_rate, sample_size, ..Default::default()}
    }

    pub(crate) fn read(stream: &mut ByteStream, entry: &Atom) -> Result<Self, ContainerError> {
        let version = stream.read_u16()?;
        let revision_level = stream.read_u16()?;
        let vendor = stream.read_fourcc()?;
        let channels = stream.read_u16()?;
        let sample_size = stream.read_u16()?;
        let compression_id = stream.read_i16()?;
        let packet_size = stream.read_u16()?;
        // Rates above 65535 Hz wrap in the 16.16 field.
        let sample_rate = correct_sample_rate(stream.read_fixed32()?);

        let mut desc = Self {
            revision_level,
            vendor,
            channels: channels as u32,
            sample_size: sample_size as u32,
            compression_id,
            packet_size,
            sample_rate,
            version: AudioVersion::V0,
            extensions: Vec::new(),
        };

        match version {
            1 => {
                desc.version = AudioVersion::V1 {
                    samples_per_packet: stream.read_u32()?,
                    bytes_per_packet: stream.read_u32()?,
                    bytes_per_frame: stream.read_u32()?,
                    bytes_per_sample: stream.read_u32()?,
                };
            },
            2 => {
                let _size_of_struct = stream.read_u32()?;
                desc.sample_rate = stream.read_double64()?;
                desc.channels = stream.read_u32()?;
                let _always_7f000000 = stream.read_u32()?;
                desc.sample_size = stream.read_u32()?;
                desc.version = AudioVersion::V2 {
                    format_flags: stream.read_u32()?,
                    const_bytes_per_packet: stream.read_u32()?,
                    const_frames_per_packet: stream.read_u32()?,
                };
            },
            0 => (),
            v => stream.log.warn(format_args!(
                "unknown sound description version {v} @ {}, reading as version 0", entry.start
            )),
        }

        desc.extensions = read_extensions(stream, entry)?;

        Ok(desc)
    }

    pub(crate) fn write(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        stream.write_u16(self.version.number())?;
        stream.write_u16(self.revision_level)?;
        stream.write_fourcc(&self.vendor)?;

        match self.version {
            AudioVersion::V2 {format_flags, const_bytes_per_packet, const_frames_per_packet} => {
                stream.write_u16(3)?;
                stream.write_u16(16)?;
                stream.write_i16(-2)?;
                stream.write_u16(0)?;
                stream.write_fixed32(1.0)?;

                stream.write_u32(V2_STRUCT_SIZE)?;
                stream.write_double64(self.sample_rate)?;
                stream.write_u32(self.channels)?;
                stream.write_u32(V2_ALWAYS_7F000000)?;
                stream.write_u32(self.sample_size)?;
                stream.write_u32(format_flags)?;
                stream.write_u32(const_bytes_per_packet)?;
                stream.write_u32(const_frames_per_packet)?;
            },
            v => {
                stream.write_u16(u16::try_from(self.channels)?)?;
                stream.write_u16(u16::try_from(self.sample_size)?)?;
                stream.write_i16(self.compression_id)?;
                stream.write_u16(self.packet_size)?;
                stream.write_fixed32(self.sample_rate)?;
                if let AudioVersion::V1 {samples_per_packet, bytes_per_packet, bytes_per_frame, bytes_per_sample} = v {
                    stream.write_u32(samples_per_packet)?;
                    stream.write_u32(bytes_per_packet)?;
                    stream.write_u32(bytes_per_frame)?;
                    stream.write_u32(bytes_per_sample)?;
                }
            }
        }

        write_extensions(stream, &self.extensions)
    }

    pub fn esds(&self) -> Option<&Esds> {
        self.extensions.iter().find_map(|e| match e {
            Extension::Esds(e) => Some(e),
            _ => None,
        })
    }
}

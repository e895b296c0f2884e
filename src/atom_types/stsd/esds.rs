//! Elementary stream descriptor atom (`esds`), MP4 only.
//!
//! Holds a chain of MPEG-4 descriptors, each a tag byte followed by
//! a variable length size (1-4 bytes, 7 bits each, high bit set
//! on all bytes but the last):
//! - `0x03` ES descriptor
//! - `0x04` decoder config descriptor
//! - `0x05` decoder specific info (e.g. AudioSpecificConfig)
//! - `0x06` SL config descriptor

use crate::{atom::Atom, ByteStream, ContainerError, FourCC};

use super::super::AtomBody;

const ES_DESCRIPTOR: u8 = 0x03;
const DECODER_CONFIG: u8 = 0x04;
const DECODER_SPECIFIC: u8 = 0x05;
const SL_CONFIG: u8 = 0x06;

/// Reads a descriptor length: up to 4 bytes, 7 bits each.
pub fn read_descriptor_length(stream: &mut ByteStream) -> Result<u32, ContainerError> {
    let mut len = 0u32;
    for _ in 0 .. 4 {
        let b = stream.read_u8()?;
        len = (len << 7) | (b & 0x7f) as u32;
        if b & 0x80 == 0 {
            break
        }
    }
    Ok(len)
}

/// Writes a descriptor length. `compact` uses as few bytes as
/// possible, otherwise the length is always padded to 4 bytes.
pub fn write_descriptor_length(stream: &mut ByteStream, len: u32, compact: bool) -> Result<(), ContainerError> {
    let n = match compact {
        true => length_bytes(len),
        false => 4,
    };
    for i in (0 .. n).rev() {
        let b = ((len >> (7 * i)) & 0x7f) as u8;
        match i {
            0 => stream.write_u8(b)?,
            _ => stream.write_u8(b | 0x80)?,
        }
    }
    Ok(())
}

fn length_bytes(len: u32) -> u32 {
    match len {
        0 ..= 0x7f => 1,
        0x80 ..= 0x3fff => 2,
        0x4000 ..= 0x1f_ffff => 3,
        _ => 4,
    }
}

/// Total size of a descriptor with a `len` byte body.
fn descriptor_size(len: u32, compact: bool) -> u32 {
    let n = match compact {
        true => length_bytes(len),
        false => 4,
    };
    1 + n + len
}

/// Elementary stream descriptor atom (`esds`).
#[derive(Debug, Clone, PartialEq)]
pub struct Esds {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    pub es_id: u16,
    pub stream_priority: u8,
    /// MPEG-4 object type, e.g. `0x40` for AAC.
    pub object_type: u8,
    /// Stream type (upper 6 bits), e.g. `0x05` audio, `0x04` video.
    pub stream_type: u8,
    pub buffer_size: u32,
    pub max_bitrate: u32,
    pub avg_bitrate: u32,
    /// Decoder specific info, opaque.
    pub decoder_config: Vec<u8>,
    /// Write descriptor lengths with as few bytes as possible.
    pub compact: bool,
}

impl Default for Esds {
    fn default() -> Self {
        Self {
            version: 0,
            flags: [0; 3],
            es_id: 0,
            stream_priority: 0,
            object_type: 0x40,
            stream_type: 0x05,
            buffer_size: 0,
            max_bitrate: 0,
            avg_bitrate: 0,
            decoder_config: Vec::new(),
            compact: false,
        }
    }
}

impl Esds {
    fn expect_tag(stream: &mut ByteStream, atom: &Atom, tag: u8) -> Result<u32, ContainerError> {
        let offset = stream.position();
        let found = stream.read_u8()?;
        if found != tag {
            return Err(ContainerError::MalformedAtomGraph{
                tag: atom.tag,
                offset,
                reason: format!("expected descriptor tag {tag:#04x}, found {found:#04x}")
            })
        }
        read_descriptor_length(stream)
    }
}

impl AtomBody for Esds {
    const TAG: FourCC = FourCC::Esds;

    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        let version = stream.read_u8()?;
        let flags: [u8; 3] = stream.read_be()?;

        let es_start = stream.position();
        Self::expect_tag(stream, atom, ES_DESCRIPTOR)?;
        let compact = stream.position() - es_start < 5;
        let es_id = stream.read_u16()?;
        let es_flags = stream.read_u8()?;
        if es_flags & 0x80 != 0 {
            let _depends_on_es_id = stream.read_u16()?;
        }
        if es_flags & 0x40 != 0 {
            let url_len = stream.read_u8()?;
            stream.seek_relative(url_len as i64)?;
        }
        if es_flags & 0x20 != 0 {
            let _ocr_es_id = stream.read_u16()?;
        }

        Self::expect_tag(stream, atom, DECODER_CONFIG)?;
        let object_type = stream.read_u8()?;
        let stream_type = stream.read_u8()? >> 2;
        let buffer_size = stream.read_u24()?;
        let max_bitrate = stream.read_u32()?;
        let avg_bitrate = stream.read_u32()?;

        let mut decoder_config = Vec::new();
        if stream.position() < atom.end {
            let tag = stream.read_u8()?;
            let len = read_descriptor_length(stream)?;
            if tag == DECODER_SPECIFIC {
                decoder_config = stream.read_fixed_bytes(len as u64)?;
            }
        }
        // SL config is always predefined 2 for MP4, not kept.

        Ok(Self {
            version,
            flags,
            es_id,
            stream_priority: es_flags & 0x1f,
            object_type,
            stream_type,
            buffer_size,
            max_bitrate,
            avg_bitrate,
            decoder_config,
            compact,
        })
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        let compact = self.compact;
        let specific_len = u32::try_from(self.decoder_config.len())?;
        let config_len = 13 + descriptor_size(specific_len, compact);
        let es_len = 3 + descriptor_size(config_len, compact) + descriptor_size(1, compact);

        stream.write_u8(self.version)?;
        stream.write_be(&self.flags)?;

        stream.write_u8(ES_DESCRIPTOR)?;
        write_descriptor_length(stream, es_len, compact)?;
        stream.write_u16(self.es_id)?;
        stream.write_u8(self.stream_priority & 0x1f)?;

        stream.write_u8(DECODER_CONFIG)?;
        write_descriptor_length(stream, config_len, compact)?;
        stream.write_u8(self.object_type)?;
        // upstream flag 0, reserved bit 1
        stream.write_u8((self.stream_type << 2) | 1)?;
        stream.write_u24(self.buffer_size)?;
        stream.write_u32(self.max_bitrate)?;
        stream.write_u32(self.avg_bitrate)?;

        stream.write_u8(DECODER_SPECIFIC)?;
        write_descriptor_length(stream, specific_len, compact)?;
        stream.write_fixed_bytes(&self.decoder_config)?;

        stream.write_u8(SL_CONFIG)?;
        write_descriptor_length(stream, 1, compact)?;
        stream.write_u8(2)
    }
}

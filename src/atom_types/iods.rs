//! Initial object descriptor atom (`iods`), MP4 only.
//!
//! Location: `moov/iods`

use crate::{atom::Atom, ByteStream, ContainerError, FourCC};

use super::{read_descriptor_length, write_descriptor_length, AtomBody};

const MP4_IOD_TAG: u8 = 0x10;
const ES_ID_INC_TAG: u8 = 0x0e;

/// Initial object descriptor atom (`iods`).
#[derive(Debug, Clone, PartialEq)]
pub struct Iods {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    /// 10-bit object descriptor ID, URL flag,
    /// include inline profiles flag, reserved bits.
    pub(crate) od_id_flags: u16,
    pub(crate) od_profile_level: u8,
    pub(crate) scene_profile_level: u8,
    pub(crate) audio_profile_level: u8,
    pub(crate) video_profile_level: u8,
    pub(crate) graphics_profile_level: u8,
    /// Track IDs referenced via ES_ID_Inc descriptors.
    pub(crate) track_ids: Vec<u32>,
}

impl Default for Iods {
    fn default() -> Self {
        Self {
            version: 0,
            flags: [0; 3],
            od_id_flags: 0x004f,
            od_profile_level: 0xff,
            scene_profile_level: 0xff,
            audio_profile_level: 0xff,
            video_profile_level: 0xff,
            graphics_profile_level: 0xff,
            track_ids: Vec::new(),
        }
    }
}

impl AtomBody for Iods {
    const TAG: FourCC = FourCC::Iods;

    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        let version = stream.read_u8()?;
        let flags: [u8; 3] = stream.read_be()?;
        let _tag = stream.read_u8()?;
        let _len = read_descriptor_length(stream)?;
        let od_id_flags = stream.read_u16()?;
        let [od, scene, audio, video, graphics]: [u8; 5] = stream.read_be()?;

        let mut track_ids = Vec::new();
        while stream.position() + 6 <= atom.end {
            let tag = stream.read_u8()?;
            let len = read_descriptor_length(stream)?;
            match tag {
                ES_ID_INC_TAG if len >= 4 => {
                    track_ids.push(stream.read_u32()?);
                    stream.seek_relative(len as i64 - 4)?;
                },
                _ => {
                    stream.seek_relative(len as i64)?;
                }
            }
        }

        Ok(Self {
            version,
            flags,
            od_id_flags,
            od_profile_level: od,
            scene_profile_level: scene,
            audio_profile_level: audio,
            video_profile_level: video,
            graphics_profile_level: graphics,
            track_ids,
        })
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        stream.write_u8(self.version)?;
        stream.write_be(&self.flags)?;
        stream.write_u8(MP4_IOD_TAG)?;
        // 2 + 5 fixed bytes, 1 + 1 + 4 per track
        let len = 7 + 6 * self.track_ids.len() as u32;
        write_descriptor_length(stream, len, false)?;
        stream.write_u16(self.od_id_flags)?;
        stream.write_be(&[
            self.od_profile_level,
            self.scene_profile_level,
            self.audio_profile_level,
            self.video_profile_level,
            self.graphics_profile_level,
        ])?;
        for id in self.track_ids.iter() {
            stream.write_u8(ES_ID_INC_TAG)?;
            write_descriptor_length(stream, 4, true)?;
            stream.write_u32(*id)?;
        }
        Ok(())
    }
}

impl Iods {
    pub fn track_ids(&self) -> &[u32] {
        &self.track_ids
    }

    pub fn audio_profile_level(&self) -> u8 {
        self.audio_profile_level
    }

    pub fn video_profile_level(&self) -> u8 {
        self.video_profile_level
    }
}

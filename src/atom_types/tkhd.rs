//! Track header atom (`tkhd`).
//!
//! Location: `moov/trak[multiple]/tkhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/track_header_atom>

use binrw::binrw;
use time::{Duration, PrimitiveDateTime};

use crate::{consts::mp4_time_now, mp4_time_zero, FourCC};

use super::IDENTITY_MATRIX;

/// Track header atom (`tkhd`).
///
/// Location: `moov/trak[multiple]/tkhd`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/track_header_atom>
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct Tkhd {
    pub(crate) version: u8,
    /// Bit 0: enabled, 1: in movie, 2: in preview, 3: in poster.
    pub(crate) flags: [u8; 3],
    /// Seconds since midnight, January 1, 1904.
    pub(crate) creation_time: u32,
    pub(crate) modification_time: u32,
    /// Uniquely identifies the track.
    /// Value 0 cannot be used.
    pub(crate) track_id: u32,
    pub(crate) reserved1: [u8; 4],
    /// Duration in the movie's time scale.
    pub(crate) duration: u32,
    pub(crate) reserved2: [u8; 8],
    /// This track's spatial priority in its movie.
    pub(crate) layer: u16,
    /// Identifies a collection of movie tracks that contain alternate data for one another.
    pub(crate) alternate_group: u16,
    /// 8.8 fixed point, 1.0 indicates normal volume.
    pub(crate) volume: u16,
    pub(crate) reserved3: [u8; 2],
    pub(crate) matrix: [u32; 9],
    /// 16.16 fixed point width in pixels.
    pub(crate) track_width: u32,
    /// 16.16 fixed point height in pixels.
    pub(crate) track_height: u32,
}

binrw_atom!(Tkhd, FourCC::Tkhd);

impl Tkhd {
    /// New enabled track header. `width`/`height` are 0 for sound tracks,
    /// which instead get full volume.
    pub fn new(track_id: u32, width: u32, height: u32) -> Self {
        let now = mp4_time_now();
        let is_video = width > 0 || height > 0;
        Self {
            version: 0,
            flags: [0, 0, 0x0f],
            creation_time: now,
            modification_time: now,
            track_id,
            reserved1: [0; 4],
            duration: 0,
            reserved2: [0; 8],
            layer: 0,
            alternate_group: 0,
            volume: if is_video {0} else {0x0100},
            reserved3: [0; 2],
            matrix: IDENTITY_MATRIX,
            track_width: width << 16,
            track_height: height << 16,
        }
    }

    pub fn track_id(&self) -> u32 {
        self.track_id
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Width in pixels, integer part only.
    pub fn width(&self) -> u32 {
        self.track_width >> 16
    }

    /// Height in pixels, integer part only.
    pub fn height(&self) -> u32 {
        self.track_height >> 16
    }

    pub fn creation_time(&self) -> PrimitiveDateTime {
        mp4_time_zero() + Duration::seconds(self.creation_time as i64)
    }

    pub fn is_enabled(&self) -> bool {
        self.flags[2] & 1 == 1
    }
}

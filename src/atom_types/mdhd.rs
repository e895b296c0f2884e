//! Media header atom (`mdhd`).
//!
//! Location: `moov/trak[multiple]/mdia/mdhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/media_header_atom>

use binrw::binrw;
use time::{Duration, PrimitiveDateTime, ext::NumericalDuration};

use crate::{consts::mp4_time_now, mp4_time_zero, FourCC};


/// Media header atom (`mdhd`).
///
/// Location: `moov/trak[multiple]/mdia/mdhd`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/media_header_atom>
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct Mdhd {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    pub(crate) creation_time: u32,
    pub(crate) modification_time: u32,
    /// Time units per second for this media.
    pub(crate) time_scale: u32,
    /// Duration in `time_scale` units.
    pub(crate) duration: u32,
    pub(crate) language: u16,
    pub(crate) quality: u16,
}

binrw_atom!(Mdhd, FourCC::Mdhd);

impl Mdhd {
    pub fn new(time_scale: u32) -> Self {
        let now = mp4_time_now();
        Self {
            version: 0,
            flags: [0; 3],
            creation_time: now,
            modification_time: now,
            time_scale,
            duration: 0,
            language: 0,
            quality: 100,
        }
    }

    pub fn time_scale(&self) -> u32 {
        self.time_scale
    }

    pub fn duration_ticks(&self) -> u32 {
        self.duration
    }

    pub fn duration(&self) -> Duration {
        match self.time_scale {
            0 => Duration::ZERO,
            ts => (self.duration as f64 / ts as f64).seconds(),
        }
    }

    pub fn creation_time(&self) -> PrimitiveDateTime {
        mp4_time_zero() + Duration::seconds(self.creation_time as i64)
    }
}

//! Movie header atom (`mvhd`).
//!
//! Location: `moov/mvhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/movie_header_atom>

use binrw::binrw;
use time::{Duration, ext::NumericalDuration};

use crate::{consts::mp4_time_now, mp4_time_zero, FourCC};

use super::IDENTITY_MATRIX;

/// Movie header atom (`mvhd`).
///
/// Location: `moov/mvhd`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/movie_header_atom>
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct Mvhd {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    /// Seconds since midnight, 1904-01-01 UTC
    pub creation_time: u32,
    /// Seconds since midnight, 1904-01-01 UTC
    pub modification_time: u32,
    /// Number of time units that pass in one second
    pub time_scale: u32,
    /// Unscaled duration. I.e. "time units"
    /// that require dividing by time scale
    /// to derive a value in seconds.
    ///
    /// Corresponds to the longest track.
    pub duration: u32,
    /// Fixed point number (16.16)
    /// representing preferred play rate
    /// (1.0 = normal playback).
    pub preferred_rate: u32,
    /// Fixed point number (8.8)
    /// representing preferred volume
    /// (1.0 = full volume).
    pub preferred_volume: u16,
    pub(crate) reserved: [u8; 10],
    /// Row-major 3x3 matrix
    pub matrix: [u32; 9],
    pub preview_time: u32,
    pub preview_duration: u32,
    pub poster_time: u32,
    pub selection_time: u32,
    pub selection_duration: u32,
    pub current_time: u32,
    pub next_track_id: u32,
}

binrw_atom!(Mvhd, FourCC::Mvhd);

impl Mvhd {
    /// New movie header, timestamped now.
    pub fn new(time_scale: u32) -> Self {
        let now = mp4_time_now();
        Self {
            version: 0,
            flags: [0; 3],
            creation_time: now,
            modification_time: now,
            time_scale,
            duration: 0,
            preferred_rate: 0x00010000,
            preferred_volume: 0x0100,
            reserved: [0; 10],
            matrix: IDENTITY_MATRIX,
            preview_time: 0,
            preview_duration: 0,
            poster_time: 0,
            selection_time: 0,
            selection_duration: 0,
            current_time: 0,
            next_track_id: 1,
        }
    }

    /// Creation time as UTC datetime.
    /// May default to MP4 default time
    /// `1904-01-01 00:00:00` depending on device and settings.
    pub fn creation_time(&self) -> time::PrimitiveDateTime {
        mp4_time_zero() + Duration::seconds(self.creation_time as i64)
    }

    /// Modification time as UTC datetime.
    pub fn modification_time(&self) -> time::PrimitiveDateTime {
        mp4_time_zero() + Duration::seconds(self.modification_time as i64)
    }

    /// Duration of the longest track in seconds.
    pub fn duration(&self) -> Duration {
        match self.time_scale {
            0 => Duration::ZERO,
            ts => (self.duration as f64 / ts as f64).seconds(),
        }
    }
}

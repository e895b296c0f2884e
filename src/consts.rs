use time::{Duration, OffsetDateTime, PrimitiveDateTime};

use crate::FourCC;

/// Size in bytes of a regular atom header (size + tag).
pub const HEADER_LENGTH: u64 = 8;
/// Size in bytes of an atom header with a 64-bit size
/// (size == 1 + tag + extended size).
pub const HEADER_LENGTH_64: u64 = 16;
/// Size in bytes of a QTVR atom header
/// (size, tag, id, reserved, child count, reserved).
pub const QTATOM_HEADER_LENGTH: u64 = 20;
/// How far back the movie header writer rewinds
/// before its single retry after a failed write.
pub const MOOV_RETRY_REWIND: u64 = 0x100000;

/// Seconds between 1904-01-01 and 1970-01-01.
pub const MAC_EPOCH_OFFSET: i64 = 2_082_844_800;

/// FourCC:s for known "container" atoms.
/// These are nested and contain more atoms,
/// within their specified, total size.
///
/// - `moov`: offset tables, timing, metadata
/// - `trak`: moov.trak (multiple)
/// - `tref`: moov.trak.tref
/// - `edts`: moov.trak.edts
/// - `mdia`: moov.trak.mdia
/// - `minf`: moov.trak.mdia.minf
/// - `dinf`: moov.trak.mdia.minf.dinf
/// - `stbl`: moov.trak.mdia.minf.stbl, contains timing (stts), offsets (stco)
/// - `udta`: moov.udta, moov.trak.udta
/// - `cmov`: compressed `moov`
pub const CONTAINER: [FourCC; 10] = [
    FourCC::Moov,
    FourCC::Trak,
    FourCC::Tref,
    FourCC::Edts,
    FourCC::Mdia,
    FourCC::Minf,
    FourCC::Dinf,
    FourCC::Stbl,
    FourCC::Udta,
    FourCC::Cmov,
];

/// Top-level atoms that identify a QuickTime/MP4 file,
/// even when `moov` is missing.
pub const TOP_LEVEL: [FourCC; 8] = [
    FourCC::Ftyp,
    FourCC::Moov,
    FourCC::Mdat,
    FourCC::Free,
    FourCC::Skip,
    FourCC::Wide,
    FourCC::Pnot,
    FourCC::Uuid,
];

/// Time zero for MP4 containers. Midnight January 1, 1904.
pub fn mp4_time_zero() -> PrimitiveDateTime {
    let zero = OffsetDateTime::UNIX_EPOCH - Duration::seconds(MAC_EPOCH_OFFSET);
    PrimitiveDateTime::new(zero.date(), zero.time())
}

/// Seconds since 1904-01-01 for the current time, as stored in
/// `mvhd`, `tkhd`, `mdhd`.
pub fn mp4_time_now() -> u32 {
    let secs = OffsetDateTime::now_utc().unix_timestamp() + MAC_EPOCH_OFFSET;
    u32::try_from(secs).unwrap_or(u32::MAX)
}

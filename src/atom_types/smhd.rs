//! Sound media information header atom (`smhd`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/smhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sound_media_information_header_atom>

use binrw::binrw;

use crate::FourCC;


/// Sound media information header atom (`smhd`).
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Smhd {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    /// 8.8 fixed point, 0 is center.
    pub(crate) balance: i16,
    pub(crate) reserved: u16,
}

binrw_atom!(Smhd, FourCC::Smhd);

impl Smhd {
    pub fn balance(&self) -> f64 {
        self.balance as f64 / 256.0
    }
}

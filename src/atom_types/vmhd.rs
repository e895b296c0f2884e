//! Video media information header atom (`vmhd`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/vmhd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/video_media_information_header_atom>

use binrw::binrw;

use crate::FourCC;


/// Video media information header atom (`vmhd`).
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, PartialEq)]
pub struct Vmhd {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    /// Transfer mode, `0x40` = dither copy.
    pub(crate) graphics_mode: u16,
    /// Red, green, blue for transfer modes that need a color.
    pub(crate) opcolor: [u16; 3],
}

binrw_atom!(Vmhd, FourCC::Vmhd);

impl Default for Vmhd {
    fn default() -> Self {
        Self {
            version: 0,
            flags: [0, 0, 1],
            graphics_mode: 0x40,
            opcolor: [0x8000; 3],
        }
    }
}

impl Vmhd {
    pub fn graphics_mode(&self) -> u16 {
        self.graphics_mode
    }
}

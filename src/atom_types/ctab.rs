//! Color table atom (`ctab`).
//!
//! Location: `moov/ctab`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/color_table_atoms>

use binrw::binrw;

use crate::FourCC;

/// Color table atom (`ctab`).
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ctab {
    pub(crate) seed: u32,
    pub(crate) flags: u16,
    /// Number of entries minus one.
    #[br(temp)]
    #[bw(calc = (entries.len() as u16).wrapping_sub(1))]
    size: u16,
    #[br(count = size as usize + 1)]
    pub(crate) entries: Vec<ColorEntry>,
}

binrw_atom!(Ctab, FourCC::Ctab);

#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorEntry {
    pub alpha: u16,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl Ctab {
    /// Gray ramp with `n` entries.
    pub fn grayscale(n: u16) -> Self {
        let entries = (0 .. n)
            .map(|i| {
                let v = match n {
                    1 => 0xffff,
                    _ => (0xffff_u32 * i as u32 / (n as u32 - 1)) as u16,
                };
                ColorEntry{alpha: 0, red: v, green: v, blue: v}
            })
            .collect();
        Self{seed: 0, flags: 0x8000, entries}
    }

    pub fn entries(&self) -> &[ColorEntry] {
        &self.entries
    }
}

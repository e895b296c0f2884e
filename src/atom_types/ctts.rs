//! Composition offset atom (`ctts`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/ctts`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/composition_offset_atom>

use binrw::binrw;

use crate::FourCC;

/// Composition offset atom (`ctts`).
/// Maps decode order to presentation order for B-frames.
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ctts {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    #[br(temp)]
    #[bw(calc = table.len() as u32)]
    entry_count: u32,
    #[br(count = entry_count)]
    pub(crate) table: Vec<CompositionOffset>,
}

binrw_atom!(Ctts, FourCC::Ctts);

#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompositionOffset {
    pub(crate) sample_count: u32,
    /// Signed in version 1, unsigned (but commonly treated
    /// as signed) in version 0.
    pub(crate) sample_offset: i32,
}

impl Ctts {
    pub fn table(&self) -> &[CompositionOffset] {
        &self.table
    }

    /// Composition offset for `sample` (0-based).
    pub fn offset_of_sample(&self, sample: u64) -> i32 {
        let mut remaining = sample;
        for entry in self.table.iter() {
            if remaining < entry.sample_count as u64 {
                return entry.sample_offset
            }
            remaining -= entry.sample_count as u64;
        }
        0
    }

    pub fn push(&mut self, offset: i32) {
        match self.table.last_mut() {
            Some(last) if last.sample_offset == offset => last.sample_count += 1,
            _ => self.table.push(CompositionOffset{sample_count: 1, sample_offset: offset}),
        }
    }
}

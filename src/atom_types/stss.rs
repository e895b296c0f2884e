//! Sync sample atom (`stss`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stss`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sync_sample_atom>

use binrw::binrw;

use crate::FourCC;

/// Sync sample atom (`stss`). Lists the (1-based) numbers
/// of samples that are key frames. A track without `stss`
/// has only key frames.
///
/// Location: `moov/trak[multiple]/mdia/minf/stbl/stss`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/sync_sample_atom>
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stss {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    #[br(temp)]
    #[bw(calc = sync_sample_table.len() as u32)]
    number_of_entries: u32,
    #[br(count = number_of_entries)]
    pub(crate) sync_sample_table: Vec<u32>,
}

binrw_atom!(Stss, FourCC::Stss);

impl Stss {
    pub fn sync_sample_table(&self) -> &[u32] {
        &self.sync_sample_table
    }

    pub fn len(&self) -> usize {
        self.sync_sample_table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sync_sample_table.is_empty()
    }

    /// Marks `sample` (0-based) as a key frame.
    pub fn push(&mut self, sample: u64) {
        self.sync_sample_table.push(sample as u32 + 1)
    }

    /// Whether `sample` (0-based) is a key frame.
    pub fn is_keyframe(&self, sample: u64) -> bool {
        self.sync_sample_table.binary_search(&(sample as u32 + 1)).is_ok()
    }

    /// Closest key frame at or before `sample` (0-based).
    pub fn keyframe_before(&self, sample: u64) -> Option<u64> {
        let number = sample as u32 + 1;
        let idx = self.sync_sample_table.partition_point(|s| *s <= number);
        idx.checked_sub(1)
            .map(|i| self.sync_sample_table[i] as u64 - 1)
    }
}

//! Edit list atom (`elst`).
//!
//! Location: `moov/trak[multiple]/edts/elst`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/edit_list_atom>

use binrw::binrw;

use crate::FourCC;

/// Edit list atom (`elst`).
///
/// Location: `moov/trak[multiple]/edts/elst`
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/edit_list_atom>
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Elst {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    #[br(temp)]
    #[bw(calc = edit_list_table.len() as u32)]
    number_of_entries: u32,
    #[br(count = number_of_entries)]
    pub(crate) edit_list_table: Vec<EditEntry>,
}

binrw_atom!(Elst, FourCC::Elst);

impl Elst {
    /// A single edit playing the whole media from the start.
    pub fn single(track_duration: u32) -> Self {
        Self {
            edit_list_table: vec![EditEntry{track_duration, media_time: 0, media_rate: 0x00010000}],
            ..Default::default()
        }
    }

    pub fn edit_list_table(&self) -> &[EditEntry] {
        &self.edit_list_table
    }
}

#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditEntry {
    /// Unscaled duration of this edit.
    pub track_duration: u32,
    /// Containing the unscaled starting time within the media of this edit segment.
    /// If set to -1 the edit is empty.
    pub media_time: i32,
    /// Fixed-point number that specifies the relative rate at which to play the media.
    /// Can not be 0 or negative.
    pub media_rate: u32,
}

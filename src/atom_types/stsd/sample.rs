//! Sample description entry. Part of `stsd` atom.
//!
//! Entries are framed like atoms (size, format) followed by
//! 6 reserved bytes and a data reference index, then
//! media specific fields.

use crate::{atom::Atom, ByteStream, ContainerError, FourCC};

use super::{AudioDescription, MediaKind, VideoDescription};

/// Sound formats, used to tell audio entries apart when
/// no handler is known.
const SOUND_FORMATS: &[&[u8; 4]] = &[
    b"NONE", b"twos", b"sowt", b"lpcm", b"in24", b"in32", b"fl32", b"fl64",
    b"ulaw", b"alaw", b"ima4", b"mp4a", b".mp3", b"samr",
];

/// Fixed video fields following the general part.
const VIDEO_FIELDS_LEN: u64 = 70;

#[derive(Debug, Clone, PartialEq)]
pub enum SampleEntry {
    Video(VideoDescription),
    Audio(AudioDescription),
    /// Media specific fields of other media, verbatim.
    Generic(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SampleDescription {
    /// Data format, e.g. codec Four CC.
    pub format: FourCC,
    pub data_reference_index: u16,
    pub entry: SampleEntry,
}

impl SampleDescription {
    pub fn new_video(format: FourCC, video: VideoDescription) -> Self {
        Self{format, data_reference_index: 1, entry: SampleEntry::Video(video)}
    }

    pub fn new_audio(format: FourCC, audio: AudioDescription) -> Self {
        Self{format, data_reference_index: 1, entry: SampleEntry::Audio(audio)}
    }

    pub(crate) fn read(
        stream: &mut ByteStream,
        parent: &Atom,
        kind: Option<MediaKind>,
    ) -> Result<Self, ContainerError> {
        let mut entry = Atom::read_header(stream)?;
        if entry.end > parent.end {
            stream.log.warn(format_args!(
                "sample description '{}' @ {} exceeds 'stsd', clamping", entry.tag, entry.start
            ));
            entry.end = parent.end;
            entry.size = entry.end - entry.start;
        }

        let _reserved: [u8; 6] = stream.read_be()?;
        let data_reference_index = stream.read_u16()?;

        let kind = kind.unwrap_or_else(|| Self::guess_kind(entry.tag, &entry));
        let body = match kind {
            MediaKind::Video if entry.data_size() >= 8 + VIDEO_FIELDS_LEN => {
                SampleEntry::Video(VideoDescription::read(stream, &entry)?)
            },
            MediaKind::Sound => SampleEntry::Audio(AudioDescription::read(stream, &entry)?),
            _ => {
                let rest = entry.end.saturating_sub(stream.position());
                SampleEntry::Generic(stream.read_fixed_bytes(rest)?)
            }
        };

        entry.skip(stream)?;

        Ok(Self{format: entry.tag, data_reference_index, entry: body})
    }

    fn guess_kind(format: FourCC, entry: &Atom) -> MediaKind {
        if SOUND_FORMATS.iter().any(|f| format.is(f)) {
            MediaKind::Sound
        } else if entry.data_size() >= 8 + VIDEO_FIELDS_LEN {
            MediaKind::Video
        } else {
            MediaKind::Other
        }
    }

    pub(crate) fn write(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        // Entries always carry 32-bit sizes.
        Atom::write_header(stream, self.format)?.finish(stream, |s| {
            s.write_fixed_bytes(&[0; 6])?;
            s.write_u16(self.data_reference_index)?;
            match &self.entry {
                SampleEntry::Video(v) => v.write(s),
                SampleEntry::Audio(a) => a.write(s),
                SampleEntry::Generic(data) => s.write_fixed_bytes(data),
            }
        })?;
        Ok(())
    }

    pub fn video(&self) -> Option<&VideoDescription> {
        match &self.entry {
            SampleEntry::Video(v) => Some(v),
            _ => None,
        }
    }

    pub fn audio(&self) -> Option<&AudioDescription> {
        match &self.entry {
            SampleEntry::Audio(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self.entry, SampleEntry::Video(_))
    }

    pub fn is_audio(&self) -> bool {
        matches!(self.entry, SampleEntry::Audio(_))
    }
}

//! Sample description atom (`stsd`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stsd`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/sample_description_atom>

use crate::{atom::Atom, ByteStream, ContainerError, FourCC};

use super::{super::AtomBody, SampleDescription};

/// Media type, as declared by the handler. Decides how
/// sample description entries are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum MediaKind {
    Video,
    Sound,
    #[default]
    Other,
}

impl MediaKind {
    /// From handler component subtype.
    pub fn from_handler(subtype: FourCC) -> Self {
        match &subtype.to_bytes() {
            b"vide" => Self::Video,
            b"soun" => Self::Sound,
            _ => Self::Other,
        }
    }

    pub fn handler(&self) -> FourCC {
        match self {
            Self::Video => FourCC::Custom(*b"vide"),
            Self::Sound => FourCC::Custom(*b"soun"),
            Self::Other => FourCC::Custom(*b"data"),
        }
    }
}

/// Sample description atom (`stsd`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stsd {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    pub(crate) entries: Vec<SampleDescription>,
}

impl Stsd {
    pub fn new(entry: SampleDescription) -> Self {
        Self{entries: vec![entry], ..Default::default()}
    }

    /// Reads the data load, interpreting entries for `kind`.
    pub fn read_media(
        stream: &mut ByteStream,
        atom: &Atom,
        kind: Option<MediaKind>
    ) -> Result<Self, ContainerError> {
        let version = stream.read_u8()?;
        let flags: [u8; 3] = stream.read_be()?;
        let count = stream.read_u32()?;

        let mut entries = Vec::new();
        for _ in 0 .. count {
            if stream.position() >= atom.end {
                stream.log.warn(format_args!(
                    "'stsd' @ {} declares {count} entries, found {}", atom.start, entries.len()
                ));
                break
            }
            entries.push(SampleDescription::read(stream, atom, kind)?);
        }

        Ok(Self{version, flags, entries})
    }

    pub fn entries(&self) -> &[SampleDescription] {
        &self.entries
    }

    pub fn first(&self) -> Option<&SampleDescription> {
        self.entries.first()
    }

    /// Format of the first entry, e.g. `raw `, `yuvs`, `sowt`.
    pub fn format(&self) -> Option<FourCC> {
        self.first().map(|e| e.format)
    }

    /// Resolution in pixels as tuple `(WIDTH, HEIGHT)`,
    /// if the first entry describes video.
    pub fn resolution(&self) -> Option<(u16, u16)> {
        let video = self.first()?.video()?;
        Some((video.width, video.height))
    }

    /// Audio sample rate in Hz, if the first entry describes audio.
    pub fn sample_rate(&self) -> Option<f64> {
        Some(self.first()?.audio()?.sample_rate)
    }
}

impl AtomBody for Stsd {
    const TAG: FourCC = FourCC::Stsd;

    /// Without a handler, entry types are guessed from their format.
    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        Self::read_media(stream, atom, None)
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        stream.write_u8(self.version)?;
        stream.write_be(&self.flags)?;
        stream.write_u32(u32::try_from(self.entries.len())?)?;
        for entry in self.entries.iter() {
            entry.write(stream)?;
        }
        Ok(())
    }
}

//! Handler reference atom (`hdlr`).
//!
//! Location: `moov/trak[multiple]/mdia/hdlr`, `moov/trak[multiple]/mdia/minf/hdlr`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/handler_reference_atom>

use crate::{atom::Atom, support::{latin1, to_latin1}, ByteStream, ContainerError, FourCC};

use super::AtomBody;

/// How the component name is stored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum NameStyle {
    /// Counted string (QuickTime).
    #[default]
    Pascal,
    /// Null terminated string (MP4).
    CString,
}

/// Handler reference atom (`hdlr`)
///
/// See: <https://developer.apple.com/documentation/quicktime-file-format/handler_reference_atom>
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hdlr {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    /// Possible values:
    /// - `mhlr`: media handler
    /// - `dhlr`: data handler
    /// - `[0, 0, 0, 0]` (MP4)
    pub(crate) component_type: FourCC,
    /// Type of media or data handler, e.g. `vide`, `soun`, `alis`.
    pub(crate) component_subtype: FourCC,
    pub(crate) component_manufacturer: FourCC,
    pub(crate) component_flags: u32,
    pub(crate) component_flags_mask: u32,
    pub(crate) component_name: String,
    pub(crate) name_style: NameStyle,
}

impl AtomBody for Hdlr {
    const TAG: FourCC = FourCC::Hdlr;

    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        let version = stream.read_u8()?;
        let flags: [u8; 3] = stream.read_be()?;
        let component_type = stream.read_fourcc()?;
        let component_subtype = stream.read_fourcc()?;
        let component_manufacturer = stream.read_fourcc()?;
        let component_flags = stream.read_u32()?;
        let component_flags_mask = stream.read_u32()?;

        // May be a counted string, null terminated, or neither.
        let rest = atom.end.saturating_sub(stream.position());
        let bytes = stream.read_fixed_bytes(rest.min(stream.remaining()))?;
        let (component_name, name_style) = match bytes.first() {
            None => (String::new(), NameStyle::Pascal),
            Some(n) if *n as usize + 1 == bytes.len() => (latin1(&bytes[1..]), NameStyle::Pascal),
            Some(_) => {
                let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
                (latin1(&bytes[.. end]), NameStyle::CString)
            }
        };

        Ok(Self {
            version,
            flags,
            component_type,
            component_subtype,
            component_manufacturer,
            component_flags,
            component_flags_mask,
            component_name,
            name_style,
        })
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        stream.write_u8(self.version)?;
        stream.write_be(&self.flags)?;
        stream.write_fourcc(&self.component_type)?;
        stream.write_fourcc(&self.component_subtype)?;
        stream.write_fourcc(&self.component_manufacturer)?;
        stream.write_u32(self.component_flags)?;
        stream.write_u32(self.component_flags_mask)?;
        match self.name_style {
            NameStyle::Pascal => stream.write_pascal(&self.component_name),
            NameStyle::CString => {
                stream.write_fixed_bytes(&to_latin1(&self.component_name))?;
                stream.write_u8(0)
            }
        }
    }
}

impl Hdlr {
    pub fn new(
        component_type: FourCC,
        component_subtype: FourCC,
        name: &str,
        name_style: NameStyle,
    ) -> Self {
        Self {
            component_type,
            component_subtype,
            component_name: name.to_owned(),
            name_style,
            ..Default::default()
        }
    }

    /// Should be either `mhlr` (media handler),
    /// or `dhlr` (data handler).
    pub fn component_type(&self) -> FourCC {
        self.component_type
    }

    /// E.g. `vide` for video, `soun` for sound.
    pub fn component_subtype(&self) -> FourCC {
        self.component_subtype
    }

    pub fn component_name(&self) -> &str {
        self.component_name.as_str()
    }

    pub fn is_video(&self) -> bool {
        self.component_subtype == FourCC::Custom(*b"vide")
    }

    pub fn is_sound(&self) -> bool {
        self.component_subtype == FourCC::Custom(*b"soun")
    }
}

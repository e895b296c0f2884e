//! User data atom (`udta`).
//!
//! QuickTime text items (`©nam`, `©cpy`, `©inf`) are parsed,
//! everything else is kept verbatim.
//!
//! Location: `moov/udta`, `moov/trak[multiple]/udta`
//!
//! See: <https://developer.apple.com/documentation/quicktime-file-format/user_data_atoms>

use crate::{
    atom::{walk, write_atom, Atom, MaybeKnown, ParseFn, RawAtom},
    support::{latin1, to_latin1},
    ByteStream,
    ContainerError,
    FourCC,
};

use super::AtomBody;

pub const NAME: FourCC = FourCC::Custom([0xa9, b'n', b'a', b'm']);
pub const COPYRIGHT: FourCC = FourCC::Custom([0xa9, b'c', b'p', b'y']);
pub const INFO: FourCC = FourCC::Custom([0xa9, b'i', b'n', b'f']);

/// International text item: one string with a language code.
#[derive(Debug, Clone, PartialEq)]
pub struct UserText {
    pub tag: FourCC,
    /// Macintosh language code
    pub language: u16,
    pub text: String,
}

impl UserText {
    /// Parses a raw item holding exactly one text entry.
    fn from_raw(raw: &RawAtom) -> Option<Self> {
        let len = u16::from_be_bytes([*raw.data.first()?, *raw.data.get(1)?]) as usize;
        let language = u16::from_be_bytes([*raw.data.get(2)?, *raw.data.get(3)?]);
        if raw.data.len() != 4 + len {
            return None
        }
        Some(Self{tag: raw.tag, language, text: latin1(&raw.data[4..])})
    }
}

pub type UserItem = MaybeKnown<UserText>;

/// User data atom.
/// Field content differs between recording devices or encoders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Udta {
    pub items: Vec<UserItem>,
}

impl Udta {
    const HANDLERS: &'static [(FourCC, ParseFn<Udta>)] = &[
        (NAME, Udta::read_text),
        (COPYRIGHT, Udta::read_text),
        (INFO, Udta::read_text),
    ];

    fn read_text(stream: &mut ByteStream, udta: &mut Udta, atom: &Atom) -> Result<(), ContainerError> {
        let raw = RawAtom::read(stream, atom)?;
        let item = match UserText::from_raw(&raw) {
            Some(text) => MaybeKnown::Known(text),
            None => MaybeKnown::Raw(raw),
        };
        udta.items.push(item);
        Ok(())
    }

    fn capture(udta: &mut Udta, raw: RawAtom) {
        udta.items.push(MaybeKnown::Raw(raw))
    }

    pub fn iter(&self) -> impl Iterator<Item = &UserItem> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Text of the first text item with `tag`.
    pub fn text(&self, tag: FourCC) -> Option<&str> {
        self.items.iter()
            .filter_map(|i| i.known())
            .find(|t| t.tag == tag)
            .map(|t| t.text.as_str())
    }

    /// Replaces or adds the text item `tag`.
    pub fn set_text(&mut self, tag: FourCC, text: &str) {
        let item = UserText{tag, language: 0, text: text.to_owned()};
        match self.items.iter_mut().find(|i| matches!(i, MaybeKnown::Known(t) if t.tag == tag)) {
            Some(existing) => *existing = MaybeKnown::Known(item),
            None => self.items.push(MaybeKnown::Known(item)),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.text(NAME)
    }

    pub fn copyright(&self) -> Option<&str> {
        self.text(COPYRIGHT)
    }

    pub fn info(&self) -> Option<&str> {
        self.text(INFO)
    }

    /// First raw item with `tag`.
    pub fn find(&self, tag: &[u8; 4]) -> Option<&RawAtom> {
        self.items.iter()
            .filter_map(|i| i.raw())
            .find(|r| r.tag.is(tag))
    }
}

impl AtomBody for Udta {
    const TAG: FourCC = FourCC::Udta;

    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        let mut udta = Udta::default();
        walk(stream, atom, &mut udta, Self::HANDLERS, Some(Self::capture))?;
        Ok(udta)
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        for item in self.items.iter() {
            match item {
                MaybeKnown::Known(t) => {
                    let text = to_latin1(&t.text);
                    write_atom(stream, t.tag, |s| {
                        s.write_u16(u16::try_from(text.len())?)?;
                        s.write_u16(t.language)?;
                        s.write_fixed_bytes(&text)
                    })?;
                },
                MaybeKnown::Raw(raw) => raw.write(stream)?,
            }
        }
        Ok(())
    }
}

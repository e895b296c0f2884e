//! Sample description extension atoms, following the
//! fixed fields of a video or audio sample description.

use binrw::binrw;

use crate::{
    atom::{walk, Atom, ParseFn, RawAtom},
    atom_types::AtomBody,
    ByteStream,
    ContainerError,
    FourCC,
};

use super::Esds;

#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    Esds(Esds),
    Pasp(Pasp),
    Fiel(Fiel),
    Raw(RawAtom),
}

/// Pixel aspect ratio (`pasp`).
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pasp {
    pub h_spacing: u32,
    pub v_spacing: u32,
}

binrw_atom!(Pasp, FourCC::Pasp);

impl Default for Pasp {
    fn default() -> Self {
        Self{h_spacing: 1, v_spacing: 1}
    }
}

/// Field handling (`fiel`).
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fiel {
    /// 1: progressive, 2: interlaced
    pub fields: u8,
    /// Field ordering, 0 if progressive.
    pub detail: u8,
}

binrw_atom!(Fiel, FourCC::Fiel);

impl Default for Fiel {
    fn default() -> Self {
        Self{fields: 1, detail: 0}
    }
}

const HANDLERS: &[(FourCC, ParseFn<Vec<Extension>>)] = &[
    (FourCC::Esds, read_esds),
    (FourCC::Pasp, read_pasp),
    (FourCC::Fiel, read_fiel),
];

fn read_esds(stream: &mut ByteStream, ext: &mut Vec<Extension>, atom: &Atom) -> Result<(), ContainerError> {
    ext.push(Extension::Esds(Esds::read_body(stream, atom)?));
    Ok(())
}

fn read_pasp(stream: &mut ByteStream, ext: &mut Vec<Extension>, atom: &Atom) -> Result<(), ContainerError> {
    ext.push(Extension::Pasp(Pasp::read_body(stream, atom)?));
    Ok(())
}

fn read_fiel(stream: &mut ByteStream, ext: &mut Vec<Extension>, atom: &Atom) -> Result<(), ContainerError> {
    ext.push(Extension::Fiel(Fiel::read_body(stream, atom)?));
    Ok(())
}

fn capture(ext: &mut Vec<Extension>, raw: RawAtom) {
    ext.push(Extension::Raw(raw))
}

/// Reads extension atoms until the end of the sample description `entry`.
pub(crate) fn read_extensions(stream: &mut ByteStream, entry: &Atom) -> Result<Vec<Extension>, ContainerError> {
    let mut extensions = Vec::new();
    walk(stream, entry, &mut extensions, HANDLERS, Some(capture))?;
    Ok(extensions)
}

pub(crate) fn write_extensions(stream: &mut ByteStream, extensions: &[Extension]) -> Result<(), ContainerError> {
    for ext in extensions.iter() {
        match ext {
            Extension::Esds(e) => e.write(stream)?,
            Extension::Pasp(p) => p.write(stream)?,
            Extension::Fiel(f) => f.write(stream)?,
            Extension::Raw(r) => r.write(stream)?,
        }
    }
    Ok(())
}

//! Compressed movie atom (`cmov`).
//!
//! Holds a complete `moov` atom, compressed:
//! - `dcom`: compression algorithm, only `zlib` is supported
//! - `cmvd`: uncompressed size (u32), then the compressed bytes
//!
//! Location: `moov/cmov`

use crate::{
    atom::{walk, write_atom, Atom, ParseFn},
    ByteStream,
    ContainerError,
    FourCC,
};

use super::AtomBody;

const ZLIB: FourCC = FourCC::Custom(*b"zlib");

/// Compressed movie atom (`cmov`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cmov {
    pub(crate) algorithm: FourCC,
    pub(crate) uncompressed_size: u32,
    pub(crate) data: Vec<u8>,
}

impl Cmov {
    const HANDLERS: &'static [(FourCC, ParseFn<Cmov>)] = &[
        (FourCC::Dcom, Cmov::read_dcom),
        (FourCC::Cmvd, Cmov::read_cmvd),
    ];

    fn read_dcom(stream: &mut ByteStream, cmov: &mut Cmov, _atom: &Atom) -> Result<(), ContainerError> {
        cmov.algorithm = stream.read_fourcc()?;
        Ok(())
    }

    fn read_cmvd(stream: &mut ByteStream, cmov: &mut Cmov, atom: &Atom) -> Result<(), ContainerError> {
        cmov.uncompressed_size = stream.read_u32()?;
        let len = atom.end.saturating_sub(stream.position());
        cmov.data = stream.read_fixed_bytes(len)?;
        Ok(())
    }

    pub fn algorithm(&self) -> FourCC {
        self.algorithm
    }
}

impl AtomBody for Cmov {
    const TAG: FourCC = FourCC::Cmov;

    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        let mut cmov = Cmov::default();
        walk(stream, atom, &mut cmov, Self::HANDLERS, None)?;
        Ok(cmov)
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        write_atom(stream, FourCC::Dcom, |s| s.write_fourcc(&self.algorithm))?;
        write_atom(stream, FourCC::Cmvd, |s| {
            s.write_u32(self.uncompressed_size)?;
            s.write_fixed_bytes(&self.data)
        })?;
        Ok(())
    }
}

/// Inflates a compressed movie atom. The result is a complete
/// `moov` atom, header included.
pub fn decompress_moov(cmov: &Cmov) -> Result<Vec<u8>, ContainerError> {
    if cmov.algorithm != ZLIB {
        return Err(ContainerError::UnsupportedCompression(cmov.algorithm))
    }
    let moov = miniz_oxide::inflate::decompress_to_vec_zlib(&cmov.data)
        .map_err(|e| ContainerError::Decompression(format!("{:?}", e.status)))?;
    Ok(moov)
}

/// Deflates a serialized `moov` atom (header included).
pub fn compress_moov(moov: &[u8]) -> Result<Cmov, ContainerError> {
    Ok(Cmov {
        algorithm: ZLIB,
        uncompressed_size: u32::try_from(moov.len())?,
        data: miniz_oxide::deflate::compress_to_vec_zlib(moov, 6),
    })
}

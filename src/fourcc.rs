//! Atom and chunk Four CC.
//! See <https://developer.apple.com/documentation/quicktime-file-format/atoms>.
//!
//! RIFF/AVI chunk identifiers share the same 4-byte representation
//! and are listed here as well.

use std::fmt;

macro_rules! fourcc_table {
    ($($(#[$doc:meta])* $name:ident => $bytes:literal,)*) => {
        /// Atom or chunk Four CC.
        ///
        /// Tags without a named variant are kept verbatim
        /// as `FourCC::Custom`.
        #[derive(Debug, Clone, Copy)]
        pub enum FourCC {
            $($(#[$doc])* $name,)*
            Custom([u8; 4]),
        }

        impl FourCC {
            pub fn from_bytes(fourcc: [u8; 4]) -> Self {
                match &fourcc {
                    $($bytes => Self::$name,)*
                    _ => Self::Custom(fourcc),
                }
            }

            /// Raw 4-byte representation, as written to file.
            pub fn to_bytes(&self) -> [u8; 4] {
                match self {
                    $(Self::$name => *$bytes,)*
                    Self::Custom(b) => *b,
                }
            }
        }
    };
}

fourcc_table! {
    /// Movie atom
    Moov => b"moov",
    /// Movie header atom
    Mvhd => b"mvhd",
    /// Track atom
    Trak => b"trak",
    Tkhd => b"tkhd",
    Tref => b"tref",
    Edts => b"edts",
    Elst => b"elst",
    Mdia => b"mdia",
    Mdhd => b"mdhd",
    Hdlr => b"hdlr",
    Minf => b"minf",
    Vmhd => b"vmhd",
    Smhd => b"smhd",
    Gmhd => b"gmhd",
    Dinf => b"dinf",
    Dref => b"dref",
    Alis => b"alis",
    Url => b"url ",
    Stbl => b"stbl",
    Stsd => b"stsd",
    Stts => b"stts",
    Stss => b"stss",
    Stsc => b"stsc",
    Stsz => b"stsz",
    /// Chunk offset, 32-bit values
    Stco => b"stco",
    /// Chunk offset, 64-bit values
    Co64 => b"co64",
    Ctts => b"ctts",
    /// User data
    Udta => b"udta",
    Iods => b"iods",
    /// Color table
    Ctab => b"ctab",
    /// Compressed movie
    Cmov => b"cmov",
    /// Compression method
    Dcom => b"dcom",
    /// Compressed movie data
    Cmvd => b"cmvd",
    Mdat => b"mdat",
    Ftyp => b"ftyp",
    Free => b"free",
    Skip => b"skip",
    /// Placeholder, reserves space for a 64-bit size
    Wide => b"wide",
    Pnot => b"pnot",
    Uuid => b"uuid",
    /// Elementary stream descriptor
    Esds => b"esds",
    /// Pixel aspect ratio
    Pasp => b"pasp",
    /// Field handling
    Fiel => b"fiel",
    /// QTVR atom container root
    Sean => b"sean",

    // RIFF/AVI
    Riff => b"RIFF",
    List => b"LIST",
    Avi => b"AVI ",
    Avix => b"AVIX",
    Hdrl => b"hdrl",
    Avih => b"avih",
    Strl => b"strl",
    Strh => b"strh",
    Strf => b"strf",
    Strn => b"strn",
    /// OpenDML super index
    Indx => b"indx",
    Odml => b"odml",
    Dmlh => b"dmlh",
    Movi => b"movi",
    /// Classic AVI index
    Idx1 => b"idx1",
    Junk => b"JUNK",
    Vids => b"vids",
    Auds => b"auds",
}

impl FourCC {
    /// From a 4-byte slice. Slices of any other length
    /// are padded with spaces or truncated.
    pub fn from_slice(fourcc: &[u8]) -> Self {
        let mut bytes = [b' '; 4];
        bytes.iter_mut()
            .zip(fourcc.iter())
            .for_each(|(b, f)| *b = *f);
        Self::from_bytes(bytes)
    }

    pub fn from_u32(value: u32) -> Self {
        Self::from_bytes(value.to_be_bytes())
    }

    pub fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.to_bytes())
    }

    /// Single-byte chars, mapping 0-255 to `char`
    /// (e.g. `©nam` for the user data text items).
    pub fn to_str(&self) -> String {
        self.to_bytes().iter().map(|b| *b as char).collect()
    }

    /// Inverse of `to_str()`. Characters above 255 are
    /// replaced with `?`.
    pub fn from_str(fourcc: &str) -> Self {
        let bytes: Vec<u8> = fourcc.chars()
            .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
            .collect();
        Self::from_slice(&bytes)
    }

    /// 4-byte literal comparison.
    pub fn is(&self, tag: &[u8; 4]) -> bool {
        &self.to_bytes() == tag
    }
}

impl PartialEq for FourCC {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FourCC {}

impl std::hash::Hash for FourCC {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.to_bytes().hash(state)
    }
}

impl Default for FourCC {
    fn default() -> Self {
        Self::Custom([0; 4])
    }
}

impl fmt::Display for FourCC {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl From<[u8; 4]> for FourCC {
    fn from(value: [u8; 4]) -> Self {
        Self::from_bytes(value)
    }
}

impl From<&[u8; 4]> for FourCC {
    fn from(value: &[u8; 4]) -> Self {
        Self::from_bytes(*value)
    }
}

impl binrw::BinRead for FourCC {
    type Args<'a> = ();

    fn read_options<R: std::io::Read + std::io::Seek>(
        reader: &mut R,
        endian: binrw::Endian,
        args: Self::Args<'_>,
    ) -> binrw::BinResult<Self> {
        <[u8; 4]>::read_options(reader, endian, args).map(Self::from_bytes)
    }
}

impl binrw::BinWrite for FourCC {
    type Args<'a> = ();

    fn write_options<W: std::io::Write + std::io::Seek>(
        &self,
        writer: &mut W,
        endian: binrw::Endian,
        args: Self::Args<'_>,
    ) -> binrw::BinResult<()> {
        self.to_bytes().write_options(writer, endian, args)
    }
}

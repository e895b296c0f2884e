//! Container read/write errors.

use std::fmt;

use crate::FourCC;

/// Container related read/write/parse errors.
#[derive(Debug)]
pub enum ContainerError {
    /// Converted `BinResult` error.
    BinError(binrw::Error),
    /// Converted `Utf8Error`.
    Utf8Error(std::string::FromUtf8Error),
    /// IO error
    IOError(std::io::Error),
    /// Converted `TryFromIntError`.
    IntConversion(std::num::TryFromIntError),
    /// Fewer than the 8 (or 16) bytes an atom header
    /// requires remain in the stream.
    TruncatedHeader{offset: u64, available: u64},
    /// Fewer bytes remain than a declared body requires.
    UnexpectedEof{offset: u64, wanted: u64},
    /// Compressed movie atom using anything but `zlib`.
    UnsupportedCompression(FourCC),
    /// Failed to inflate compressed movie atom.
    Decompression(String),
    /// Write failed at `offset`, e.g. disk full.
    /// The stream is left at a position the caller may
    /// rewind from and retry.
    IoWriteFailure{offset: u64, source: std::io::Error},
    /// Child atom extends beyond its parent,
    /// or the atom graph is otherwise broken beyond repair.
    MalformedAtomGraph{tag: FourCC, offset: u64, reason: String},
    /// No `moov`/`mvhd` found.
    NoMovieHeader,
    /// Not a QuickTime, MP4, or AVI file.
    NotRecognized,
    /// No such atom.
    NoSuchAtom(FourCC),
    /// No track with this index.
    NoSuchTrack(usize),
    /// No sample with this index in track.
    NoSuchSample{track: usize, sample: u64},
    /// No codec for this FourCC.
    UnsupportedCodec(FourCC),
    /// Codec parameter rejected.
    InvalidParameter{key: String, value: String},
    /// Operation not valid in the current writer state.
    WriterState(String),
}

impl std::error::Error for ContainerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContainerError::IOError(err) => Some(err),
            ContainerError::IoWriteFailure{source, ..} => Some(source),
            ContainerError::BinError(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::BinError(err) => write!(f, "{err}"),
            ContainerError::Utf8Error(err) => write!(f, "{err}"),
            ContainerError::IOError(err) => write!(f, "IO error: {}", err),
            ContainerError::IntConversion(err) => write!(f, "{err}"),
            ContainerError::TruncatedHeader{offset, available} => write!(f, "Truncated atom header @ offset {offset}: only {available} bytes available."),
            ContainerError::UnexpectedEof{offset, wanted} => write!(f, "Unexpected end of stream @ offset {offset}, wanted {wanted} more bytes."),
            ContainerError::UnsupportedCompression(alg) => write!(f, "Unsupported movie compression '{alg}', only 'zlib' is supported."),
            ContainerError::Decompression(msg) => write!(f, "Failed to decompress movie atom: {msg}"),
            ContainerError::IoWriteFailure{offset, source} => write!(f, "Write failed @ offset {offset}: {source}"),
            ContainerError::MalformedAtomGraph{tag, offset, reason} => write!(f, "Malformed atom '{tag}' @ offset {offset}: {reason}"),
            ContainerError::NoMovieHeader => write!(f, "No movie header found."),
            ContainerError::NotRecognized => write!(f, "Not a recognized container."),
            ContainerError::NoSuchAtom(name) => write!(f, "No such atom '{name}'."),
            ContainerError::NoSuchTrack(idx) => write!(f, "No track with index {idx}."),
            ContainerError::NoSuchSample{track, sample} => write!(f, "No sample {sample} in track {track}."),
            ContainerError::UnsupportedCodec(fourcc) => write!(f, "No codec for '{fourcc}'."),
            ContainerError::InvalidParameter{key, value} => write!(f, "Invalid value '{value}' for codec parameter '{key}'."),
            ContainerError::WriterState(msg) => write!(f, "Writer: {msg}"),
        }
    }
}

/// Converts std::io::Error to ContainerError
impl From<std::io::Error> for ContainerError {
    fn from(err: std::io::Error) -> Self {
        ContainerError::IOError(err)
    }
}

/// Converts std::string::FromUtf8Error to ContainerError
impl From<std::string::FromUtf8Error> for ContainerError {
    fn from(err: std::string::FromUtf8Error) -> ContainerError {
        ContainerError::Utf8Error(err)
    }
}

/// Converts std::num::TryFromIntError to ContainerError
impl From<std::num::TryFromIntError> for ContainerError {
    fn from(err: std::num::TryFromIntError) -> ContainerError {
        ContainerError::IntConversion(err)
    }
}

/// Converts ContainerError to std::io::Error
impl From<ContainerError> for std::io::Error {
    fn from(err: ContainerError) -> Self {
        match err {
            ContainerError::IOError(err) => err,
            other => std::io::Error::new(std::io::ErrorKind::Other, other),
        }
    }
}

/// Converts binrw::Error to ContainerError.
/// IO errors are unwrapped so that end-of-stream conditions
/// stay recognizable.
impl From<binrw::Error> for ContainerError {
    fn from(err: binrw::Error) -> ContainerError {
        match err {
            binrw::Error::Io(err) => ContainerError::IOError(err),
            other => ContainerError::BinError(other),
        }
    }
}

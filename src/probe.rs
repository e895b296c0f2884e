//! Container detection.

use std::path::Path;

use crate::{
    avi::AviReader,
    consts::TOP_LEVEL,
    quicktime::{QuickTime, ReadOptions},
    ByteStream,
    ContainerError,
    FourCC,
};

/// Container family, as detected from the first bytes of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// `RIFF` + `AVI `.
    Avi,
    /// QuickTime, MP4 and relatives.
    QuickTime,
}

/// Detects the container from (at least) the first 12 bytes of a file.
pub fn probe_bytes(head: &[u8]) -> Option<ContainerKind> {
    if head.len() >= 12 && &head[0 .. 4] == b"RIFF" && &head[8 .. 12] == b"AVI " {
        return Some(ContainerKind::Avi)
    }
    let tag = FourCC::from_slice(head.get(4 .. 8)?);
    TOP_LEVEL.contains(&tag).then_some(ContainerKind::QuickTime)
}

/// Detects the container of the file at `path`.
///
/// Fails with `NotRecognized` for anything but AVI and QuickTime.
pub fn probe(path: &Path) -> Result<ContainerKind, ContainerError> {
    let mut stream = ByteStream::open(path)?;
    let head = stream.read_fixed_bytes(stream.len().min(12))?;
    probe_bytes(&head).ok_or(ContainerError::NotRecognized)
}

/// An open file of either family.
#[derive(Debug)]
pub enum Container {
    Avi(AviReader),
    QuickTime(QuickTime),
}

impl Container {
    pub fn open(path: &Path, options: ReadOptions) -> Result<Self, ContainerError> {
        match probe(path)? {
            ContainerKind::Avi => AviReader::open(path, options).map(Self::Avi),
            ContainerKind::QuickTime => QuickTime::open(path, options).map(Self::QuickTime),
        }
    }

    pub fn from_bytes(data: Vec<u8>, options: ReadOptions) -> Result<Self, ContainerError> {
        match probe_bytes(&data).ok_or(ContainerError::NotRecognized)? {
            ContainerKind::Avi => AviReader::from_bytes(data, options).map(Self::Avi),
            ContainerKind::QuickTime => QuickTime::from_bytes(data, options).map(Self::QuickTime),
        }
    }

    pub fn kind(&self) -> ContainerKind {
        match self {
            Self::Avi(_) => ContainerKind::Avi,
            Self::QuickTime(_) => ContainerKind::QuickTime,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect() {
        assert_eq!(probe_bytes(b"RIFF\0\0\0\0AVI LIST"), Some(ContainerKind::Avi));
        assert_eq!(probe_bytes(b"\0\0\0\x14ftypqt  "), Some(ContainerKind::QuickTime));
        assert_eq!(probe_bytes(b"\0\0\0\x08wide"), Some(ContainerKind::QuickTime));
        assert_eq!(probe_bytes(b"RIFF\0\0\0\0WAVEfmt "), None);
        assert_eq!(probe_bytes(b"\x89PNG\r\n\x1a\n"), None);
        assert_eq!(probe_bytes(b"abc"), None);
    }

    #[test]
    fn not_recognized() {
        assert!(matches!(
            Container::from_bytes(b"GIF89a..........".to_vec(), ReadOptions::default()),
            Err(ContainerError::NotRecognized)
        ));
    }
}

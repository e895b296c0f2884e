//! QuickTime/MP4 reading session.
//!
//! ```ignore
//! use movkit::{QuickTime, ReadOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), movkit::ContainerError> {
//!     let qt = QuickTime::open(Path::new("VIDEO.MOV"), ReadOptions::default())?;
//!
//!     for track in qt.tracks() {
//!         println!("{track:?}")
//!     }
//!
//!     println!("{:?}", qt.duration());
//!
//!     Ok(())
//! }
//! ```

use std::path::Path;

use time::Duration;

use crate::{
    atom::Atom,
    atom_types::{AtomBody, Ftyp, Moov, Udta},
    codecs::codec_for,
    colormodels::DestFrame,
    consts::{HEADER_LENGTH, TOP_LEVEL},
    track::{SampleOffsets, Track},
    ByteStream,
    ContainerError,
    FourCC,
    LogSink,
};

/// Options for opening a file.
#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub log: LogSink,
    /// Keep unknown atoms so that they are written back unmodified.
    /// If `false` they are skipped.
    pub capture_unknown: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self{log: LogSink::default(), capture_unknown: true}
    }
}

/// An open QuickTime or MP4 file with its parsed movie atom.
#[derive(Debug)]
pub struct QuickTime {
    stream: ByteStream,
    ftyp: Option<Ftyp>,
    moov: Moov,
    /// Every top-level atom, in file order.
    atoms: Vec<Atom>,
    tracks: Vec<Track>,
}

impl QuickTime {
    pub fn open(path: &Path, options: ReadOptions) -> Result<Self, ContainerError> {
        let stream = ByteStream::open(path)?;
        Self::read(stream, options)
    }

    pub fn from_bytes(bytes: Vec<u8>, options: ReadOptions) -> Result<Self, ContainerError> {
        Self::read(ByteStream::memory(bytes), options)
    }

    fn read(stream: ByteStream, options: ReadOptions) -> Result<Self, ContainerError> {
        let mut stream = stream
            .with_log(options.log)
            .with_capture_unknown(options.capture_unknown);

        let mut ftyp = None;
        let mut moov = None;
        let mut atoms = Vec::new();

        while stream.remaining() >= HEADER_LENGTH {
            let mut atom = match Atom::read_header(&mut stream) {
                Ok(atom) => atom,
                // e.g. a trailing 'wide' with nothing after it
                Err(ContainerError::TruncatedHeader{offset, available}) => {
                    stream.log.warn(format_args!("ignoring {available} trailing bytes @ {offset}"));
                    break
                },
                Err(err) => return Err(err),
            };

            let known = TOP_LEVEL.contains(&atom.tag);
            if !known && atoms.is_empty() {
                return Err(ContainerError::NotRecognized)
            }

            // size 0: extends to the end of the file
            if atom.size == 0 {
                atom.end = stream.len();
                atom.size = atom.end - atom.start;
            }
            if atom.size < atom.header_size() {
                stream.log.warn(format_args!(
                    "'{}' @ {}: invalid size {}, stopping", atom.tag, atom.start, atom.size
                ));
                break
            }
            if atom.end > stream.len() {
                stream.log.warn(format_args!(
                    "'{}' @ {} truncated by {} bytes", atom.tag, atom.start, atom.end - stream.len()
                ));
                atom.end = stream.len();
                atom.size = atom.end - atom.start;
            }

            stream.log.debug(format_args!("'{}' @ {}, {} bytes", atom.tag, atom.start, atom.size));

            match atom.tag {
                FourCC::Moov if moov.is_none() => moov = Some(Moov::read_body(&mut stream, &atom)?),
                FourCC::Ftyp if ftyp.is_none() => ftyp = Some(Ftyp::read_body(&mut stream, &atom)?),
                _ => (),
            }
            atoms.push(atom);
            atom.skip(&mut stream)?;
        }

        let Some(moov) = moov else {
            return match atoms.iter().any(|a| TOP_LEVEL.contains(&a.tag)) {
                true => Err(ContainerError::NoMovieHeader),
                false => Err(ContainerError::NotRecognized),
            }
        };

        let tracks = moov.tracks.iter()
            .enumerate()
            .map(|(i, trak)| Track::new(i, trak))
            .collect();

        Ok(Self{stream, ftyp, moov, atoms, tracks})
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, index: usize) -> Result<&Track, ContainerError> {
        self.tracks.get(index).ok_or(ContainerError::NoSuchTrack(index))
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.is_video())
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(|t| t.is_audio())
    }

    pub fn moov(&self) -> &Moov {
        &self.moov
    }

    pub fn ftyp(&self) -> Option<&Ftyp> {
        self.ftyp.as_ref()
    }

    /// Top-level atoms, in file order.
    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    /// `true` if the movie atom was stored compressed.
    pub fn is_compressed(&self) -> bool {
        self.moov.is_compressed()
    }

    fn udta(&self) -> Option<&Udta> {
        self.moov.udta.as_ref()
    }

    /// Movie name (`©nam`).
    pub fn name(&self) -> Option<&str> {
        self.udta()?.name()
    }

    /// Copyright notice (`©cpy`).
    pub fn copyright(&self) -> Option<&str> {
        self.udta()?.copyright()
    }

    /// Information (`©inf`).
    pub fn info(&self) -> Option<&str> {
        self.udta()?.info()
    }

    /// Movie duration, from the movie header.
    pub fn duration(&self) -> Duration {
        self.moov.mvhd.duration()
    }

    /// Position, size, and duration of every sample in `track`.
    pub fn sample_offsets(&self, track: usize) -> Result<SampleOffsets, ContainerError> {
        let trak = self.moov.track(track).ok_or(ContainerError::NoSuchTrack(track))?;
        SampleOffsets::new(trak.stbl(), trak.mdia.mdhd.time_scale())
    }

    /// Raw bytes of `sample` (0-based) in `track`.
    pub fn read_sample(&mut self, track: usize, sample: u64) -> Result<Vec<u8>, ContainerError> {
        let trak = self.moov.track(track).ok_or(ContainerError::NoSuchTrack(track))?;
        let (position, size) = trak.stbl()
            .sample_location(sample)
            .ok_or(ContainerError::NoSuchSample{track, sample})?;
        self.stream.seek_to(position)?;
        self.stream.read_fixed_bytes(size as u64)
    }

    /// Decodes video `frame` (0-based) of `track` into `dst`,
    /// converting to the layout of `dst`. Only uncompressed
    /// formats can be decoded.
    pub fn read_frame(
        &mut self,
        track: usize,
        frame: u64,
        dst: &mut DestFrame<'_>,
    ) -> Result<(), ContainerError> {
        let (codec, width, height, depth) = {
            let t = self.track(track)?;
            (t.codec, t.width, t.height, t.depth)
        };
        let mut codec = codec_for(codec)?;
        if codec.fourcc().is(b"raw ") && depth == 32 {
            codec.set_parameter("depth", "32")?;
        }
        let sample = self.read_sample(track, frame)?;
        codec.decode(&sample, width, height, dst)
    }
}

//! QuickTime/MP4 writing session.
//!
//! Samples are appended to a single `mdat` as they arrive, one
//! chunk per sample. The movie atom is assembled in memory and
//! written after `mdat` by [`QuickTimeWriter::finish`].
//!
//! ```ignore
//! let mut qt = QuickTimeWriter::create(Path::new("OUT.MOV"), WriteOptions::default())?;
//! let video = qt.add_video_track(320, 240, FourCC::from_str("v308"), 25, 1)?;
//! qt.write_frame(video, &frame.source())?;
//! qt.finish()?;
//! ```

use std::path::Path;

use crate::{
    atom::Atom,
    atom_types::{
        AtomBody,
        AudioDescription,
        AudioVersion,
        Dref,
        DrefEntry,
        Elst,
        Ftyp,
        Hdlr,
        Iods,
        Mdhd,
        Mdia,
        MediaHeader,
        MediaKind,
        Minf,
        Moov,
        Mvhd,
        NameStyle,
        SampleDescription,
        Smhd,
        Stbl,
        Stsd,
        Stss,
        Tkhd,
        Trak,
        Udta,
        VideoDescription,
        Vmhd,
        COPYRIGHT,
        INFO,
        NAME,
    },
    codecs::{codec_for, VideoCodec},
    colormodels::SourceFrame,
    consts::{HEADER_LENGTH, MOOV_RETRY_REWIND},
    ByteStream,
    ContainerError,
    FourCC,
    LogSink,
};

/// Movie time scale.
const MOVIE_TIME_SCALE: u32 = 600;

/// Flavour of the written file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileType {
    /// QuickTime, no `ftyp`.
    #[default]
    Mov,
    Mp4,
    M4a,
    ThreeGp,
}

impl FileType {
    fn ftyp(&self) -> Option<Ftyp> {
        match self {
            FileType::Mov => None,
            FileType::Mp4 => Some(Ftyp::new(b"isom", 0x200, &[b"isom", b"iso2", b"mp41"])),
            FileType::M4a => Some(Ftyp::new(b"M4A ", 0, &[b"M4A ", b"mp42", b"isom"])),
            FileType::ThreeGp => Some(Ftyp::new(b"3gp4", 0x200, &[b"isom", b"3gp4"])),
        }
    }

    /// `true` for the ISO flavours.
    pub fn is_iso(&self) -> bool {
        !matches!(self, FileType::Mov)
    }
}

/// Options for creating a file.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub file_type: FileType,
    /// Reserve a 64-bit `mdat` header up front. Otherwise a `wide`
    /// placeholder precedes a 32-bit header and is taken over
    /// only if `mdat` outgrows 4 GiB.
    pub mdat_64bit: bool,
    /// Write every atom with a 64-bit size and all chunk
    /// offsets as `co64`.
    pub force_64bit_sizes: bool,
    pub log: LogSink,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            file_type: FileType::default(),
            mdat_64bit: false,
            force_64bit_sizes: false,
            log: LogSink::default(),
        }
    }
}

/// Per-track writer state.
struct TrackState {
    codec: Option<Box<dyn VideoCodec>>,
    /// Default duration for `write_frame()`.
    frame_duration: u32,
}

/// QuickTime/MP4 writer.
pub struct QuickTimeWriter {
    stream: ByteStream,
    options: WriteOptions,
    moov: Moov,
    tracks: Vec<TrackState>,
    mdat: Atom,
    /// Start of the `wide` placeholder before a 32-bit `mdat` header.
    wide_at: Option<u64>,
}

impl QuickTimeWriter {
    pub fn create(path: &Path, options: WriteOptions) -> Result<Self, ContainerError> {
        Self::start(ByteStream::create(path)?, options)
    }

    pub fn in_memory(options: WriteOptions) -> Result<Self, ContainerError> {
        Self::start(ByteStream::memory(Vec::new()), options)
    }

    /// Same as `in_memory()`, but writes fail once the stream
    /// would grow past `limit` bytes.
    pub fn in_memory_limited(options: WriteOptions, limit: u64) -> Result<Self, ContainerError> {
        Self::start(ByteStream::memory(Vec::new()).with_limit(limit), options)
    }

    fn start(stream: ByteStream, options: WriteOptions) -> Result<Self, ContainerError> {
        let mut stream = stream
            .with_log(options.log.clone())
            .with_wide_sizes(options.force_64bit_sizes);

        if let Some(ftyp) = options.file_type.ftyp() {
            ftyp.write(&mut stream)?;
        }

        let (mdat, wide_at) = match options.mdat_64bit || options.force_64bit_sizes {
            true => (Atom::write_header64(&mut stream, FourCC::Mdat)?, None),
            false => {
                let wide_at = stream.position();
                stream.write_u32(HEADER_LENGTH as u32)?;
                stream.write_fourcc(&FourCC::Wide)?;
                (Atom::write_header(&mut stream, FourCC::Mdat)?, Some(wide_at))
            }
        };

        Ok(Self {
            stream,
            options,
            moov: Moov::new(Mvhd::new(MOVIE_TIME_SCALE)),
            tracks: Vec::new(),
            mdat,
            wide_at,
        })
    }

    /// Media handler and, for QuickTime, data handler.
    fn handlers(&self, kind: MediaKind) -> (Hdlr, Option<Hdlr>) {
        let is_video = kind == MediaKind::Video;
        match self.options.file_type.is_iso() {
            true => {
                let name = if is_video {"VideoHandler"} else {"SoundHandler"};
                let media = Hdlr::new(FourCC::default(), kind.handler(), name, NameStyle::CString);
                (media, None)
            },
            false => {
                let name = match is_video {
                    true => "Linux Video Media Handler",
                    false => "Linux Sound Media Handler",
                };
                let media = Hdlr::new(FourCC::from_str("mhlr"), kind.handler(), name, NameStyle::Pascal);
                let data = Hdlr::new(FourCC::from_str("dhlr"), FourCC::Alis, "Linux Alias Data Handler", NameStyle::Pascal);
                (media, Some(data))
            },
        }
    }

    fn add_track(
        &mut self,
        tkhd: Tkhd,
        time_scale: u32,
        kind: MediaKind,
        header: MediaHeader,
        stsd: Stsd,
        state: TrackState,
    ) -> usize {
        let (media_handler, data_handler) = self.handlers(kind);

        let mut stbl = Stbl::new(stsd);
        stbl.stco.wide = self.options.force_64bit_sizes;

        let mut minf = Minf::new(header, stbl);
        minf.hdlr = data_handler;
        if self.options.file_type.is_iso() {
            minf.dref = Dref{table: vec![DrefEntry::self_contained(FourCC::Url)], ..Dref::default()};
        }

        let mdia = Mdia::new(Mdhd::new(time_scale), media_handler, minf);
        self.moov.tracks.push(Trak::new(tkhd, mdia));
        self.moov.mvhd.next_track_id += 1;
        self.tracks.push(state);
        self.moov.tracks.len() - 1
    }

    /// Adds a video track, returns its index. `frame_duration` in
    /// `time_scale` units is used by `write_frame()`.
    pub fn add_video_track(
        &mut self,
        width: u32,
        height: u32,
        codec: FourCC,
        time_scale: u32,
        frame_duration: u32,
    ) -> Result<usize, ContainerError> {
        let codec_impl = codec_for(codec).ok();
        let depth = match codec_impl.as_ref().map(|c| c.colormodel().has_alpha()) {
            Some(true) => 32,
            _ => 24,
        };

        let description = VideoDescription::new(
            u16::try_from(width)?,
            u16::try_from(height)?,
            depth,
            &codec.to_str(),
        );
        let stsd = Stsd::new(SampleDescription::new_video(codec, description));
        let tkhd = Tkhd::new(self.moov.mvhd.next_track_id, width, height);
        let state = TrackState{codec: codec_impl, frame_duration};

        Ok(self.add_track(tkhd, time_scale, MediaKind::Video, MediaHeader::Video(Vmhd::default()), stsd, state))
    }

    /// Adds a sound track with one sample per audio frame,
    /// returns its index. The media time scale is the sample rate.
    pub fn add_audio_track(
        &mut self,
        channels: u32,
        sample_rate: u32,
        bits: u32,
        codec: FourCC,
    ) -> Result<usize, ContainerError> {
        let mut description = AudioDescription::new(channels, sample_rate as f64, bits);
        if sample_rate > u16::MAX as u32 || channels > 2 {
            description.version = AudioVersion::V2 {
                format_flags: 0x0c,
                const_bytes_per_packet: channels * bits / 8,
                const_frames_per_packet: 1,
            };
        }
        let stsd = Stsd::new(SampleDescription::new_audio(codec, description));
        let tkhd = Tkhd::new(self.moov.mvhd.next_track_id, 0, 0);
        let state = TrackState{codec: None, frame_duration: 1};

        Ok(self.add_track(tkhd, sample_rate, MediaKind::Sound, MediaHeader::Sound(Smhd::default()), stsd, state))
    }

    /// Appends one sample to `mdat` as its own chunk.
    /// `duration` is in the track's media time scale.
    pub fn write_sample(
        &mut self,
        track: usize,
        bytes: &[u8],
        duration: u32,
        keyframe: bool,
    ) -> Result<(), ContainerError> {
        if track >= self.moov.tracks.len() {
            return Err(ContainerError::NoSuchTrack(track))
        }
        let position = self.stream.position();
        self.stream.write_fixed_bytes(bytes)?;

        let stbl = self.moov.tracks[track].stbl_mut();
        let sample = stbl.stsz.len();
        stbl.stco.push(position);
        stbl.stsc.push_chunk(stbl.stco.len() as u32, 1, 1);
        stbl.stsz.push(u32::try_from(bytes.len())?);
        stbl.stts.push(duration);

        match stbl.stss.as_mut() {
            Some(stss) if keyframe => stss.push(sample),
            Some(_) => (),
            // first non-keyframe: every sample so far was a keyframe
            None if !keyframe => {
                let mut stss = Stss::default();
                (0 .. sample).for_each(|s| stss.push(s));
                stbl.stss = Some(stss);
            },
            None => (),
        }
        Ok(())
    }

    /// Encodes `frame` with the track's codec and appends it
    /// as a keyframe.
    pub fn write_frame(&mut self, track: usize, frame: &SourceFrame<'_>) -> Result<(), ContainerError> {
        let state = self.tracks.get_mut(track).ok_or(ContainerError::NoSuchTrack(track))?;
        let duration = state.frame_duration;
        let codec = match state.codec.as_mut() {
            Some(codec) => codec,
            None => {
                let format = self.moov.tracks[track].stbl().stsd.format().unwrap_or_default();
                return Err(ContainerError::UnsupportedCodec(format))
            }
        };
        let bytes = codec.encode(frame)?;
        self.write_sample(track, &bytes, duration, true)
    }

    fn udta(&mut self) -> &mut Udta {
        self.moov.udta.get_or_insert_with(Udta::default)
    }

    pub fn set_name(&mut self, name: &str) {
        self.udta().set_text(NAME, name)
    }

    pub fn set_copyright(&mut self, copyright: &str) {
        self.udta().set_text(COPYRIGHT, copyright)
    }

    pub fn set_info(&mut self, info: &str) {
        self.udta().set_text(INFO, info)
    }

    /// Movie atom as it will be written.
    pub fn moov(&self) -> &Moov {
        &self.moov
    }

    /// Patches the `mdat` size so that it ends at `end`.
    fn patch_mdat(&mut self, end: u64) -> Result<(), ContainerError> {
        let size = end - self.mdat.start;
        match (self.mdat.use_64, self.wide_at, u32::try_from(size)) {
            (true, _, _) => {
                self.stream.seek_to(self.mdat.start + HEADER_LENGTH)?;
                self.stream.write_u64(size)?;
            },
            (false, _, Ok(size)) => {
                self.stream.seek_to(self.mdat.start)?;
                self.stream.write_u32(size)?;
            },
            // too large for 32 bits: the 'wide' placeholder
            // becomes the start of a 64-bit header
            (false, Some(wide_at), Err(_)) => {
                self.stream.seek_to(wide_at)?;
                self.stream.write_u32(1)?;
                self.stream.write_fourcc(&FourCC::Mdat)?;
                self.stream.write_u64(end - wide_at)?;
                self.mdat.start = wide_at;
                self.mdat.use_64 = true;
                self.wide_at = None;
            },
            (false, None, Err(err)) => return Err(err.into()),
        }
        self.mdat.end = end;
        self.mdat.size = end - self.mdat.start;
        self.stream.seek_to(end)?;
        Ok(())
    }

    /// Fills in durations and edit lists.
    fn close_tracks(&mut self) {
        let movie_scale = self.moov.mvhd.time_scale as u64;
        let mut longest = 0;
        for trak in self.moov.tracks.iter_mut() {
            let media_duration = trak.stbl().stts.total_duration();
            let media_scale = trak.mdia.mdhd.time_scale.max(1) as u64;
            let duration = u32::try_from(media_duration * movie_scale / media_scale).unwrap_or(u32::MAX);
            trak.mdia.mdhd.duration = u32::try_from(media_duration).unwrap_or(u32::MAX);
            trak.tkhd.duration = duration;
            trak.elst = Some(Elst::single(duration));
            longest = longest.max(duration);
        }
        self.moov.mvhd.duration = longest;

        if self.options.file_type.is_iso() {
            self.moov.iods = Some(Iods {
                track_ids: self.moov.tracks.iter().map(|t| t.tkhd.track_id()).collect(),
                ..Iods::default()
            });
        }
    }

    /// Writes `moov` after `mdat`. If the write fails, e.g. because
    /// the disk is full, it is retried once, one megabyte earlier,
    /// and `mdat` is cut short to end there.
    fn write_moov(&mut self) -> Result<(), ContainerError> {
        let start = self.stream.position();
        match self.moov.write(&mut self.stream) {
            Ok(()) => Ok(()),
            Err(ContainerError::IoWriteFailure{offset, source}) => {
                let retry_at = start
                    .saturating_sub(MOOV_RETRY_REWIND)
                    .max(self.mdat.data_offset());
                self.stream.log.warn(format_args!(
                    "writing 'moov' failed @ {offset} ({source}), retrying @ {retry_at}"
                ));
                self.patch_mdat(retry_at)?;
                self.moov.write(&mut self.stream)
            },
            Err(err) => Err(err),
        }
    }

    /// Closes `mdat`, writes the movie atom, and flushes.
    /// Returns the stream, e.g. for `ByteStream::into_bytes()`.
    pub fn finish(mut self) -> Result<ByteStream, ContainerError> {
        let end = self.stream.position();
        self.patch_mdat(end)?;
        self.close_tracks();
        self.write_moov()?;
        self.stream.flush_all()?;
        Ok(self.stream)
    }
}

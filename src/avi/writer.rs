//! AVI/OpenDML writer.
//!
//! Layout:
//!
//! ```ignore
//! RIFF 'AVI '
//!     LIST 'hdrl'
//!         avih
//!         LIST 'strl' (per stream)
//!             strh, strf, [strn], indx (fixed capacity)
//!         LIST 'odml'
//!             dmlh
//!     LIST 'movi'
//!         00dc, 01wb, ..., ix00, ix01, ...
//!     idx1
//! RIFF 'AVIX' (as many as needed)
//!     LIST 'movi'
//!         ...
//! ```
//!
//! Header counts, stream lengths and super indexes are
//! patched in place by `finish()`.

use std::path::Path;

use crate::{ByteStream, ContainerError, FourCC, LogSink};

use super::{
    headers::{
        write_strn,
        BitmapInfoHeader,
        Dmlh,
        MainHeader,
        StreamFormat,
        StreamHeader,
        WaveFormatEx,
        AVIF_HASINDEX,
        AVIF_ISINTERLEAVED,
        AVIF_TRUSTCKTYPE,
    },
    index::{
        chunk_tag,
        ix_tag,
        Idx1Entry,
        StandardIndex,
        StandardIndexEntry,
        SuperIndex,
        SuperIndexEntry,
        AVIIF_KEYFRAME,
        STANDARD_INDEX_ENTRY_LENGTH,
        STANDARD_INDEX_HEADER_LENGTH,
    },
    riff::{write_chunk, RiffChunk, CHUNK_HEADER_LENGTH},
};

/// Two-digit stream numbers in chunk tags.
const MAX_STREAMS: usize = 100;

#[derive(Debug, Clone)]
pub struct AviWriteOptions {
    /// Chunks per `ix##` standard index table.
    pub ix_entries_per_table: usize,
    /// Entries reserved in each stream's `indx` super index.
    /// Writing more standard index tables than this fails.
    pub superindex_capacity: usize,
    /// Size at which a new `RIFF AVIX` segment is started.
    /// Must stay below 4GiB.
    pub riff_size_limit: u64,
    pub log: LogSink,
}

impl Default for AviWriteOptions {
    fn default() -> Self {
        Self {
            ix_entries_per_table: 2048,
            superindex_capacity: 256,
            riff_size_limit: 1 << 30,
            log: LogSink::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingEntry {
    offset: u64,
    size: u32,
    keyframe: bool,
}

#[derive(Debug)]
struct StreamState {
    header: StreamHeader,
    format: StreamFormat,
    name: Option<String>,
    chunk_tag: FourCC,
    ix_tag: FourCC,
    /// Data offset of `strh`.
    strh_at: u64,
    /// Data offset of `indx`.
    indx_at: u64,
    super_index: SuperIndex,
    /// Chunks not yet in a standard index table.
    pending: Vec<PendingEntry>,
    pending_samples: u64,
    chunks: u64,
    first_segment_chunks: u64,
    samples: u64,
    max_chunk: u32,
}

impl StreamState {
    fn new(index: usize, kind: &[u8; 2], header: StreamHeader, format: StreamFormat) -> Self {
        let chunk_tag = chunk_tag(index, kind);
        Self {
            header,
            format,
            name: None,
            chunk_tag,
            ix_tag: ix_tag(index),
            strh_at: 0,
            indx_at: 0,
            super_index: SuperIndex::new(chunk_tag),
            pending: Vec::new(),
            pending_samples: 0,
            chunks: 0,
            first_segment_chunks: 0,
            samples: 0,
            max_chunk: 0,
        }
    }
}

#[derive(Debug)]
pub struct AviWriter {
    stream: ByteStream,
    options: AviWriteOptions,
    main_header: MainHeader,
    streams: Vec<StreamState>,
    avih_at: u64,
    dmlh_at: u64,
    started: bool,
    riff: Option<RiffChunk>,
    movi: Option<RiffChunk>,
    /// 0 for `RIFF AVI `, 1.. for `RIFF AVIX`.
    segment: usize,
    segment_chunks: u64,
    idx1: Vec<Idx1Entry>,
}

impl AviWriter {
    pub fn create(path: &Path, options: AviWriteOptions) -> Result<Self, ContainerError> {
        let stream = ByteStream::create(path)?;
        Ok(Self::new(stream, options))
    }

    pub fn in_memory(options: AviWriteOptions) -> Self {
        Self::new(ByteStream::memory(Vec::new()), options)
    }

    fn new(stream: ByteStream, options: AviWriteOptions) -> Self {
        Self {
            stream: stream.with_log(options.log.clone()),
            options,
            main_header: MainHeader::default(),
            streams: Vec::new(),
            avih_at: 0,
            dmlh_at: 0,
            started: false,
            riff: None,
            movi: None,
            segment: 0,
            segment_chunks: 0,
            idx1: Vec::new(),
        }
    }

    fn check_can_add(&self) -> Result<(), ContainerError> {
        if self.started {
            return Err(ContainerError::WriterState("streams must be added before the first chunk".to_owned()))
        }
        if self.streams.len() >= MAX_STREAMS {
            return Err(ContainerError::WriterState(format!("at most {MAX_STREAMS} streams")))
        }
        Ok(())
    }

    /// Adds a video stream with frame rate `rate / scale`
    /// and returns its index.
    pub fn add_video_stream(
        &mut self,
        width: u32,
        height: u32,
        compressor: FourCC,
        bit_count: u16,
        rate: u32,
        scale: u32,
    ) -> Result<usize, ContainerError> {
        self.check_can_add()?;
        let index = self.streams.len();
        let header = StreamHeader {
            fcc_type: FourCC::Vids,
            fcc_handler: compressor,
            scale,
            rate,
            quality: u32::MAX,
            frame: [0, 0, clamp_i16(width), clamp_i16(height)],
            ..Default::default()
        };
        let format = StreamFormat::Video {
            header: BitmapInfoHeader {
                size: BitmapInfoHeader::LENGTH as u32,
                width: i32::try_from(width)?,
                height: i32::try_from(height)?,
                planes: 1,
                bit_count,
                compression: compressor,
                size_image: (width as u64 * height as u64 * bit_count as u64 / 8) as u32,
                ..Default::default()
            },
            extra: Vec::new(),
        };
        if !self.streams.iter().any(|s| s.header.is_video()) {
            self.main_header.width = width;
            self.main_header.height = height;
            self.main_header.micro_sec_per_frame = match rate {
                0 => 0,
                r => (scale as u64 * 1_000_000 / r as u64) as u32,
            };
        }
        self.streams.push(StreamState::new(index, b"dc", header, format));
        Ok(index)
    }

    /// Adds an integer PCM stream and returns its index.
    /// One sample is one block of `channels * bits / 8` bytes.
    pub fn add_audio_stream(&mut self, channels: u16, sample_rate: u32, bits: u16) -> Result<usize, ContainerError> {
        self.check_can_add()?;
        let index = self.streams.len();
        let wave = WaveFormatEx::pcm(channels, sample_rate, bits);
        let header = StreamHeader {
            fcc_type: FourCC::Auds,
            scale: wave.block_align as u32,
            rate: wave.avg_bytes_per_sec,
            quality: u32::MAX,
            sample_size: wave.block_align as u32,
            ..Default::default()
        };
        let format = StreamFormat::Audio{format: wave, extra: Vec::new()};
        self.streams.push(StreamState::new(index, b"wb", header, format));
        Ok(index)
    }

    /// Sets the `strn` name of a stream.
    pub fn set_stream_name(&mut self, stream: usize, name: &str) -> Result<(), ContainerError> {
        if self.started {
            return Err(ContainerError::WriterState("stream names must be set before the first chunk".to_owned()))
        }
        let state = self.streams.get_mut(stream)
            .ok_or(ContainerError::NoSuchTrack(stream))?;
        state.name = Some(name.to_owned());
        Ok(())
    }

    fn start(&mut self) -> Result<(), ContainerError> {
        self.main_header.streams = self.streams.len() as u32;
        self.main_header.flags = AVIF_HASINDEX | AVIF_ISINTERLEAVED | AVIF_TRUSTCKTYPE;

        let riff = RiffChunk::write_list(&mut self.stream, FourCC::Riff, FourCC::Avi)?;
        let hdrl = RiffChunk::write_list(&mut self.stream, FourCC::List, FourCC::Hdrl)?;

        let avih = RiffChunk::write_header(&mut self.stream, FourCC::Avih)?;
        self.avih_at = self.stream.position();
        self.stream.write_le(&self.main_header)?;
        avih.write_footer(&mut self.stream)?;

        let capacity = self.options.superindex_capacity;
        for state in self.streams.iter_mut() {
            let strl = RiffChunk::write_list(&mut self.stream, FourCC::List, FourCC::Strl)?;

            let strh = RiffChunk::write_header(&mut self.stream, FourCC::Strh)?;
            state.strh_at = self.stream.position();
            self.stream.write_le(&state.header)?;
            strh.write_footer(&mut self.stream)?;

            RiffChunk::write_header(&mut self.stream, FourCC::Strf)?
                .finish(&mut self.stream, |s| state.format.write(s))?;

            if let Some(name) = &state.name {
                RiffChunk::write_header(&mut self.stream, FourCC::Strn)?
                    .finish(&mut self.stream, |s| write_strn(s, name))?;
            }

            let indx = RiffChunk::write_header(&mut self.stream, FourCC::Indx)?;
            state.indx_at = self.stream.position();
            state.super_index.write(&mut self.stream, capacity)?;
            indx.write_footer(&mut self.stream)?;

            strl.write_footer(&mut self.stream)?;
        }

        let odml = RiffChunk::write_list(&mut self.stream, FourCC::List, FourCC::Odml)?;
        let dmlh = RiffChunk::write_header(&mut self.stream, FourCC::Dmlh)?;
        self.dmlh_at = self.stream.position();
        Dmlh::default().write(&mut self.stream)?;
        dmlh.write_footer(&mut self.stream)?;
        odml.write_footer(&mut self.stream)?;

        hdrl.write_footer(&mut self.stream)?;

        self.movi = Some(RiffChunk::write_list(&mut self.stream, FourCC::List, FourCC::Movi)?);
        self.riff = Some(riff);
        self.started = true;
        Ok(())
    }

    /// Segment size if a chunk of `len` bytes is added, including
    /// the index data that must still go into this segment.
    fn projected_size(&self, riff: &RiffChunk, len: u32) -> u64 {
        let chunk = CHUNK_HEADER_LENGTH + len as u64 + len as u64 % 2;
        let idx1 = match self.segment {
            0 => CHUNK_HEADER_LENGTH + Idx1Entry::LENGTH * (self.idx1.len() as u64 + 1),
            _ => 0,
        };
        let tables: u64 = self.streams.iter()
            .map(|s| CHUNK_HEADER_LENGTH
                + STANDARD_INDEX_HEADER_LENGTH
                + STANDARD_INDEX_ENTRY_LENGTH * (s.pending.len() as u64 + 1))
            .sum();
        self.stream.position() - riff.start + chunk + idx1 + tables
    }

    /// Writes one chunk holding `samples` samples for `stream`
    /// and returns the absolute offset of its data.
    ///
    /// For streams with variable sample size (video) a chunk is one
    /// sample, and `samples` should be 1.
    pub fn write_chunk(
        &mut self,
        stream: usize,
        bytes: &[u8],
        samples: u32,
        keyframe: bool,
    ) -> Result<u64, ContainerError> {
        if stream >= self.streams.len() {
            return Err(ContainerError::NoSuchTrack(stream))
        }
        if !self.started {
            self.start()?;
        }
        let len = u32::try_from(bytes.len())?;

        if let Some(riff) = self.riff {
            if self.segment_chunks > 0 && self.projected_size(&riff, len) > self.options.riff_size_limit {
                self.next_segment()?;
            }
        }

        let tag = self.streams[stream].chunk_tag;
        let chunk = write_chunk(&mut self.stream, tag, bytes)?;

        if self.segment == 0 {
            let movi = self.movi.map(|m| m.start + CHUNK_HEADER_LENGTH).unwrap_or_default();
            self.idx1.push(Idx1Entry {
                chunk_id: tag,
                flags: if keyframe {AVIIF_KEYFRAME} else {0},
                offset: u32::try_from(chunk.start - movi)?,
                size: len,
            });
        }

        let state = &mut self.streams[stream];
        state.pending.push(PendingEntry{offset: chunk.data_offset(), size: len, keyframe});
        state.pending_samples += samples as u64;
        state.chunks += 1;
        if self.segment == 0 {
            state.first_segment_chunks += 1;
        }
        state.samples += samples as u64;
        state.max_chunk = state.max_chunk.max(len);
        self.segment_chunks += 1;

        if state.pending.len() >= self.options.ix_entries_per_table.max(1) {
            self.flush_index(stream)?;
        }

        Ok(chunk.data_offset())
    }

    /// Writes the pending entries of `stream` as an `ix##` table
    /// in the current `movi` list.
    fn flush_index(&mut self, stream: usize) -> Result<(), ContainerError> {
        let capacity = self.options.superindex_capacity;
        let state = &mut self.streams[stream];
        let Some(first) = state.pending.first() else {
            return Ok(())
        };
        if state.super_index.entries.len() >= capacity {
            return Err(ContainerError::WriterState(format!(
                "super index of stream {stream} is full ({capacity} tables)"
            )))
        }

        let base_offset = first.offset;
        let entries = state.pending.iter()
            .map(|p| Ok(StandardIndexEntry::new(u32::try_from(p.offset - base_offset)?, p.size, p.keyframe)))
            .collect::<Result<Vec<_>, ContainerError>>()?;
        let ix = StandardIndex{chunk_id: state.chunk_tag, base_offset, entries};

        let chunk = RiffChunk::write_header(&mut self.stream, state.ix_tag)?
            .finish(&mut self.stream, |s| ix.write(s))?;

        self.stream.log.trace(format_args!(
            "'{}' @ {}, {} entries", state.ix_tag, chunk.start, ix.entries.len()
        ));

        state.super_index.entries.push(SuperIndexEntry {
            offset: chunk.start,
            size: u32::try_from(chunk.end - chunk.start)?,
            duration: u32::try_from(state.pending_samples)?,
        });
        state.pending.clear();
        state.pending_samples = 0;
        Ok(())
    }

    /// Flushes all standard indexes, closes `movi`, writes `idx1`
    /// for the first segment and closes the `RIFF`.
    fn close_segment(&mut self) -> Result<(), ContainerError> {
        for stream in 0 .. self.streams.len() {
            self.flush_index(stream)?;
        }
        if let Some(movi) = self.movi.take() {
            movi.write_footer(&mut self.stream)?;
        }
        if self.segment == 0 {
            Idx1Entry::write_all(&mut self.stream, &self.idx1)?;
        }
        if let Some(riff) = self.riff.take() {
            riff.write_footer(&mut self.stream)?;
        }
        Ok(())
    }

    fn next_segment(&mut self) -> Result<(), ContainerError> {
        self.close_segment()?;
        self.segment += 1;
        self.segment_chunks = 0;
        self.stream.log.debug(format_args!(
            "'RIFF AVIX' segment {} @ {}", self.segment, self.stream.position()
        ));
        self.riff = Some(RiffChunk::write_list(&mut self.stream, FourCC::Riff, FourCC::Avix)?);
        self.movi = Some(RiffChunk::write_list(&mut self.stream, FourCC::List, FourCC::Movi)?);
        Ok(())
    }

    fn patch_headers(&mut self) -> Result<(), ContainerError> {
        let video = self.streams.iter().find(|s| s.header.is_video());
        self.main_header.total_frames = u32::try_from(video.map(|s| s.first_segment_chunks).unwrap_or(0))?;
        let total_frames = u32::try_from(video.map(|s| s.chunks).unwrap_or(0))?;
        self.main_header.suggested_buffer_size = self.streams.iter()
            .map(|s| s.max_chunk)
            .max()
            .unwrap_or(0);

        self.stream.seek_to(self.avih_at)?;
        self.stream.write_le(&self.main_header)?;

        let capacity = self.options.superindex_capacity;
        for state in self.streams.iter_mut() {
            state.header.length = u32::try_from(state.samples)?;
            state.header.suggested_buffer_size = state.max_chunk;
            self.stream.seek_to(state.strh_at)?;
            self.stream.write_le(&state.header)?;
            self.stream.seek_to(state.indx_at)?;
            state.super_index.write(&mut self.stream, capacity)?;
        }

        self.stream.seek_to(self.dmlh_at)?;
        self.stream.write_u32_le(total_frames)?;
        Ok(())
    }

    /// Closes the last segment, patches all headers and
    /// returns the underlying stream.
    pub fn finish(mut self) -> Result<ByteStream, ContainerError> {
        if !self.started {
            self.start()?;
        }
        self.close_segment()?;
        let end = self.stream.position();
        self.patch_headers()?;
        self.stream.seek_to(end)?;
        self.stream.flush_all()?;
        Ok(self.stream)
    }
}

fn clamp_i16(value: u32) -> i16 {
    value.min(i16::MAX as u32) as i16
}

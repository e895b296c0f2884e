//! AVI/OpenDML reading session.
//!
//! ```ignore
//! use movkit::{AviReader, ReadOptions};
//! use std::path::Path;
//!
//! fn main() -> Result<(), movkit::ContainerError> {
//!     let mut avi = AviReader::open(Path::new("VIDEO.AVI"), ReadOptions::default())?;
//!     let (chunk, _first) = avi.chunk_of_sample(0, 100)?;
//!     let data = avi.read_chunk(0, chunk)?;
//!     println!("{} bytes", data.len());
//!     Ok(())
//! }
//! ```

use std::path::Path;

use crate::{quicktime::ReadOptions, ByteStream, ContainerError, FourCC};

use super::{
    chunks::{ChunkEntry, ChunkTable},
    headers::{read_strn, Dmlh, MainHeader, StreamFormat, StreamHeader},
    index::{stream_of, Idx1Entry, StandardIndex, SuperIndex, AVIIF_LIST},
    riff::RiffChunk,
};

/// One `strl` and its resolved chunks.
#[derive(Debug, Clone, PartialEq)]
pub struct AviStream {
    pub header: StreamHeader,
    pub format: StreamFormat,
    pub name: Option<String>,
    pub super_index: Option<SuperIndex>,
    pub chunks: ChunkTable,
}

impl AviStream {
    fn new(header: StreamHeader) -> Self {
        Self {
            format: StreamFormat::Other(Vec::new()),
            header,
            name: None,
            super_index: None,
            chunks: ChunkTable::default(),
        }
    }
}

/// An open AVI file.
#[derive(Debug)]
pub struct AviReader {
    stream: ByteStream,
    main_header: MainHeader,
    dmlh: Option<Dmlh>,
    streams: Vec<AviStream>,
    /// `movi` list of each `RIFF` segment.
    movi: Vec<RiffChunk>,
    idx1: Option<Vec<Idx1Entry>>,
}

impl AviReader {
    pub fn open(path: &Path, options: ReadOptions) -> Result<Self, ContainerError> {
        let stream = ByteStream::open(path)?.with_log(options.log);
        Self::read(stream)
    }

    pub fn from_bytes(data: Vec<u8>, options: ReadOptions) -> Result<Self, ContainerError> {
        let stream = ByteStream::memory(data).with_log(options.log);
        Self::read(stream)
    }

    fn read(mut stream: ByteStream) -> Result<Self, ContainerError> {
        let mut avi = Self {
            stream: ByteStream::memory(Vec::new()),
            main_header: MainHeader::default(),
            dmlh: None,
            streams: Vec::new(),
            movi: Vec::new(),
            idx1: None,
        };

        let len = stream.len();
        let mut first = true;
        while stream.remaining() >= 12 {
            let mut riff = RiffChunk::read_header(&mut stream)?;
            let segment_type = match (riff.is(b"RIFF"), riff.list_type) {
                (true, Some(t)) if t == FourCC::Avi || t == FourCC::Avix => t,
                _ if first => return Err(ContainerError::NotRecognized),
                _ => {
                    stream.log.warn(format_args!(
                        "skipping top-level chunk '{}' @ {}", riff.tag, riff.start
                    ));
                    riff.clamp(len, &stream);
                    riff.skip(&mut stream)?;
                    continue
                }
            };
            if first && segment_type != FourCC::Avi {
                return Err(ContainerError::NotRecognized)
            }
            // some writers leave the size at 0 or never patch it
            if riff.size() <= 4 {
                riff.end = len;
            }
            riff.clamp(len, &stream);
            stream.log.debug(format_args!(
                "'RIFF {}' @ {}, {} bytes", segment_type, riff.start, riff.size()
            ));
            avi.read_segment(&mut stream, &riff, first)?;
            riff.skip(&mut stream)?;
            first = false;
        }

        if first {
            return Err(ContainerError::NotRecognized)
        }
        if avi.streams.is_empty() {
            return Err(ContainerError::MalformedAtomGraph{
                tag: FourCC::Hdrl,
                offset: 0,
                reason: "no stream headers".to_owned()
            })
        }

        avi.stream = stream;
        avi.build_chunk_tables()?;

        Ok(avi)
    }

    fn read_segment(&mut self, stream: &mut ByteStream, riff: &RiffChunk, first: bool) -> Result<(), ContainerError> {
        stream.seek_to(riff.data_offset())?;
        while stream.position() + 8 <= riff.end {
            let mut chunk = RiffChunk::read_header(stream)?;
            chunk.clamp(riff.end, stream);
            if chunk.is_list(&FourCC::Hdrl) && first {
                self.read_hdrl(stream, &chunk)?;
            } else if chunk.is_list(&FourCC::Movi) {
                self.movi.push(chunk);
            } else if chunk.is(b"idx1") && first {
                self.idx1 = Some(Idx1Entry::read_all(stream, &chunk)?);
            } else {
                stream.log.trace(format_args!("skipping '{}' @ {}", chunk.tag, chunk.start));
            }
            chunk.skip(stream)?;
        }
        Ok(())
    }

    fn read_hdrl(&mut self, stream: &mut ByteStream, hdrl: &RiffChunk) -> Result<(), ContainerError> {
        while stream.position() + 8 <= hdrl.end {
            let mut chunk = RiffChunk::read_header(stream)?;
            chunk.clamp(hdrl.end, stream);
            if chunk.is(b"avih") {
                self.main_header = read_padded(stream, &chunk, 56)?;
            } else if chunk.is_list(&FourCC::Strl) {
                let strl = Self::read_strl(stream, &chunk)?;
                self.streams.push(strl);
            } else if chunk.is_list(&FourCC::Odml) {
                while stream.position() + 8 <= chunk.end {
                    let child = RiffChunk::read_header(stream)?;
                    if child.is(b"dmlh") {
                        self.dmlh = Some(Dmlh::read(stream, &child)?);
                    }
                    child.skip(stream)?;
                }
            }
            chunk.skip(stream)?;
        }
        Ok(())
    }

    fn read_strl(stream: &mut ByteStream, strl: &RiffChunk) -> Result<AviStream, ContainerError> {
        let mut avi_stream: Option<AviStream> = None;
        while stream.position() + 8 <= strl.end {
            let mut chunk = RiffChunk::read_header(stream)?;
            chunk.clamp(strl.end, stream);
            match avi_stream.as_mut() {
                None if chunk.tag == FourCC::Strh => {
                    let header: StreamHeader = read_padded(stream, &chunk, StreamHeader::LENGTH)?;
                    avi_stream = Some(AviStream::new(header));
                },
                None => {
                    return Err(ContainerError::MalformedAtomGraph{
                        tag: chunk.tag,
                        offset: chunk.start,
                        reason: "'strh' must be the first chunk in 'strl'".to_owned()
                    })
                },
                Some(s) => match chunk.tag {
                    FourCC::Strf => s.format = StreamFormat::read(stream, &chunk, &s.header.fcc_type)?,
                    FourCC::Strn => s.name = Some(read_strn(stream, &chunk)?),
                    FourCC::Indx => s.super_index = Some(SuperIndex::read(stream, &chunk)?),
                    _ => (),
                },
            }
            chunk.skip(stream)?;
        }
        avi_stream.ok_or_else(|| ContainerError::MalformedAtomGraph{
            tag: FourCC::Strl,
            offset: strl.start,
            reason: "missing 'strh'".to_owned()
        })
    }

    /// Resolves each stream's chunks from its OpenDML index if present,
    /// then from `idx1`, and as a last resort by scanning `movi`.
    fn build_chunk_tables(&mut self) -> Result<(), ContainerError> {
        let idx1 = self.idx1.take().unwrap_or_default();
        let mut tables = Vec::with_capacity(self.streams.len());
        for index in 0 .. self.streams.len() {
            let indx = self.streams[index].super_index.clone()
                .filter(|i| !i.entries.is_empty());
            let table = match indx {
                Some(indx) => self.chunks_from_indx(index, &indx)?,
                None if !idx1.is_empty() => self.chunks_from_idx1(index, &idx1),
                None => self.chunks_from_movi(index)?,
            };
            self.stream.log.debug(format_args!(
                "stream {index}: {} chunks, {} samples", table.len(), table.total_samples()
            ));
            tables.push(table);
        }
        self.streams.iter_mut()
            .zip(tables)
            .for_each(|(s, t)| s.chunks = t);
        if !idx1.is_empty() {
            self.idx1 = Some(idx1);
        }
        Ok(())
    }

    fn chunks_from_indx(&mut self, index: usize, indx: &SuperIndex) -> Result<ChunkTable, ContainerError> {
        let header = self.streams[index].header.clone();
        let mut table = ChunkTable::default();
        for entry in indx.entries.iter() {
            self.stream.seek_to(entry.offset)?;
            let chunk = RiffChunk::read_header(&mut self.stream)?;
            let ix = StandardIndex::read(&mut self.stream, &chunk)?;
            for e in ix.entries.iter() {
                let size = e.data_size();
                table.push(ChunkEntry{
                    offset: ix.base_offset + e.offset as u64,
                    size,
                    keyframe: e.is_keyframe(),
                    samples: header.samples_in(size),
                });
            }
        }
        Ok(table)
    }

    fn chunks_from_idx1(&self, index: usize, idx1: &[Idx1Entry]) -> ChunkTable {
        let header = &self.streams[index].header;
        let movi = self.movi.first()
            .map(|m| m.start + 8)
            .unwrap_or_default();
        // offsets are relative to the 'movi' list type, unless they
        // already point past it, in which case they are absolute
        let base = match idx1.first() {
            Some(first) if first.offset as u64 >= movi => 0,
            _ => movi,
        };
        idx1.iter()
            .filter(|e| e.flags & AVIIF_LIST == 0 && stream_of(&e.chunk_id) == Some(index))
            .map(|e| ChunkEntry{
                offset: base + e.offset as u64 + 8,
                size: e.size,
                keyframe: e.is_keyframe(),
                samples: header.samples_in(e.size),
            })
            .collect()
    }

    fn chunks_from_movi(&mut self, index: usize) -> Result<ChunkTable, ContainerError> {
        self.stream.log.debug(format_args!("stream {index}: no index, scanning 'movi'"));
        let header = self.streams[index].header.clone();
        let mut table = ChunkTable::default();
        let mut lists: Vec<RiffChunk> = self.movi.iter().rev().copied().collect();
        while let Some(list) = lists.pop() {
            self.stream.seek_to(list.data_offset())?;
            let mut nested = Vec::new();
            while self.stream.position() + 8 <= list.end {
                let mut chunk = RiffChunk::read_header(&mut self.stream)?;
                chunk.clamp(list.end, &self.stream);
                if chunk.list_type.is_some() {
                    // 'rec ' groups
                    nested.push(chunk);
                } else if stream_of(&chunk.tag) == Some(index) {
                    let size = chunk.data_size() as u32;
                    table.push(ChunkEntry{
                        offset: chunk.data_offset(),
                        size,
                        keyframe: true,
                        samples: header.samples_in(size),
                    });
                }
                chunk.skip(&mut self.stream)?;
            }
            lists.extend(nested.into_iter().rev());
        }
        Ok(table)
    }

    pub fn main_header(&self) -> &MainHeader {
        &self.main_header
    }

    pub fn streams(&self) -> &[AviStream] {
        &self.streams
    }

    pub fn stream(&self, index: usize) -> Result<&AviStream, ContainerError> {
        self.streams.get(index)
            .ok_or(ContainerError::NoSuchTrack(index))
    }

    /// Number of `RIFF` segments holding movie data.
    pub fn segments(&self) -> usize {
        self.movi.len()
    }

    /// Total video frames, from the OpenDML header if present.
    pub fn total_frames(&self) -> u32 {
        self.dmlh
            .map(|d| d.total_frames)
            .unwrap_or(self.main_header.total_frames)
    }

    pub fn is_open_dml(&self) -> bool {
        self.dmlh.is_some() || self.streams.iter().any(|s| s.super_index.is_some())
    }

    /// Chunk index holding `sample` of `stream`, and the first sample of that chunk.
    pub fn chunk_of_sample(&self, stream: usize, sample: u64) -> Result<(usize, u64), ContainerError> {
        self.stream(stream)?
            .chunks
            .chunk_of_sample(sample)
            .ok_or(ContainerError::NoSuchSample{track: stream, sample})
    }

    pub fn read_chunk(&mut self, stream: usize, chunk: usize) -> Result<Vec<u8>, ContainerError> {
        let entry = *self.stream(stream)?
            .chunks
            .get(chunk)
            .ok_or(ContainerError::NoSuchSample{track: stream, sample: chunk as u64})?;
        self.stream.seek_to(entry.offset)?;
        self.stream.read_fixed_bytes(entry.size as u64)
    }
}

/// Reads a fixed-size header from a chunk that may be shorter
/// than the full structure (older writers), zero-filling the rest.
fn read_padded<T>(stream: &mut ByteStream, chunk: &RiffChunk, length: u64) -> Result<T, ContainerError>
where
    T: for<'a> binrw::BinRead<Args<'a> = ()>,
{
    let mut bytes = stream.read_fixed_bytes(chunk.data_size().min(length))?;
    bytes.resize(length as usize, 0);
    stream.with_memory(bytes, |s| s.read_le())
}

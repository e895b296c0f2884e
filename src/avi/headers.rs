//! AVI header chunks: `avih`, `strh`, `strf`, `strn` and the OpenDML `dmlh`.
//!
//! All fields are little-endian.
//! See: <https://learn.microsoft.com/en-us/windows/win32/directshow/avi-riff-file-reference>

use binrw::binrw;

use crate::{
    support::{latin1, to_latin1},
    ByteStream,
    ContainerError,
    FourCC,
};

use super::riff::RiffChunk;

/// `avih` flag: the file has an `idx1` index.
pub const AVIF_HASINDEX: u32 = 0x10;
pub const AVIF_ISINTERLEAVED: u32 = 0x100;
pub const AVIF_TRUSTCKTYPE: u32 = 0x800;

/// `WAVEFORMATEX` format tag for integer PCM.
pub const WAVE_FORMAT_PCM: u16 = 1;

/// Size of the `dmlh` payload. Only the first field is used,
/// the rest is reserved.
pub const DMLH_LENGTH: usize = 248;

/// Main AVI header (`avih`), 56 bytes.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MainHeader {
    pub micro_sec_per_frame: u32,
    pub max_bytes_per_sec: u32,
    pub padding_granularity: u32,
    pub flags: u32,
    /// Frames in the first `RIFF` segment only.
    /// See `Dmlh` for the total count.
    pub total_frames: u32,
    pub initial_frames: u32,
    pub streams: u32,
    pub suggested_buffer_size: u32,
    pub width: u32,
    pub height: u32,
    pub reserved: [u32; 4],
}

/// Stream header (`strh`), 56 bytes.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamHeader {
    /// `vids`, `auds`, `txts`, ...
    pub fcc_type: FourCC,
    /// Codec identifier.
    pub fcc_handler: FourCC,
    pub flags: u32,
    pub priority: u16,
    pub language: u16,
    pub initial_frames: u32,
    /// `rate / scale` is samples per second.
    pub scale: u32,
    pub rate: u32,
    pub start: u32,
    /// Stream length in samples.
    pub length: u32,
    pub suggested_buffer_size: u32,
    pub quality: u32,
    /// 0 if samples vary in size, in which case
    /// each chunk holds exactly one sample.
    pub sample_size: u32,
    /// Destination rectangle: left, top, right, bottom.
    pub frame: [i16; 4],
}

impl StreamHeader {
    pub const LENGTH: u64 = 56;

    pub fn is_video(&self) -> bool {
        self.fcc_type == FourCC::Vids
    }

    pub fn is_audio(&self) -> bool {
        self.fcc_type == FourCC::Auds
    }

    /// Number of samples held by a chunk of `size` bytes.
    pub fn samples_in(&self, size: u32) -> u32 {
        match self.sample_size {
            0 => 1,
            s => size / s,
        }
    }
}

/// `BITMAPINFOHEADER`, 40 bytes.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BitmapInfoHeader {
    pub size: u32,
    pub width: i32,
    /// Positive for bottom-up RGB.
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: FourCC,
    pub size_image: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub clr_used: u32,
    pub clr_important: u32,
}

impl BitmapInfoHeader {
    pub const LENGTH: u64 = 40;
}

/// `WAVEFORMATEX` without the trailing `cbSize`, 16 bytes.
#[binrw]
#[brw(little)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveFormatEx {
    pub format_tag: u16,
    pub channels: u16,
    pub samples_per_sec: u32,
    pub avg_bytes_per_sec: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WaveFormatEx {
    pub const LENGTH: u64 = 16;

    pub fn pcm(channels: u16, sample_rate: u32, bits: u16) -> Self {
        let block_align = channels * bits.div_ceil(8);
        Self {
            format_tag: WAVE_FORMAT_PCM,
            channels,
            samples_per_sec: sample_rate,
            avg_bytes_per_sec: sample_rate * block_align as u32,
            block_align,
            bits_per_sample: bits,
        }
    }
}

/// Stream format (`strf`). The layout depends on the stream type.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFormat {
    Video {
        header: BitmapInfoHeader,
        /// Codec private data following the header.
        extra: Vec<u8>,
    },
    Audio {
        format: WaveFormatEx,
        /// Bytes announced by `cbSize`.
        extra: Vec<u8>,
    },
    Other(Vec<u8>),
}

impl StreamFormat {
    pub fn read(stream: &mut ByteStream, chunk: &RiffChunk, fcc_type: &FourCC) -> Result<Self, ContainerError> {
        let size = chunk.data_size();
        let format = match fcc_type {
            FourCC::Vids if size >= BitmapInfoHeader::LENGTH => {
                let header: BitmapInfoHeader = stream.read_le()?;
                let extra = stream.read_fixed_bytes(size - BitmapInfoHeader::LENGTH)?;
                Self::Video{header, extra}
            },
            FourCC::Auds if size >= WaveFormatEx::LENGTH => {
                let format: WaveFormatEx = stream.read_le()?;
                let extra = match size >= WaveFormatEx::LENGTH + 2 {
                    true => {
                        let cb_size = stream.read_u16_le()? as u64;
                        let available = size - WaveFormatEx::LENGTH - 2;
                        if cb_size > available {
                            stream.log.warn(format_args!(
                                "'strf' @ {} announces {cb_size} extra bytes, {available} present",
                                chunk.start
                            ));
                        }
                        stream.read_fixed_bytes(cb_size.min(available))?
                    },
                    false => Vec::new(),
                };
                Self::Audio{format, extra}
            },
            _ => Self::Other(stream.read_fixed_bytes(size)?),
        };
        Ok(format)
    }

    pub fn write(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        match self {
            Self::Video{header, extra} => {
                stream.write_le(header)?;
                stream.write_fixed_bytes(extra)
            },
            Self::Audio{format, extra} => {
                stream.write_le(format)?;
                stream.write_u16_le(u16::try_from(extra.len())?)?;
                stream.write_fixed_bytes(extra)
            },
            Self::Other(data) => stream.write_fixed_bytes(data),
        }
    }
}

/// Stream name (`strn`), null terminated.
pub fn read_strn(stream: &mut ByteStream, chunk: &RiffChunk) -> Result<String, ContainerError> {
    let bytes = stream.read_fixed_bytes(chunk.data_size())?;
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    Ok(latin1(&bytes[.. end]))
}

pub fn write_strn(stream: &mut ByteStream, name: &str) -> Result<(), ContainerError> {
    stream.write_fixed_bytes(&to_latin1(name))?;
    stream.write_u8(0)
}

/// OpenDML extended header (`odml/dmlh`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Dmlh {
    /// Frames across all `RIFF` segments.
    pub total_frames: u32,
}

impl Dmlh {
    pub fn read(stream: &mut ByteStream, chunk: &RiffChunk) -> Result<Self, ContainerError> {
        if chunk.data_size() < 4 {
            return Err(ContainerError::MalformedAtomGraph{
                tag: chunk.tag,
                offset: chunk.start,
                reason: format!("{} bytes, expected at least 4", chunk.data_size())
            })
        }
        Ok(Self{total_frames: stream.read_u32_le()?})
    }

    pub fn write(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        stream.write_u32_le(self.total_frames)?;
        stream.write_fixed_bytes(&[0; DMLH_LENGTH - 4])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_sizes() {
        let mut stream = ByteStream::memory(Vec::new());
        stream.write_le(&MainHeader::default()).unwrap();
        assert_eq!(stream.position(), 56);
        stream.write_le(&StreamHeader::default()).unwrap();
        assert_eq!(stream.position(), 56 + StreamHeader::LENGTH);
        stream.write_le(&BitmapInfoHeader::default()).unwrap();
        assert_eq!(stream.position(), 56 + StreamHeader::LENGTH + BitmapInfoHeader::LENGTH);
    }

    #[test]
    fn short_pcm_strf() {
        // 16-byte PCMWAVEFORMAT without cbSize
        let mut stream = ByteStream::memory(Vec::new());
        let chunk = RiffChunk::write_header(&mut stream, FourCC::Strf).unwrap()
            .finish(&mut stream, |s| s.write_le(&WaveFormatEx::pcm(2, 44100, 16)))
            .unwrap();
        stream.seek_to(chunk.data_offset()).unwrap();
        let format = StreamFormat::read(&mut stream, &chunk, &FourCC::Auds).unwrap();
        let StreamFormat::Audio{format, extra} = format else {
            panic!("expected audio format")
        };
        assert_eq!(format.block_align, 4);
        assert_eq!(format.avg_bytes_per_sec, 176400);
        assert!(extra.is_empty());
    }

    #[test]
    fn samples_per_chunk() {
        let mut strh = StreamHeader::default();
        assert_eq!(strh.samples_in(1234), 1);
        strh.sample_size = 4;
        assert_eq!(strh.samples_in(4096), 1024);
    }
}

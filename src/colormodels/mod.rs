//! Pixel format conversion.
//!
//! Converts whole frames between the pixel layouts in [`ColorModel`],
//! optionally cropping and scaling (nearest neighbour) on the way.
//!
//! ```ignore
//! let src = FrameBuffer::new(ColorModel::Rgb888, 320, 240);
//! let mut dst = FrameBuffer::new(ColorModel::Yuv420P, 160, 120);
//! transfer(&mut dst.dest(), &src.source(), Rect::full(320, 240), 160, 120);
//! ```
//!
//! The scan-line driver is chosen by the source layout only,
//! the per-pixel function by the `(source, destination)` pair.
//! Pairs without a transfer function, i.e. anything involving
//! [`ColorModel::Compressed`], panic.

mod pixel;
mod formats;
mod permutation;
mod scale;
mod scanline;
mod frame;

pub use frame::{FrameBuffer, SourceFrame, DestFrame, Rect};
pub use pixel::YuvRange;
pub use scale::ScaleTables;
pub use scanline::{transfer, convert, Driver};

use std::fmt;

/// Pixel layouts.
///
/// Samples wider than 8 bits are stored as native-endian `u16`,
/// except in [`ColorModel::Yuv101010`], which packs three 10-bit
/// samples into one big-endian 32-bit word.
/// Plain YUV layouts are full range, `Yuvj*` layouts studio range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorModel {
    // Packed RGB
    /// 16-bit native-endian word, red in the high bits.
    Rgb565,
    /// 16-bit native-endian word, blue in the high bits.
    Bgr565,
    Bgr888,
    /// B, G, R, unused byte.
    Bgr8888,
    Rgb888,
    Rgba8888,
    Rgb161616,
    Rgba16161616,

    // Packed YUV
    Yuv888,
    Yuva8888,
    Yuv161616,
    Yuva16161616,
    /// Big-endian word `Y << 22 | U << 12 | V << 2`.
    Yuv101010,
    /// V, Y, U (`v308`).
    Vyu888,
    /// U, Y, V, A (`v408`).
    Uyva8888,
    /// Packed 4:2:2, Y0 U Y1 V (`yuv2`/`yuvs`).
    Yuv422,

    // Planar YUV
    Yuv420P,
    Yuv422P,
    Yuv444P,
    Yuv411P,
    Yuvj420P,
    Yuvj422P,
    Yuvj444P,
    Yuv422P16,
    Yuv444P16,
    Yuv420P10,
    Yuv422P10,

    /// Compressed data, no pixel layout.
    Compressed,
}

impl fmt::Display for ColorModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl ColorModel {
    /// All layouts with a pixel representation.
    pub const ALL: [ColorModel; 27] = [
        Self::Rgb565, Self::Bgr565, Self::Bgr888, Self::Bgr8888,
        Self::Rgb888, Self::Rgba8888, Self::Rgb161616, Self::Rgba16161616,
        Self::Yuv888, Self::Yuva8888, Self::Yuv161616, Self::Yuva16161616,
        Self::Yuv101010, Self::Vyu888, Self::Uyva8888, Self::Yuv422,
        Self::Yuv420P, Self::Yuv422P, Self::Yuv444P, Self::Yuv411P,
        Self::Yuvj420P, Self::Yuvj422P, Self::Yuvj444P,
        Self::Yuv422P16, Self::Yuv444P16, Self::Yuv420P10, Self::Yuv422P10,
    ];

    /// Bytes per pixel for packed layouts. For planar layouts
    /// this is the size of one sample in one plane.
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb565 | Self::Bgr565 | Self::Yuv422 => 2,
            Self::Bgr888 | Self::Rgb888 | Self::Yuv888 | Self::Vyu888 => 3,
            Self::Bgr8888 | Self::Rgba8888 | Self::Yuva8888
                | Self::Uyva8888 | Self::Yuv101010 => 4,
            Self::Rgb161616 | Self::Yuv161616 => 6,
            Self::Rgba16161616 | Self::Yuva16161616 => 8,
            Self::Compressed => 0,
            planar => planar.sample_bytes(),
        }
    }

    /// Bytes per sample: 2 for layouts wider than 8 bits per sample.
    pub fn sample_bytes(&self) -> usize {
        match self {
            Self::Rgb161616 | Self::Rgba16161616 | Self::Yuv161616 | Self::Yuva16161616
                | Self::Yuv422P16 | Self::Yuv444P16
                | Self::Yuv420P10 | Self::Yuv422P10 => 2,
            Self::Compressed => 0,
            _ => 1,
        }
    }

    /// Bits per sample.
    pub fn depth(&self) -> u32 {
        match self {
            Self::Yuv101010 | Self::Yuv420P10 | Self::Yuv422P10 => 10,
            m if m.sample_bytes() == 2 => 16,
            _ => 8,
        }
    }

    /// Three separate planes.
    pub fn is_planar(&self) -> bool {
        matches!(self,
            Self::Yuv420P | Self::Yuv422P | Self::Yuv444P | Self::Yuv411P
            | Self::Yuvj420P | Self::Yuvj422P | Self::Yuvj444P
            | Self::Yuv422P16 | Self::Yuv444P16 | Self::Yuv420P10 | Self::Yuv422P10
        )
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self,
            Self::Rgba8888 | Self::Rgba16161616 | Self::Yuva8888
            | Self::Yuva16161616 | Self::Uyva8888
        )
    }

    pub fn is_yuv(&self) -> bool {
        !matches!(self,
            Self::Rgb565 | Self::Bgr565 | Self::Bgr888 | Self::Bgr8888
            | Self::Rgb888 | Self::Rgba8888 | Self::Rgb161616 | Self::Rgba16161616
            | Self::Compressed
        )
    }

    /// Value range of YUV layouts, `None` for RGB.
    pub fn range(&self) -> Option<YuvRange> {
        match self {
            Self::Yuvj420P | Self::Yuvj422P | Self::Yuvj444P => Some(YuvRange::Studio),
            m if m.is_yuv() => Some(YuvRange::Full),
            _ => None,
        }
    }

    /// Chroma subsampling as `(HORIZONTAL_SHIFT, VERTICAL_SHIFT)`,
    /// i.e. chroma index = luma index >> shift.
    pub fn chroma_shift(&self) -> (u32, u32) {
        match self {
            Self::Yuv420P | Self::Yuvj420P | Self::Yuv420P10 => (1, 1),
            Self::Yuv422P | Self::Yuvj422P | Self::Yuv422P16
                | Self::Yuv422P10 | Self::Yuv422 => (1, 0),
            Self::Yuv411P => (2, 0),
            _ => (0, 0),
        }
    }

    /// `true` if a transfer function exists for `src` to `dst`.
    pub fn can_transfer(src: ColorModel, dst: ColorModel) -> bool {
        permutation::lookup(src, dst).is_some()
    }
}

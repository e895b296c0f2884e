//! Per-layout sample access. Each layout is a zero-sized marker
//! type, so that transfer functions can be instantiated per pair.

use super::pixel::{expand_bits, narrow, narrow8, widen, widen8, Family, Pixel, YuvRange};

/// Interleaved layouts: one pixel is a fixed number of bytes.
pub(crate) trait PackedPixel {
    const BYTES: usize;
    const ALPHA: bool;
    /// Bits per sample.
    const DEPTH: u32;
    const FAMILY: Family;

    fn load(src: &[u8]) -> Pixel;
    fn store(p: Pixel, dst: &mut [u8]);
}

/// Layouts accessed per sample triplet: planar YUV, and
/// packed 4:2:2 where chroma is shared by two pixels.
pub(crate) trait PlanarPixel {
    const DEPTH: u32;
    const RANGE: YuvRange;
    const HSHIFT: u32;
    const VSHIFT: u32;

    /// Samples at `DEPTH` bits to 16 bits.
    fn widen(s: [u16; 3]) -> [u16; 3] {
        s.map(|v| widen(v, Self::DEPTH))
    }

    /// 16-bit samples to `DEPTH` bits.
    fn narrow(s: [u16; 3]) -> [u16; 3] {
        s.map(|v| narrow(v, Self::DEPTH))
    }
}

fn load16(src: &[u8], i: usize) -> u16 {
    u16::from_ne_bytes([src[2 * i], src[2 * i + 1]])
}

fn store16(dst: &mut [u8], i: usize, v: u16) {
    dst[2 * i .. 2 * i + 2].copy_from_slice(&v.to_ne_bytes());
}

/// 8-bit layouts: byte index of each of the three samples
/// (R, G, B or Y, U, V) and optionally of alpha.
macro_rules! packed8 {
    ($name:ident, $bytes:expr, [$c0:expr, $c1:expr, $c2:expr], $alpha:expr, $family:expr) => {
        pub(crate) struct $name;

        impl $name {
            const ALPHA_AT: Option<usize> = $alpha;
        }

        impl PackedPixel for $name {
            const BYTES: usize = $bytes;
            const ALPHA: bool = Self::ALPHA_AT.is_some();
            const DEPTH: u32 = 8;
            const FAMILY: Family = $family;

            fn load(src: &[u8]) -> Pixel {
                Pixel {
                    c: [widen8(src[$c0]), widen8(src[$c1]), widen8(src[$c2])],
                    a: Self::ALPHA_AT.map(|i| widen8(src[i])).unwrap_or(0xffff),
                }
            }

            fn store(p: Pixel, dst: &mut [u8]) {
                dst[$c0] = narrow8(p.c[0]);
                dst[$c1] = narrow8(p.c[1]);
                dst[$c2] = narrow8(p.c[2]);
                if let Some(i) = Self::ALPHA_AT {
                    dst[i] = narrow8(p.a);
                } else if $bytes == 4 {
                    dst[3] = 0;
                }
            }
        }
    };
}

/// 16-bit native-endian layouts, samples in order, alpha last.
macro_rules! packed16 {
    ($name:ident, $alpha:expr, $family:expr) => {
        pub(crate) struct $name;

        impl PackedPixel for $name {
            const BYTES: usize = if $alpha {8} else {6};
            const ALPHA: bool = $alpha;
            const DEPTH: u32 = 16;
            const FAMILY: Family = $family;

            fn load(src: &[u8]) -> Pixel {
                Pixel {
                    c: [load16(src, 0), load16(src, 1), load16(src, 2)],
                    a: if $alpha {load16(src, 3)} else {0xffff},
                }
            }

            fn store(p: Pixel, dst: &mut [u8]) {
                for i in 0 .. 3 {
                    store16(dst, i, p.c[i]);
                }
                if $alpha {
                    store16(dst, 3, p.a);
                }
            }
        }
    };
}

const RGB: Family = Family::Rgb;
const YUV: Family = Family::Yuv(YuvRange::Full);

packed8!(Bgr888, 3, [2, 1, 0], None, RGB);
packed8!(Bgr8888, 4, [2, 1, 0], None, RGB);
packed8!(Rgb888, 3, [0, 1, 2], None, RGB);
packed8!(Rgba8888, 4, [0, 1, 2], Some(3), RGB);
packed8!(Yuv888, 3, [0, 1, 2], None, YUV);
packed8!(Yuva8888, 4, [0, 1, 2], Some(3), YUV);
packed8!(Vyu888, 3, [1, 2, 0], None, YUV);
packed8!(Uyva8888, 4, [1, 0, 2], Some(3), YUV);

packed16!(Rgb161616, false, RGB);
packed16!(Rgba16161616, true, RGB);
packed16!(Yuv161616, false, YUV);
packed16!(Yuva16161616, true, YUV);

/// 5-6-5 bits in a native-endian word, the first sample
/// in the high bits.
macro_rules! packed565 {
    ($name:ident, $hi:expr, $lo:expr) => {
        pub(crate) struct $name;

        impl PackedPixel for $name {
            const BYTES: usize = 2;
            const ALPHA: bool = false;
            const DEPTH: u32 = 8;
            const FAMILY: Family = Family::Rgb;

            fn load(src: &[u8]) -> Pixel {
                let w = load16(src, 0);
                let mut c = [0u16; 3];
                c[$hi] = widen8(expand_bits(w >> 11, 5));
                c[1] = widen8(expand_bits((w >> 5) & 0x3f, 6));
                c[$lo] = widen8(expand_bits(w & 0x1f, 5));
                Pixel::opaque(c)
            }

            fn store(p: Pixel, dst: &mut [u8]) {
                let hi = (narrow8(p.c[$hi]) >> 3) as u16;
                let mid = (narrow8(p.c[1]) >> 2) as u16;
                let lo = (narrow8(p.c[$lo]) >> 3) as u16;
                store16(dst, 0, (hi << 11) | (mid << 5) | lo);
            }
        }
    };
}

packed565!(Rgb565, 0, 2);
packed565!(Bgr565, 2, 0);

/// Three 10-bit samples in a big-endian word.
pub(crate) struct Yuv101010;

impl PackedPixel for Yuv101010 {
    const BYTES: usize = 4;
    const ALPHA: bool = false;
    const DEPTH: u32 = 10;
    const FAMILY: Family = YUV;

    fn load(src: &[u8]) -> Pixel {
        let w = u32::from_be_bytes([src[0], src[1], src[2], src[3]]);
        let s = |shift: u32| widen(((w >> shift) & 0x3ff) as u16, 10);
        Pixel::opaque([s(22), s(12), s(2)])
    }

    fn store(p: Pixel, dst: &mut [u8]) {
        let s = |i: usize| narrow(p.c[i], 10) as u32;
        let w = (s(0) << 22) | (s(1) << 12) | (s(2) << 2);
        dst[.. 4].copy_from_slice(&w.to_be_bytes());
    }
}

macro_rules! planar {
    ($($name:ident: $depth:expr, $range:expr, $hshift:expr, $vshift:expr;)*) => {
        $(
            pub(crate) struct $name;

            impl PlanarPixel for $name {
                const DEPTH: u32 = $depth;
                const RANGE: YuvRange = $range;
                const HSHIFT: u32 = $hshift;
                const VSHIFT: u32 = $vshift;
            }
        )*
    };
}

planar! {
    Yuv420P: 8, YuvRange::Full, 1, 1;
    Yuv422P: 8, YuvRange::Full, 1, 0;
    Yuv444P: 8, YuvRange::Full, 0, 0;
    Yuv411P: 8, YuvRange::Full, 2, 0;
    Yuvj420P: 8, YuvRange::Studio, 1, 1;
    Yuvj422P: 8, YuvRange::Studio, 1, 0;
    Yuvj444P: 8, YuvRange::Studio, 0, 0;
    Yuv422P16: 16, YuvRange::Full, 1, 0;
    Yuv444P16: 16, YuvRange::Full, 0, 0;
    Yuv420P10: 10, YuvRange::Full, 1, 1;
    Yuv422P10: 10, YuvRange::Full, 1, 0;
    // packed 4:2:2, sampled like a planar layout
    Yuv422: 8, YuvRange::Full, 1, 0;
}

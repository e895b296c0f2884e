//! Sample arithmetic shared by all transfer functions.
//!
//! Every conversion goes through 16-bit samples. Narrower samples
//! are widened by bit replication, so that black and white map to
//! 0 and 65535 exactly, and narrowed with rounding. RGB/YUV
//! conversion uses BT.601 coefficients in 16.16 fixed point.

/// YUV value range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YuvRange {
    /// Y, U, V use the whole sample range.
    Full,
    /// Y 16-235, U/V 16-240 (at 8 bits).
    Studio,
}

/// What the three samples of a [`Pixel`] mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Family {
    Rgb,
    Yuv(YuvRange),
}

/// One pixel at 16 bits per sample. `a` is 0xffff
/// for layouts without alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub c: [u16; 3],
    pub a: u16,
}

impl Pixel {
    pub fn opaque(c: [u16; 3]) -> Self {
        Self{c, a: 0xffff}
    }
}

const HALF: i64 = 0x8000;
const STUDIO_BLACK: i64 = 16 * 257;

pub(crate) fn widen8(v: u8) -> u16 {
    ((v as u16) << 8) | v as u16
}

pub(crate) fn narrow8(v: u16) -> u8 {
    ((v as u32 * 255 + 32767) / 65535) as u8
}

/// Widens a `depth`-bit sample to 16 bits.
pub(crate) fn widen(v: u16, depth: u32) -> u16 {
    match depth {
        8 => widen8(v as u8),
        10 => {
            let v = v & 0x3ff;
            (v << 6) | (v >> 4)
        },
        _ => v,
    }
}

/// Narrows a 16-bit sample to `depth` bits, rounding.
pub(crate) fn narrow(v: u16, depth: u32) -> u16 {
    match depth {
        8 => narrow8(v) as u16,
        10 => ((v as u32 * 1023 + 32767) / 65535) as u16,
        _ => v,
    }
}

/// 5 or 6-bit field to 8 bits.
pub(crate) fn expand_bits(v: u16, bits: u32) -> u8 {
    let v = v as u32;
    ((v << (8 - bits)) | (v >> (2 * bits - 8))) as u8
}

fn clamp16(v: i64) -> u16 {
    v.clamp(0, 0xffff) as u16
}

/// Signed fixed point product, rounded.
fn fixed(coeff: i64, v: i64) -> i64 {
    (coeff * v + HALF) >> 16
}

fn div_round(num: i64, den: i64) -> i64 {
    match num < 0 {
        true => (num - den / 2) / den,
        false => (num + den / 2) / den,
    }
}

pub(crate) fn rgb_to_yuv([r, g, b]: [u16; 3]) -> [u16; 3] {
    let (r, g, b) = (r as i64, g as i64, b as i64);
    let y = (19595 * r + 38470 * g + 7471 * b + HALF) >> 16;
    let u = ((-11058 * r - 21710 * g + 32768 * b + HALF) >> 16) + HALF;
    let v = ((32768 * r - 27439 * g - 5329 * b + HALF) >> 16) + HALF;
    [clamp16(y), clamp16(u), clamp16(v)]
}

pub(crate) fn yuv_to_rgb([y, u, v]: [u16; 3]) -> [u16; 3] {
    let (y, u, v) = (y as i64, u as i64 - HALF, v as i64 - HALF);
    let r = y + fixed(91881, v);
    let g = y + fixed(-22554, u) + fixed(-46802, v);
    let b = y + fixed(116130, u);
    [clamp16(r), clamp16(g), clamp16(b)]
}

pub(crate) fn full_to_studio([y, u, v]: [u16; 3]) -> [u16; 3] {
    let luma = |s: u16| div_round(s as i64 * 219, 255) + STUDIO_BLACK;
    let chroma = |s: u16| div_round((s as i64 - HALF) * 224, 255) + HALF;
    [clamp16(luma(y)), clamp16(chroma(u)), clamp16(chroma(v))]
}

pub(crate) fn studio_to_full([y, u, v]: [u16; 3]) -> [u16; 3] {
    let luma = |s: u16| div_round((s as i64 - STUDIO_BLACK) * 255, 219);
    let chroma = |s: u16| div_round((s as i64 - HALF) * 255, 224) + HALF;
    [clamp16(luma(y)), clamp16(chroma(u)), clamp16(chroma(v))]
}

/// Converts the samples of `c` from one family to another.
pub(crate) fn convert(c: [u16; 3], from: Family, to: Family) -> [u16; 3] {
    use Family::*;
    use YuvRange::*;
    match (from, to) {
        (a, b) if a == b => c,
        (Rgb, Yuv(Full)) => rgb_to_yuv(c),
        (Rgb, Yuv(Studio)) => full_to_studio(rgb_to_yuv(c)),
        (Yuv(Full), Rgb) => yuv_to_rgb(c),
        (Yuv(Studio), Rgb) => yuv_to_rgb(studio_to_full(c)),
        (Yuv(Full), Yuv(Studio)) => full_to_studio(c),
        (Yuv(Studio), Yuv(Full)) => studio_to_full(c),
        _ => c,
    }
}

/// Black in `family`, at 16 bits.
fn black(family: Family) -> [u16; 3] {
    match family {
        Family::Rgb => [0, 0, 0],
        Family::Yuv(YuvRange::Full) => [0, 0x8000, 0x8000],
        Family::Yuv(YuvRange::Studio) => [STUDIO_BLACK as u16, 0x8000, 0x8000],
    }
}

/// Composites `p` onto black: `c' = black + (c - black) * a / max`.
/// 8-bit layouts are composited at 8 bits, `c * a / 255` for RGB.
pub(crate) fn premultiply(p: Pixel, family: Family, depth: u32) -> [u16; 3] {
    let black = black(family);
    let mut out = [0u16; 3];
    match depth {
        8 => {
            let a = (p.a >> 8) as i64;
            for i in 0 .. 3 {
                let c = narrow8(p.c[i]) as i64;
                let k = narrow8(black[i]) as i64;
                out[i] = widen8((k + (c - k) * a / 255) as u8);
            }
        },
        _ => {
            let a = p.a as i64;
            for i in 0 .. 3 {
                let c = p.c[i] as i64;
                let k = black[i] as i64;
                out[i] = clamp16(k + (c - k) * a / 0xffff);
            }
        }
    }
    out
}

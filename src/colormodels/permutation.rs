//! Transfer table: one conversion function per
//! `(source, destination)` layout pair.
//!
//! Functions are generic over the layout marker types and the
//! table is expanded from two layout lists, packed and planar,
//! into every pairing of the two.

use super::{
    formats::*,
    pixel::{convert, premultiply, Family, Pixel},
    ColorModel,
};

/// Per-pixel conversion. Planar samples are passed at the
/// depth of their layout.
#[derive(Clone, Copy)]
pub(crate) enum Transfer {
    /// Packed pixel to packed pixel.
    Packed(fn(&[u8], &mut [u8])),
    /// Packed pixel to Y, U, V samples.
    PackedToPlanar(fn(&[u8]) -> [u16; 3]),
    /// Y, U, V samples to packed pixel.
    PlanarToPacked(fn([u16; 3], &mut [u8])),
    PlanarToPlanar(fn([u16; 3]) -> [u16; 3]),
}

/// Loads a packed pixel, composited onto black if the
/// destination has no alpha.
fn load_packed<S: PackedPixel>(src: &[u8], keep_alpha: bool) -> Pixel {
    let p = S::load(src);
    match S::ALPHA && !keep_alpha {
        true => Pixel::opaque(premultiply(p, S::FAMILY, S::DEPTH)),
        false => p,
    }
}

fn packed<S: PackedPixel, D: PackedPixel>(src: &[u8], dst: &mut [u8]) {
    let p = load_packed::<S>(src, D::ALPHA);
    let c = convert(p.c, S::FAMILY, D::FAMILY);
    D::store(Pixel{c, a: p.a}, dst)
}

fn packed_to_planar<S: PackedPixel, D: PlanarPixel>(src: &[u8]) -> [u16; 3] {
    let p = load_packed::<S>(src, false);
    D::narrow(convert(p.c, S::FAMILY, Family::Yuv(D::RANGE)))
}

fn planar_to_packed<S: PlanarPixel, D: PackedPixel>(yuv: [u16; 3], dst: &mut [u8]) {
    let c = convert(S::widen(yuv), Family::Yuv(S::RANGE), D::FAMILY);
    D::store(Pixel::opaque(c), dst)
}

fn planar<S: PlanarPixel, D: PlanarPixel>(yuv: [u16; 3]) -> [u16; 3] {
    D::narrow(convert(S::widen(yuv), Family::Yuv(S::RANGE), Family::Yuv(D::RANGE)))
}

macro_rules! transfer_table {
    (packed = $packed:tt, planar = $planar:tt $(,)?) => {
        transfer_table!(@expand $packed $packed $planar $planar);
    };

    (@expand [$($p:ident),*] $packed:tt [$($q:ident),*] $planar:tt) => {
        /// Transfer function for `src` to `dst`, if any.
        pub(crate) fn lookup(src: ColorModel, dst: ColorModel) -> Option<Transfer> {
            match src {
                $(ColorModel::$p => transfer_table!(@from_packed $p, dst, $packed, $planar),)*
                $(ColorModel::$q => transfer_table!(@from_planar $q, dst, $packed, $planar),)*
                _ => None,
            }
        }
    };

    (@from_packed $s:ident, $dst:ident, [$($p:ident),*], [$($q:ident),*]) => {
        match $dst {
            $(ColorModel::$p => Some(Transfer::Packed(packed::<$s, $p>)),)*
            $(ColorModel::$q => Some(Transfer::PackedToPlanar(packed_to_planar::<$s, $q>)),)*
            _ => None,
        }
    };

    (@from_planar $s:ident, $dst:ident, [$($p:ident),*], [$($q:ident),*]) => {
        match $dst {
            $(ColorModel::$p => Some(Transfer::PlanarToPacked(planar_to_packed::<$s, $p>)),)*
            $(ColorModel::$q => Some(Transfer::PlanarToPlanar(planar::<$s, $q>)),)*
            _ => None,
        }
    };
}

transfer_table! {
    packed = [
        Rgb565, Bgr565, Bgr888, Bgr8888, Rgb888, Rgba8888, Rgb161616, Rgba16161616,
        Yuv888, Yuva8888, Yuv161616, Yuva16161616, Yuv101010, Vyu888, Uyva8888
    ],
    planar = [
        Yuv422,
        Yuv420P, Yuv422P, Yuv444P, Yuv411P, Yuvj420P, Yuvj422P, Yuvj444P,
        Yuv422P16, Yuv444P16, Yuv420P10, Yuv422P10
    ],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_layout_pair_has_a_transfer() {
        for src in ColorModel::ALL {
            for dst in ColorModel::ALL {
                assert!(lookup(src, dst).is_some(), "{src} -> {dst}");
            }
        }
    }

    #[test]
    fn compressed_has_no_transfer() {
        assert!(lookup(ColorModel::Compressed, ColorModel::Rgb888).is_none());
        assert!(lookup(ColorModel::Rgb888, ColorModel::Compressed).is_none());
    }

    #[test]
    fn rgba_to_rgb_composites_onto_black() {
        let Some(Transfer::Packed(f)) = lookup(ColorModel::Rgba8888, ColorModel::Rgb888) else {
            panic!("expected packed transfer")
        };
        let mut out = [0xaa; 3];
        f(&[200, 100, 50, 0], &mut out);
        assert_eq!(out, [0, 0, 0]);
        f(&[200, 100, 50, 255], &mut out);
        assert_eq!(out, [200, 100, 50]);
        f(&[200, 100, 50, 128], &mut out);
        assert_eq!(out.map(u32::from), [200u32 * 128 / 255, 100 * 128 / 255, 50 * 128 / 255]);
    }

    #[test]
    fn missing_alpha_is_opaque() {
        let Some(Transfer::Packed(f)) = lookup(ColorModel::Rgb888, ColorModel::Rgba16161616) else {
            panic!("expected packed transfer")
        };
        let mut out = [0u8; 8];
        f(&[255, 0, 10], &mut out);
        assert_eq!(u16::from_ne_bytes([out[0], out[1]]), 0xffff);
        assert_eq!(u16::from_ne_bytes([out[4], out[5]]), 10 * 257);
        assert_eq!(u16::from_ne_bytes([out[6], out[7]]), 0xffff);
    }

    #[test]
    fn studio_range_black_and_white() {
        let Some(Transfer::PackedToPlanar(f)) = lookup(ColorModel::Rgb888, ColorModel::Yuvj444P) else {
            panic!("expected packed to planar transfer")
        };
        assert_eq!(f(&[0, 0, 0]), [16, 128, 128]);
        assert_eq!(f(&[255, 255, 255]), [235, 128, 128]);

        let Some(Transfer::PackedToPlanar(f)) = lookup(ColorModel::Rgb888, ColorModel::Yuv444P) else {
            panic!("expected packed to planar transfer")
        };
        assert_eq!(f(&[0, 0, 0]), [0, 128, 128]);
        assert_eq!(f(&[255, 255, 255]), [255, 128, 128]);
    }
}

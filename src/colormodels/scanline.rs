//! Scan-line drivers: walk the output frame row by row, resolve
//! source coordinates through the scale tables, and run the
//! transfer function for each pixel.

use super::{
    frame::{DestFrame, Rect, SourceFrame},
    permutation::{self, Transfer},
    scale::ScaleTables,
    ColorModel,
};

/// Loop shape. Chosen by the source layout alone, the destination
/// only decides which transfer function runs inside the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    /// Packed pixels, plane 0 only.
    Default,
    /// Planar with halved chroma columns, and rows for 4:2:0.
    /// Also runs the 4:2:2 planar, studio range and
    /// 10/16-bit variants.
    Yuv420P,
    Yuv411P,
    Yuv444P,
    /// Packed 4:2:2, chroma shared by pixel pairs.
    Yuv422,
}

impl Driver {
    pub fn for_source(model: ColorModel) -> Self {
        match model {
            ColorModel::Yuv420P
            | ColorModel::Yuv422P
            | ColorModel::Yuvj420P
            | ColorModel::Yuvj422P
            | ColorModel::Yuv420P10
            | ColorModel::Yuv422P10
            | ColorModel::Yuv422P16 => Self::Yuv420P,
            ColorModel::Yuv411P => Self::Yuv411P,
            ColorModel::Yuv444P
            | ColorModel::Yuvj444P
            | ColorModel::Yuv444P16 => Self::Yuv444P,
            ColorModel::Yuv422 => Self::Yuv422,
            _ => Self::Default,
        }
    }

    fn is_planar(&self) -> bool {
        matches!(self, Self::Yuv420P | Self::Yuv411P | Self::Yuv444P)
    }
}

/// One source pixel, as the transfer function expects it.
#[derive(Clone, Copy)]
enum Texel<'s> {
    Packed(&'s [u8]),
    Samples([u16; 3]),
}

fn load_sample(row: &[u8], index: usize, bytes: usize) -> u16 {
    match bytes {
        2 => u16::from_ne_bytes([row[2 * index], row[2 * index + 1]]),
        _ => row[index] as u16,
    }
}

fn store_sample(row: &mut [u8], index: usize, bytes: usize, value: u16) {
    match bytes {
        2 => row[2 * index .. 2 * index + 2].copy_from_slice(&value.to_ne_bytes()),
        _ => row[index] = value as u8,
    }
}

/// Writes Y, U, V for output column `j`. Chroma is only written
/// for the first column of each subsampled group.
fn store_samples(
    model: ColorModel,
    samples: [u16; 3],
    j: usize,
    luma: &mut [u8],
    chroma: &mut Option<(&mut [u8], &mut [u8])>,
) {
    if model == ColorModel::Yuv422 {
        luma[j * 2] = samples[0] as u8;
        if j & 1 == 0 {
            luma[j * 2 + 1] = samples[1] as u8;
            luma[j * 2 + 3] = samples[2] as u8;
        }
        return
    }

    let bytes = model.sample_bytes();
    store_sample(luma, j, bytes, samples[0]);
    let (hshift, _) = model.chroma_shift();
    if let Some((u, v)) = chroma {
        if j & ((1 << hshift) - 1) == 0 {
            store_sample(u, j >> hshift, bytes, samples[1]);
            store_sample(v, j >> hshift, bytes, samples[2]);
        }
    }
}

/// Converts the `rect` region of `src` into the top-left
/// `out_w` x `out_h` pixels of `dst`, nearest-neighbour scaled.
///
/// Source columns go through the column table only if the width
/// changes or the crop starts right of column 0. Rows always go
/// through the row table.
///
/// # Panics
/// If no transfer function exists for the two layouts,
/// see [`ColorModel::can_transfer`], or if a plane is too
/// small for the given geometry.
pub fn transfer(
    dst: &mut DestFrame<'_>,
    src: &SourceFrame<'_>,
    rect: Rect,
    out_w: u32,
    out_h: u32,
) {
    let function = match permutation::lookup(src.model, dst.model) {
        Some(f) => f,
        None => panic!("unsupported colormodel pair {} -> {}", src.model, dst.model),
    };

    let tables = ScaleTables::new(rect.x, rect.y, rect.w, rect.h, out_w, out_h);
    let scale = rect.scales_columns(out_w);
    let driver = Driver::for_source(src.model);

    // packed pixel size, or sample size for planar layouts
    let in_size = src.model.bytes_per_pixel();
    let out_size = dst.model.bytes_per_pixel();
    let (src_hshift, src_vshift) = src.model.chroma_shift();
    let (_, dst_vshift) = dst.model.chroma_shift();
    let dst_model = dst.model;
    let dst_strides = dst.strides;

    let [out_luma, out_u, out_v] = &mut dst.planes;

    for (i, &row) in tables.row_table.iter().take(out_h as usize).enumerate() {
        let y_row = &src.planes[0][row * src.strides[0] ..];
        let (u_row, v_row) = match driver.is_planar() {
            true => {
                let c = row >> src_vshift;
                (&src.planes[1][c * src.strides[1] ..], &src.planes[2][c * src.strides[2] ..])
            },
            false => (&[][..], &[][..]),
        };

        let luma = &mut out_luma[i * dst_strides[0] ..];
        let mut chroma = match dst_model.is_planar() && i & ((1 << dst_vshift) - 1) == 0 {
            true => {
                let c = i >> dst_vshift;
                Some((&mut out_u[c * dst_strides[1] ..], &mut out_v[c * dst_strides[2] ..]))
            },
            false => None,
        };

        for j in 0 .. out_w as usize {
            let col = match scale {
                true => tables.column_table[j],
                false => j,
            };

            let texel = match driver {
                Driver::Default => Texel::Packed(&y_row[col * in_size .. (col + 1) * in_size]),
                Driver::Yuv422 => {
                    let pair = (col & !1) * 2;
                    Texel::Samples([y_row[col * 2] as u16, y_row[pair + 1] as u16, y_row[pair + 3] as u16])
                },
                Driver::Yuv420P | Driver::Yuv411P | Driver::Yuv444P => {
                    let c = col >> src_hshift;
                    Texel::Samples([
                        load_sample(y_row, col, in_size),
                        load_sample(u_row, c, in_size),
                        load_sample(v_row, c, in_size),
                    ])
                },
            };

            match (function, texel) {
                (Transfer::Packed(f), Texel::Packed(p)) => {
                    f(p, &mut luma[j * out_size .. (j + 1) * out_size])
                },
                (Transfer::PlanarToPacked(f), Texel::Samples(s)) => {
                    f(s, &mut luma[j * out_size .. (j + 1) * out_size])
                },
                (Transfer::PackedToPlanar(f), Texel::Packed(p)) => {
                    store_samples(dst_model, f(p), j, luma, &mut chroma)
                },
                (Transfer::PlanarToPlanar(f), Texel::Samples(s)) => {
                    store_samples(dst_model, f(s), j, luma, &mut chroma)
                },
                _ => unreachable!("{driver:?} driver paired with a mismatched transfer function"),
            }
        }
    }
}

/// Converts all of `src` into all of `dst`, scaling if
/// the two differ in size.
pub fn convert(dst: &mut DestFrame<'_>, src: &SourceFrame<'_>) {
    let (out_w, out_h) = (dst.width, dst.height);
    transfer(dst, src, Rect::full(src.width, src.height), out_w, out_h)
}

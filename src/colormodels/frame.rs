//! Frame views: up to three planes with a line size each.
//! Packed layouts use plane 0 only.

use super::ColorModel;

/// Crop rectangle in source pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self{x, y, w, h}
    }

    /// The whole `width` x `height` frame.
    pub fn full(width: u32, height: u32) -> Self {
        Self{x: 0, y: 0, w: width, h: height}
    }

    /// `true` if output columns are looked up in the column table
    /// rather than read directly. A vertical crop alone does not
    /// trigger the lookup.
    pub fn scales_columns(&self, out_w: u32) -> bool {
        out_w != self.w || self.x != 0
    }
}

/// Read-only frame.
#[derive(Debug, Clone, Copy)]
pub struct SourceFrame<'a> {
    pub model: ColorModel,
    pub width: u32,
    pub height: u32,
    /// Y, U, V for planar layouts, plane 0 only for packed ones.
    pub planes: [&'a [u8]; 3],
    /// Bytes per row, per plane.
    pub strides: [usize; 3],
}

impl<'a> SourceFrame<'a> {
    pub fn packed(model: ColorModel, width: u32, height: u32, data: &'a [u8], stride: usize) -> Self {
        Self {
            model,
            width,
            height,
            planes: [data, &[], &[]],
            strides: [stride, 0, 0],
        }
    }

    pub fn planar(
        model: ColorModel,
        width: u32,
        height: u32,
        planes: [&'a [u8]; 3],
        strides: [usize; 3],
    ) -> Self {
        Self{model, width, height, planes, strides}
    }
}

/// Writable frame.
#[derive(Debug)]
pub struct DestFrame<'a> {
    pub model: ColorModel,
    pub width: u32,
    pub height: u32,
    pub planes: [&'a mut [u8]; 3],
    pub strides: [usize; 3],
}

impl<'a> DestFrame<'a> {
    pub fn packed(model: ColorModel, width: u32, height: u32, data: &'a mut [u8], stride: usize) -> Self {
        Self {
            model,
            width,
            height,
            planes: [data, Default::default(), Default::default()],
            strides: [stride, 0, 0],
        }
    }

    pub fn planar(
        model: ColorModel,
        width: u32,
        height: u32,
        planes: [&'a mut [u8]; 3],
        strides: [usize; 3],
    ) -> Self {
        Self{model, width, height, planes, strides}
    }
}

/// Owned, tightly packed frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    pub model: ColorModel,
    pub width: u32,
    pub height: u32,
    planes: [Vec<u8>; 3],
    strides: [usize; 3],
}

impl FrameBuffer {
    /// Zeroed frame of `width` x `height` pixels.
    pub fn new(model: ColorModel, width: u32, height: u32) -> Self {
        let (w, h) = (width as usize, height as usize);
        let (strides, rows) = match model.is_planar() {
            true => {
                let (hs, vs) = model.chroma_shift();
                let sb = model.sample_bytes();
                let cw = (w + (1 << hs) - 1) >> hs;
                let ch = (h + (1 << vs) - 1) >> vs;
                ([w * sb, cw * sb, cw * sb], [h, ch, ch])
            },
            false => {
                let stride = match model {
                    // chroma is shared by pixel pairs
                    ColorModel::Yuv422 => (w + 1) / 2 * 4,
                    m => w * m.bytes_per_pixel(),
                };
                ([stride, 0, 0], [h, 0, 0])
            }
        };
        let planes = [
            vec![0; strides[0] * rows[0]],
            vec![0; strides[1] * rows[1]],
            vec![0; strides[2] * rows[2]],
        ];
        Self{model, width, height, planes, strides}
    }

    /// Wraps existing packed pixel data, e.g. a decoded sample.
    pub fn from_packed(model: ColorModel, width: u32, height: u32, data: Vec<u8>) -> Self {
        let mut frame = Self::new(model, width, height);
        let n = frame.planes[0].len().min(data.len());
        frame.planes[0][.. n].copy_from_slice(&data[.. n]);
        frame
    }

    pub fn source(&self) -> SourceFrame<'_> {
        SourceFrame {
            model: self.model,
            width: self.width,
            height: self.height,
            planes: [self.planes[0].as_slice(), self.planes[1].as_slice(), self.planes[2].as_slice()],
            strides: self.strides,
        }
    }

    pub fn dest(&mut self) -> DestFrame<'_> {
        let [p0, p1, p2] = &mut self.planes;
        DestFrame {
            model: self.model,
            width: self.width,
            height: self.height,
            planes: [p0.as_mut_slice(), p1.as_mut_slice(), p2.as_mut_slice()],
            strides: self.strides,
        }
    }

    pub fn plane(&self, index: usize) -> &[u8] {
        &self.planes[index]
    }

    pub fn plane_mut(&mut self, index: usize) -> &mut [u8] {
        &mut self.planes[index]
    }

    pub fn stride(&self, index: usize) -> usize {
        self.strides[index]
    }

    /// All planes, concatenated.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.planes.concat()
    }
}

//! Video codec interface, and the uncompressed formats that map
//! directly onto a [`ColorModel`].
//!
//! Decoding and encoding of the uncompressed formats is a copy
//! through the colormodel engine. Compressed formats are not
//! implemented here; [`codec_for`] returns
//! [`ContainerError::UnsupportedCodec`] for them.

use std::collections::HashMap;

use crate::{
    colormodels::{convert, ColorModel, DestFrame, FrameBuffer, SourceFrame},
    ContainerError,
    FourCC,
};

/// Encoder/decoder for one sample description format.
pub trait VideoCodec: Send {
    fn fourcc(&self) -> FourCC;

    /// Pixel layout of decoded frames.
    fn colormodel(&self) -> ColorModel;

    /// Decodes one sample of a `width` x `height` frame into `dst`,
    /// converting to the layout of `dst`.
    fn decode(
        &mut self,
        sample: &[u8],
        width: u32,
        height: u32,
        dst: &mut DestFrame<'_>,
    ) -> Result<(), ContainerError>;

    /// Encodes `src`, converting from its layout first if needed.
    fn encode(&mut self, src: &SourceFrame<'_>) -> Result<Vec<u8>, ContainerError>;

    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), ContainerError>;

    fn parameter(&self, key: &str) -> Option<String>;
}

/// Codec for `fourcc`.
///
/// ```ignore
/// let mut codec = codec_for(FourCC::from_str("v308"))?;
/// assert_eq!(codec.colormodel(), ColorModel::Vyu888);
/// ```
pub fn codec_for(fourcc: FourCC) -> Result<Box<dyn VideoCodec>, ContainerError> {
    let (model, planes) = match &fourcc.to_bytes() {
        b"raw " => (ColorModel::Rgb888, PlaneOrder::Packed),
        b"v308" => (ColorModel::Vyu888, PlaneOrder::Packed),
        b"v408" => (ColorModel::Uyva8888, PlaneOrder::Packed),
        b"yuvs" => (ColorModel::Yuv422, PlaneOrder::Packed),
        b"v410" => (ColorModel::Yuv101010, PlaneOrder::Packed),
        b"I420" => (ColorModel::Yuv420P, PlaneOrder::Yuv),
        b"yv12" => (ColorModel::Yuv420P, PlaneOrder::Yvu),
        _ => return Err(ContainerError::UnsupportedCodec(fourcc)),
    };
    Ok(Box::new(RawCodec{fourcc, model, planes, params: HashMap::new()}))
}

/// `true` if [`codec_for`] has a codec for `fourcc`.
pub fn is_supported(fourcc: FourCC) -> bool {
    codec_for(fourcc).is_ok()
}

/// How planes are laid out in a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaneOrder {
    Packed,
    /// Y, U, V planes back to back.
    Yuv,
    /// Y, V, U planes back to back.
    Yvu,
}

/// Uncompressed video, a sample is one tightly packed frame.
#[derive(Debug)]
struct RawCodec {
    fourcc: FourCC,
    model: ColorModel,
    planes: PlaneOrder,
    params: HashMap<String, String>,
}

impl RawCodec {
    /// Byte ranges of the Y, U, V planes (plane 0 only for packed
    /// layouts) within a sample, and their strides.
    fn layout(&self, width: u32, height: u32) -> ([std::ops::Range<usize>; 3], [usize; 3]) {
        let frame = FrameBuffer::new(self.model, width, height);
        let sizes = [0, 1, 2].map(|i| frame.plane(i).len());
        let strides = [0, 1, 2].map(|i| frame.stride(i));
        let y = 0 .. sizes[0];
        let first = sizes[0] .. sizes[0] + sizes[1];
        let second = sizes[0] + sizes[1] .. sizes[0] + sizes[1] + sizes[2];
        match self.planes {
            PlaneOrder::Packed | PlaneOrder::Yuv => ([y, first, second], strides),
            PlaneOrder::Yvu => ([y, second, first], strides),
        }
    }
}

impl VideoCodec for RawCodec {
    fn fourcc(&self) -> FourCC {
        self.fourcc
    }

    fn colormodel(&self) -> ColorModel {
        self.model
    }

    fn decode(
        &mut self,
        sample: &[u8],
        width: u32,
        height: u32,
        dst: &mut DestFrame<'_>,
    ) -> Result<(), ContainerError> {
        let (ranges, strides) = self.layout(width, height);
        let needed = ranges.iter().map(|r| r.end).max().unwrap_or(0);
        if sample.len() < needed {
            return Err(ContainerError::UnexpectedEof{
                offset: sample.len() as u64,
                wanted: (needed - sample.len()) as u64
            })
        }
        let [y, u, v] = ranges;
        let src = SourceFrame::planar(
            self.model,
            width,
            height,
            [&sample[y], &sample[u], &sample[v]],
            strides,
        );
        convert(dst, &src);
        Ok(())
    }

    fn encode(&mut self, src: &SourceFrame<'_>) -> Result<Vec<u8>, ContainerError> {
        let mut frame = FrameBuffer::new(self.model, src.width, src.height);
        convert(&mut frame.dest(), src);
        let bytes = match self.planes {
            PlaneOrder::Packed | PlaneOrder::Yuv => frame.to_bytes(),
            PlaneOrder::Yvu => [frame.plane(0), frame.plane(2), frame.plane(1)].concat(),
        };
        Ok(bytes)
    }

    /// `depth` selects 24-bit RGB or 32-bit RGBA for `raw `.
    /// Other keys are stored as given.
    fn set_parameter(&mut self, key: &str, value: &str) -> Result<(), ContainerError> {
        if key == "depth" && self.fourcc.is(b"raw ") {
            self.model = match value {
                "24" => ColorModel::Rgb888,
                "32" => ColorModel::Rgba8888,
                _ => return Err(ContainerError::InvalidParameter{
                    key: key.to_owned(),
                    value: value.to_owned()
                }),
            };
        }
        self.params.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn parameter(&self, key: &str) -> Option<String> {
        self.params.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_fourcc() {
        let err = codec_for(FourCC::from_str("avc1")).err();
        assert!(matches!(err, Some(ContainerError::UnsupportedCodec(f)) if f.is(b"avc1")));
    }

    #[test]
    fn raw_depth_parameter() {
        let mut codec = codec_for(FourCC::from_str("raw ")).unwrap();
        assert_eq!(codec.colormodel(), ColorModel::Rgb888);
        codec.set_parameter("depth", "32").unwrap();
        assert_eq!(codec.colormodel(), ColorModel::Rgba8888);
        assert_eq!(codec.parameter("depth").as_deref(), Some("32"));
        assert!(codec.set_parameter("depth", "12").is_err());
    }

    #[test]
    fn yv12_swaps_chroma_planes() {
        let mut codec = codec_for(FourCC::from_str("yv12")).unwrap();
        let mut src = FrameBuffer::new(ColorModel::Yuv420P, 2, 2);
        src.plane_mut(0).copy_from_slice(&[1, 2, 3, 4]);
        src.plane_mut(1)[0] = 100;
        src.plane_mut(2)[0] = 200;
        let sample = codec.encode(&src.source()).unwrap();
        assert_eq!(sample, vec![1, 2, 3, 4, 200, 100]);

        let mut out = FrameBuffer::new(ColorModel::Yuv420P, 2, 2);
        codec.decode(&sample, 2, 2, &mut out.dest()).unwrap();
        assert_eq!(out, src);
    }

    #[test]
    fn short_sample() {
        let mut codec = codec_for(FourCC::from_str("v308")).unwrap();
        let mut out = FrameBuffer::new(ColorModel::Rgb888, 2, 2);
        let res = codec.decode(&[0; 11], 2, 2, &mut out.dest());
        assert!(matches!(res, Err(ContainerError::UnexpectedEof{wanted: 1, ..})));
    }
}

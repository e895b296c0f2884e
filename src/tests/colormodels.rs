use crate::{
    codecs::codec_for,
    colormodels::{convert, transfer, ColorModel, FrameBuffer, Rect, YuvRange},
    FourCC,
};

/// RGB gradient with every channel varying.
fn gradient(width: u32, height: u32) -> FrameBuffer {
    let data = (0 .. height)
        .flat_map(|y| (0 .. width).map(move |x| (x, y)))
        .flat_map(|(x, y)| [
            (x * 255 / (width - 1)) as u8,
            (y * 255 / (height - 1)) as u8,
            ((x + y) * 255 / (width + height - 2)) as u8,
        ])
        .collect();
    FrameBuffer::from_packed(ColorModel::Rgb888, width, height, data)
}

fn numbered(model: ColorModel, width: u32, height: u32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(model, width, height);
    for plane in 0 .. 3 {
        frame.plane_mut(plane)
            .iter_mut()
            .enumerate()
            .for_each(|(i, b)| *b = (i * 7 + plane * 50) as u8);
    }
    frame
}

#[test]
fn rgb_yuv444_round_trip() {
    let src = gradient(16, 16);
    let mut yuv = FrameBuffer::new(ColorModel::Yuv444P, 16, 16);
    convert(&mut yuv.dest(), &src.source());
    let mut back = FrameBuffer::new(ColorModel::Rgb888, 16, 16);
    convert(&mut back.dest(), &yuv.source());

    let worst = src.plane(0).iter()
        .zip(back.plane(0))
        .map(|(a, b)| a.abs_diff(*b))
        .max()
        .unwrap();
    assert!(worst <= 3, "worst channel difference {worst}");
}

#[test]
fn identity_is_exact() {
    let src = gradient(9, 5);
    let mut dst = FrameBuffer::new(ColorModel::Rgb888, 9, 5);
    convert(&mut dst.dest(), &src.source());
    assert_eq!(dst, src);

    let src = numbered(ColorModel::Yuv420P, 6, 4);
    let mut dst = FrameBuffer::new(ColorModel::Yuv420P, 6, 4);
    convert(&mut dst.dest(), &src.source());
    assert_eq!(dst, src);
}

#[test]
fn eight_bit_widening() {
    let data: Vec<u8> = (0 ..= 255u8).flat_map(|v| [v, v, v]).collect();
    let src = FrameBuffer::from_packed(ColorModel::Rgb888, 256, 1, data);
    let mut wide = FrameBuffer::new(ColorModel::Rgb161616, 256, 1);
    convert(&mut wide.dest(), &src.source());

    let red: Vec<u16> = wide.plane(0)
        .chunks(6)
        .map(|px| u16::from_ne_bytes([px[0], px[1]]))
        .collect();
    assert_eq!(red[0], 0);
    assert_eq!(red[255], 0xffff);
    assert!(red.windows(2).all(|w| w[0] < w[1]));
    assert!(red.iter().enumerate().all(|(v, w)| *w == ((v as u16) << 8 | v as u16)));

    // and back without loss
    let mut narrow = FrameBuffer::new(ColorModel::Rgb888, 256, 1);
    convert(&mut narrow.dest(), &wide.source());
    assert_eq!(narrow, src);
}

#[test]
fn upscaled_420_reads_one_chroma_sample_per_block() {
    let src = numbered(ColorModel::Yuv420P, 4, 4);
    assert_eq!(src.stride(1), 2);
    let mut dst = FrameBuffer::new(ColorModel::Yuv444P, 8, 8);
    transfer(&mut dst.dest(), &src.source(), Rect::full(4, 4), 8, 8);

    for y in 0 .. 8 {
        for x in 0 .. 8 {
            let luma = src.plane(0)[(y / 2) * 4 + x / 2];
            assert_eq!(dst.plane(0)[y * 8 + x], luma, "Y at {x},{y}");
            for plane in [1, 2] {
                let chroma = src.plane(plane)[(y / 4) * 2 + x / 4];
                assert_eq!(dst.plane(plane)[y * 8 + x], chroma, "plane {plane} at {x},{y}");
            }
        }
    }
}

#[test]
fn crops() {
    let src = numbered(ColorModel::Rgb888, 4, 4);
    let row = |frame: &FrameBuffer, y: usize, w: usize| frame.plane(0)[y * w * 3 .. (y + 1) * w * 3].to_vec();

    // vertical crop alone keeps source columns as they are
    assert!(!Rect::new(0, 1, 4, 2).scales_columns(4));
    assert!(!Rect::full(4, 4).scales_columns(4));
    assert!(Rect::new(1, 0, 2, 4).scales_columns(2));
    assert!(Rect::new(1, 0, 3, 4).scales_columns(3));
    assert!(Rect::full(4, 4).scales_columns(2));

    let mut dst = FrameBuffer::new(ColorModel::Rgb888, 4, 2);
    transfer(&mut dst.dest(), &src.source(), Rect::new(0, 1, 4, 2), 4, 2);
    assert_eq!(row(&dst, 0, 4), row(&src, 1, 4));
    assert_eq!(row(&dst, 1, 4), row(&src, 2, 4));

    // horizontal crop goes through the column table
    let mut dst = FrameBuffer::new(ColorModel::Rgb888, 2, 4);
    transfer(&mut dst.dest(), &src.source(), Rect::new(1, 0, 2, 4), 2, 4);
    for y in 0 .. 4 {
        assert_eq!(row(&dst, y, 2), row(&src, y, 4)[3 .. 9].to_vec());
    }

    // 2x downscale picks every other pixel
    let mut dst = FrameBuffer::new(ColorModel::Rgb888, 2, 2);
    transfer(&mut dst.dest(), &src.source(), Rect::full(4, 4), 2, 2);
    assert_eq!(&dst.plane(0)[0 .. 3], &src.plane(0)[0 .. 3]);
    assert_eq!(&dst.plane(0)[3 .. 6], &src.plane(0)[6 .. 9]);
    assert_eq!(&dst.plane(0)[6 .. 9], &src.plane(0)[24 .. 27]);
}

#[test]
fn alpha_composites_onto_black() {
    let src = FrameBuffer::from_packed(
        ColorModel::Rgba8888, 3, 1,
        vec![200, 100, 50, 0, 200, 100, 50, 255, 10, 20, 30, 255],
    );
    let mut dst = FrameBuffer::new(ColorModel::Rgb888, 3, 1);
    convert(&mut dst.dest(), &src.source());
    assert_eq!(dst.plane(0), &[0, 0, 0, 200, 100, 50, 10, 20, 30]);
}

#[test]
fn packed_422_to_planar() {
    // Y0 U Y1 V
    let src = FrameBuffer::from_packed(ColorModel::Yuv422, 4, 1, vec![10, 100, 20, 200, 30, 110, 40, 210]);
    let mut dst = FrameBuffer::new(ColorModel::Yuv422P, 4, 1);
    convert(&mut dst.dest(), &src.source());
    assert_eq!(dst.plane(0), &[10, 20, 30, 40]);
    assert_eq!(dst.plane(1), &[100, 110]);
    assert_eq!(dst.plane(2), &[200, 210]);

    let mut back = FrameBuffer::new(ColorModel::Yuv422, 4, 1);
    convert(&mut back.dest(), &dst.source());
    assert_eq!(back, src);
}

#[test]
fn studio_range_layouts() {
    assert_eq!(ColorModel::Yuvj420P.range(), Some(YuvRange::Studio));
    assert_eq!(ColorModel::Yuv420P.range(), Some(YuvRange::Full));
    assert_eq!(ColorModel::Rgb888.range(), None);

    let white = FrameBuffer::from_packed(ColorModel::Rgb888, 2, 2, vec![255; 12]);
    let mut studio = FrameBuffer::new(ColorModel::Yuvj420P, 2, 2);
    convert(&mut studio.dest(), &white.source());
    assert_eq!(studio.plane(0), &[235; 4]);
    assert_eq!((studio.plane(1), studio.plane(2)), (&[128][..], &[128][..]));
}

#[test]
fn ten_bit_planes() {
    let src = FrameBuffer::from_packed(ColorModel::Rgb888, 2, 2, vec![255; 12]);
    let mut dst = FrameBuffer::new(ColorModel::Yuv420P10, 2, 2);
    assert_eq!(dst.stride(0), 4);
    convert(&mut dst.dest(), &src.source());
    let y = u16::from_ne_bytes([dst.plane(0)[0], dst.plane(0)[1]]);
    assert_eq!(y, 1023);
}

#[test]
fn transfer_pairs() {
    assert!(ColorModel::can_transfer(ColorModel::Yuv411P, ColorModel::Bgr8888));
    assert!(!ColorModel::can_transfer(ColorModel::Compressed, ColorModel::Rgb888));
}

#[test]
#[should_panic]
fn compressed_pair_panics() {
    let src = FrameBuffer::new(ColorModel::Rgb888, 2, 2);
    let mut dst = FrameBuffer::new(ColorModel::Compressed, 2, 2);
    convert(&mut dst.dest(), &src.source());
}

#[test]
fn planar_codec_round_trip() {
    let src = gradient(4, 4);
    let mut codec = codec_for(FourCC::from_str("I420")).unwrap();
    assert_eq!(codec.colormodel(), ColorModel::Yuv420P);
    let sample = codec.encode(&src.source()).unwrap();
    assert_eq!(sample.len(), 16 + 4 + 4);

    let mut planar = FrameBuffer::new(ColorModel::Yuv420P, 4, 4);
    codec.decode(&sample, 4, 4, &mut planar.dest()).unwrap();
    assert_eq!(planar.to_bytes(), sample);
}

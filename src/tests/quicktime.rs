use crate::{
    colormodels::{ColorModel, FrameBuffer, SourceFrame},
    consts::MOOV_RETRY_REWIND,
    probe::{Container, ContainerKind},
    quicktime::{QuickTime, ReadOptions},
    writer::{FileType, QuickTimeWriter, WriteOptions},
    ContainerError,
    FourCC,
    LogSink,
};

fn gradient(len: usize) -> Vec<u8> {
    (0 .. len).map(|i| (i * 5 % 256) as u8).collect()
}

fn reopen(qt: QuickTimeWriter) -> QuickTime {
    let bytes = qt.finish().unwrap().into_bytes().unwrap();
    QuickTime::from_bytes(bytes, ReadOptions::default()).unwrap()
}

#[test]
fn raw_video_round_trip() {
    let pixels = gradient(4 * 4 * 3);
    let mut qt = QuickTimeWriter::in_memory(WriteOptions::default()).unwrap();
    let track = qt.add_video_track(4, 4, FourCC::from_str("raw "), 600, 20).unwrap();
    qt.write_frame(track, &SourceFrame::packed(ColorModel::Rgb888, 4, 4, &pixels, 12)).unwrap();

    let mut mov = reopen(qt);
    assert!(mov.ftyp().is_none());
    assert!(!mov.is_compressed());
    assert_eq!(mov.tracks().len(), 1);

    let t = mov.track(0).unwrap().clone();
    assert!(t.is_video());
    assert_eq!((t.width, t.height), (4, 4));
    assert_eq!(t.sample_count, 1);
    assert!(t.codec.is(b"raw "));
    assert_eq!(t.depth, 24);
    assert_eq!(t.time_scale, 600);
    assert_eq!(t.duration_ticks, 20);
    assert_eq!(mov.moov().mvhd.duration, 20);

    assert_eq!(mov.read_sample(0, 0).unwrap(), pixels);

    let mut frame = FrameBuffer::new(ColorModel::Rgb888, 4, 4);
    mov.read_frame(0, 0, &mut frame.dest()).unwrap();
    assert_eq!(frame.plane(0), pixels.as_slice());

    assert!(matches!(mov.read_sample(0, 1), Err(ContainerError::NoSuchSample{track: 0, sample: 1})));
    assert!(matches!(mov.track(1), Err(ContainerError::NoSuchTrack(1))));
}

#[test]
fn frames_are_converted_on_write_and_read() {
    let mut src = FrameBuffer::new(ColorModel::Rgb888, 2, 2);
    src.plane_mut(0).copy_from_slice(&[255, 255, 255, 0, 0, 0, 255, 255, 255, 0, 0, 0]);

    let mut qt = QuickTimeWriter::in_memory(WriteOptions::default()).unwrap();
    let track = qt.add_video_track(2, 2, FourCC::from_str("v308"), 25, 1).unwrap();
    qt.write_frame(track, &src.source()).unwrap();
    let mut mov = reopen(qt);

    // v308 stores V, Y, U
    let sample = mov.read_sample(track, 0).unwrap();
    assert_eq!(sample.len(), 2 * 2 * 3);
    assert_eq!(&sample[0 .. 3], &[128, 255, 128]);
    assert_eq!(&sample[3 .. 6], &[128, 0, 128]);

    // YUV is lossy at 8 bits
    let mut out = FrameBuffer::new(ColorModel::Rgb888, 2, 2);
    mov.read_frame(track, 0, &mut out.dest()).unwrap();
    for (a, b) in out.plane(0).iter().zip(src.plane(0)) {
        assert!(a.abs_diff(*b) <= 1, "{a} != {b}");
    }
}

#[test]
fn compressed_codec_is_unsupported() {
    let mut qt = QuickTimeWriter::in_memory(WriteOptions::default()).unwrap();
    let track = qt.add_video_track(2, 2, FourCC::from_str("avc1"), 25, 1).unwrap();
    let frame = FrameBuffer::new(ColorModel::Rgb888, 2, 2);
    assert!(matches!(
        qt.write_frame(track, &frame.source()),
        Err(ContainerError::UnsupportedCodec(f)) if f.is(b"avc1")
    ));
    // pre-encoded samples are still accepted
    qt.write_sample(track, &[0, 0, 0, 1], 1, true).unwrap();

    let mut mov = reopen(qt);
    let mut out = FrameBuffer::new(ColorModel::Rgb888, 2, 2);
    assert!(matches!(
        mov.read_frame(track, 0, &mut out.dest()),
        Err(ContainerError::UnsupportedCodec(_))
    ));
}

#[test]
fn sync_samples() {
    let mut qt = QuickTimeWriter::in_memory(WriteOptions::default()).unwrap();
    let all_key = qt.add_video_track(2, 2, FourCC::from_str("raw "), 25, 1).unwrap();
    let mixed = qt.add_video_track(2, 2, FourCC::from_str("raw "), 25, 1).unwrap();
    for (i, keyframe) in [true, true, false, true, false].into_iter().enumerate() {
        qt.write_sample(all_key, &[i as u8; 12], 1, true).unwrap();
        qt.write_sample(mixed, &[i as u8; 12], 1, keyframe).unwrap();
    }
    assert!(qt.moov().tracks[all_key].stbl().stss.is_none());

    let mov = reopen(qt);
    let stbl = mov.moov().tracks[mixed].stbl();
    let stss = stbl.stss.as_ref().unwrap();
    assert_eq!(stss.len(), 3);
    assert!(stbl.is_keyframe(0) && stbl.is_keyframe(1) && stbl.is_keyframe(3));
    assert!(!stbl.is_keyframe(2) && !stbl.is_keyframe(4));
    assert_eq!(stss.keyframe_before(4), Some(3));
    assert!(mov.moov().tracks[all_key].stbl().stss.is_none());
}

#[test]
fn sample_offsets() {
    let mut qt = QuickTimeWriter::in_memory(WriteOptions::default()).unwrap();
    let video = qt.add_video_track(2, 2, FourCC::from_str("raw "), 600, 20).unwrap();
    let audio = qt.add_audio_track(1, 8000, 8, FourCC::from_str("raw ")).unwrap();
    qt.write_sample(video, &[1; 12], 20, true).unwrap();
    qt.write_sample(audio, &[2; 5], 5, true).unwrap();
    qt.write_sample(video, &[3; 12], 30, true).unwrap();
    let mut mov = reopen(qt);

    let offsets = mov.sample_offsets(video).unwrap();
    assert_eq!(offsets.len(), 2);
    let (first, second) = (offsets.first().unwrap(), offsets.last().unwrap());
    assert_eq!(second.position - first.position, 12 + 5);
    assert_eq!((first.size, second.size), (12, 12));
    assert_eq!(second.duration_ticks, 30);

    assert_eq!(mov.read_sample(video, 1).unwrap(), vec![3; 12]);
    assert_eq!(mov.read_sample(audio, 0).unwrap(), vec![2; 5]);
    assert!(matches!(mov.sample_offsets(2), Err(ContainerError::NoSuchTrack(2))));
}

#[test]
fn audio_track() {
    let mut qt = QuickTimeWriter::in_memory(WriteOptions::default()).unwrap();
    let stereo = qt.add_audio_track(2, 48000, 16, FourCC::from_str("twos")).unwrap();
    let hires = qt.add_audio_track(1, 96000, 24, FourCC::from_str("in24")).unwrap();
    qt.write_sample(stereo, &[0; 4], 1, true).unwrap();
    qt.write_sample(hires, &[0; 3], 1, true).unwrap();
    let mov = reopen(qt);

    assert_eq!(mov.audio_tracks().count(), 2);
    assert_eq!(mov.video_tracks().count(), 0);
    let t = mov.track(stereo).unwrap();
    assert_eq!((t.channels, t.bits, t.sample_rate), (2, 16, 48000.0));
    assert_eq!(t.time_scale, 48000);
    // too large for the 16.16 field of a version 0 description
    let t = mov.track(hires).unwrap();
    assert_eq!((t.channels, t.bits, t.sample_rate), (1, 24, 96000.0));
}

#[test]
fn metadata() {
    let mut qt = QuickTimeWriter::in_memory(WriteOptions::default()).unwrap();
    qt.add_video_track(2, 2, FourCC::from_str("raw "), 25, 1).unwrap();
    qt.set_name("Test movie");
    qt.set_copyright("nobody");
    qt.set_info("first take");
    qt.set_name("Renamed movie");
    let mov = reopen(qt);

    assert_eq!(mov.name(), Some("Renamed movie"));
    assert_eq!(mov.copyright(), Some("nobody"));
    assert_eq!(mov.info(), Some("first take"));
}

#[test]
fn mp4_file_type() {
    let options = WriteOptions{file_type: FileType::Mp4, ..WriteOptions::default()};
    let mut qt = QuickTimeWriter::in_memory(options).unwrap();
    let track = qt.add_video_track(2, 2, FourCC::from_str("raw "), 25, 1).unwrap();
    qt.write_sample(track, &[0; 12], 1, true).unwrap();
    let mov = reopen(qt);

    let ftyp = mov.ftyp().unwrap();
    assert!(ftyp.major_brand().is(b"isom"));
    assert!(ftyp.compatible_brands().iter().any(|b| b.is(b"mp41")));
    let iods = mov.moov().iods.as_ref().unwrap();
    assert_eq!(iods.track_ids(), &[mov.track(0).unwrap().id]);
    assert_eq!(mov.atoms()[0].tag, FourCC::Ftyp);
}

#[test]
fn forced_64bit_sizes() {
    let options = WriteOptions{force_64bit_sizes: true, ..WriteOptions::default()};
    let mut qt = QuickTimeWriter::in_memory(options).unwrap();
    let track = qt.add_video_track(2, 2, FourCC::from_str("raw "), 25, 1).unwrap();
    qt.write_sample(track, &gradient(12), 1, true).unwrap();
    let mut mov = reopen(qt);

    assert!(mov.atoms().iter().all(|a| a.use_64));
    assert!(mov.moov().tracks[0].stbl().stco.needs_co64());
    assert_eq!(mov.read_sample(0, 0).unwrap(), gradient(12));
}

#[test]
fn wide_placeholder_before_mdat() {
    let mut qt = QuickTimeWriter::in_memory(WriteOptions::default()).unwrap();
    let track = qt.add_video_track(2, 2, FourCC::from_str("raw "), 25, 1).unwrap();
    qt.write_sample(track, &[0; 12], 1, true).unwrap();
    let mov = reopen(qt);

    let tags: Vec<FourCC> = mov.atoms().iter().map(|a| a.tag).collect();
    assert_eq!(tags, vec![FourCC::Mdat, FourCC::Moov]);
    assert_eq!(mov.atoms()[0].start, 8);
    assert_eq!(mov.atoms()[0].size, 8 + 12);
}

#[test]
fn moov_retried_when_the_disk_fills() {
    let sample = vec![0; 3 * MOOV_RETRY_REWIND as usize / 2];
    // 'wide' and 'mdat' headers, then the sample
    let mdat_end = 16 + sample.len() as u64;
    let options = WriteOptions{log: LogSink::Silent, ..WriteOptions::default()};
    let mut qt = QuickTimeWriter::in_memory_limited(options, mdat_end + 64).unwrap();
    let track = qt.add_video_track(2, 2, FourCC::from_str("raw "), 25, 1).unwrap();
    qt.write_sample(track, &sample, 1, true).unwrap();

    let bytes = qt.finish().unwrap().into_bytes().unwrap();
    let mov = QuickTime::from_bytes(bytes, ReadOptions::default()).unwrap();

    let retry_at = mdat_end - MOOV_RETRY_REWIND;
    let mdat = mov.atoms()[0];
    assert_eq!(mdat.tag, FourCC::Mdat);
    assert_eq!(mdat.end, retry_at);
    assert_eq!(mov.atoms()[1].tag, FourCC::Moov);
    assert_eq!(mov.atoms()[1].start, retry_at);
    assert_eq!(mov.track(0).unwrap().sample_count, 1);
}

#[test]
fn unrecognized_and_headerless_files() {
    let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00\x00\x00\x00".to_vec();
    assert!(matches!(
        QuickTime::from_bytes(gif, ReadOptions::default()),
        Err(ContainerError::NotRecognized)
    ));

    // recognizable atoms, but no movie atom
    let mut mdat_only = vec![0, 0, 0, 8, b'f', b'r', b'e', b'e'];
    mdat_only.extend_from_slice(&[0, 0, 0, 12, b'm', b'd', b'a', b't', 1, 2, 3, 4]);
    assert!(matches!(
        QuickTime::from_bytes(mdat_only, ReadOptions::default()),
        Err(ContainerError::NoMovieHeader)
    ));
}

#[test]
fn probe_quicktime() {
    let mut qt = QuickTimeWriter::in_memory(WriteOptions::default()).unwrap();
    qt.add_video_track(2, 2, FourCC::from_str("raw "), 25, 1).unwrap();
    let bytes = qt.finish().unwrap().into_bytes().unwrap();

    let container = Container::from_bytes(bytes, ReadOptions::default()).unwrap();
    assert_eq!(container.kind(), ContainerKind::QuickTime);
    let Container::QuickTime(mov) = container else {
        panic!("expected a QuickTime file")
    };
    assert_eq!(mov.tracks().len(), 1);
}

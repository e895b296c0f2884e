use crate::{
    avi::{
        write_chunk,
        AviReader,
        AviWriteOptions,
        AviWriter,
        BitmapInfoHeader,
        Idx1Entry,
        MainHeader,
        RiffChunk,
        StreamFormat,
        StreamHeader,
        AVIIF_KEYFRAME,
    },
    probe::{Container, ContainerKind},
    quicktime::ReadOptions,
    ByteStream,
    ContainerError,
    FourCC,
};

fn reopen(avi: AviWriter) -> AviReader {
    let bytes = avi.finish().unwrap().into_bytes().unwrap();
    AviReader::from_bytes(bytes, ReadOptions::default()).unwrap()
}

#[test]
fn two_level_index_lookup() {
    let options = AviWriteOptions{ix_entries_per_table: 2, ..AviWriteOptions::default()};
    let mut avi = AviWriter::in_memory(options);
    // 8-bit mono: one byte per sample
    let audio = avi.add_audio_stream(1, 8000, 8).unwrap();
    avi.set_stream_name(audio, "mono").unwrap();

    let chunks: Vec<Vec<u8>> = [10, 11, 12].iter()
        .map(|n| (0 .. *n).map(|i| (i + *n) as u8).collect())
        .collect();
    let offsets: Vec<u64> = chunks.iter()
        .map(|c| avi.write_chunk(audio, c, c.len() as u32, true).unwrap())
        .collect();
    let mut avi = reopen(avi);

    assert!(avi.is_open_dml());
    assert_eq!(avi.segments(), 1);
    let stream = avi.stream(audio).unwrap();
    assert!(stream.header.is_audio());
    assert_eq!(stream.header.length, 33);
    assert_eq!(stream.name.as_deref(), Some("mono"));

    // first table holds two chunks, the second one
    let indx = stream.super_index.as_ref().unwrap();
    assert_eq!(indx.entries.len(), 2);
    assert_eq!(indx.entries[0].duration, 21);
    assert_eq!(indx.entries[1].duration, 12);

    let resolved: Vec<(u64, u32)> = stream.chunks.iter().map(|c| (c.offset, c.size)).collect();
    assert_eq!(resolved, vec![(offsets[0], 10), (offsets[1], 11), (offsets[2], 12)]);
    assert_eq!(stream.chunks.total_samples(), 33);

    assert_eq!(avi.chunk_of_sample(audio, 0).unwrap(), (0, 0));
    assert_eq!(avi.chunk_of_sample(audio, 9).unwrap(), (0, 0));
    assert_eq!(avi.chunk_of_sample(audio, 20).unwrap(), (1, 10));
    // across the table boundary
    assert_eq!(avi.chunk_of_sample(audio, 21).unwrap(), (2, 21));
    assert_eq!(avi.chunk_of_sample(audio, 32).unwrap(), (2, 21));
    assert!(matches!(
        avi.chunk_of_sample(audio, 33),
        Err(ContainerError::NoSuchSample{track: 0, sample: 33})
    ));
    assert!(matches!(avi.chunk_of_sample(1, 0), Err(ContainerError::NoSuchTrack(1))));

    for (i, chunk) in chunks.iter().enumerate() {
        assert_eq!(&avi.read_chunk(audio, i).unwrap(), chunk);
    }
}

#[test]
fn headers_round_trip() {
    let mut avi = AviWriter::in_memory(AviWriteOptions::default());
    let video = avi.add_video_stream(320, 240, FourCC::from_str("MJPG"), 24, 25, 1).unwrap();
    let audio = avi.add_audio_stream(2, 44100, 16).unwrap();
    avi.write_chunk(video, &[0xff; 100], 1, true).unwrap();
    avi.write_chunk(audio, &[0; 4 * 441], 441, true).unwrap();
    avi.write_chunk(video, &[0xfe; 60], 1, true).unwrap();
    assert!(matches!(avi.add_video_stream(1, 1, FourCC::default(), 24, 1, 1), Err(ContainerError::WriterState(_))));
    let avi = reopen(avi);

    let main = avi.main_header();
    assert_eq!((main.width, main.height), (320, 240));
    assert_eq!(main.micro_sec_per_frame, 40_000);
    assert_eq!(main.streams, 2);
    assert_eq!(main.total_frames, 2);
    assert_eq!(main.suggested_buffer_size, 4 * 441);
    assert_eq!(avi.total_frames(), 2);

    let v = avi.stream(video).unwrap();
    assert!(v.header.is_video());
    assert!(v.header.fcc_handler.is(b"MJPG"));
    assert_eq!((v.header.rate, v.header.scale, v.header.length), (25, 1, 2));
    let StreamFormat::Video{header, ..} = &v.format else {
        panic!("expected a video format")
    };
    assert_eq!((header.width, header.height, header.bit_count), (320, 240, 24));

    let a = avi.stream(audio).unwrap();
    let StreamFormat::Audio{format, ..} = &a.format else {
        panic!("expected an audio format")
    };
    assert_eq!((format.channels, format.samples_per_sec, format.block_align), (2, 44100, 4));
    assert_eq!(a.header.length, 441);
    assert_eq!(a.chunks.total_samples(), 441);
}

#[test]
fn keyframe_flag_per_chunk() {
    let mut avi = AviWriter::in_memory(AviWriteOptions::default());
    let video = avi.add_video_stream(2, 2, FourCC::from_str("DIB "), 24, 25, 1).unwrap();
    let flags = [true, false, false, true, false];
    for (i, keyframe) in flags.iter().enumerate() {
        avi.write_chunk(video, &[i as u8; 12], 1, *keyframe).unwrap();
    }
    let bytes = avi.finish().unwrap().into_bytes().unwrap();

    let avi = AviReader::from_bytes(bytes.clone(), ReadOptions::default()).unwrap();
    let read: Vec<bool> = avi.stream(video).unwrap().chunks.iter().map(|c| c.keyframe).collect();
    assert_eq!(read, flags);

    // idx1 carries the same flags
    let idx1_at = bytes.windows(4).rposition(|w| w == b"idx1").unwrap();
    let mut stream = ByteStream::memory(bytes);
    stream.seek_to(idx1_at as u64).unwrap();
    let chunk = RiffChunk::read_header(&mut stream).unwrap();
    let entries = Idx1Entry::read_all(&mut stream, &chunk).unwrap();
    let read: Vec<bool> = entries.iter().map(|e| e.flags & AVIIF_KEYFRAME != 0).collect();
    assert_eq!(read, flags);
}

#[test]
fn riff_segments() {
    let options = AviWriteOptions{riff_size_limit: 1, ..AviWriteOptions::default()};
    let mut avi = AviWriter::in_memory(options);
    let video = avi.add_video_stream(2, 2, FourCC::from_str("DIB "), 24, 25, 1).unwrap();
    let offsets: Vec<u64> = (0 .. 3u8)
        .map(|i| avi.write_chunk(video, &[i; 12], 1, true).unwrap())
        .collect();
    let mut avi = reopen(avi);

    assert_eq!(avi.segments(), 3);
    // the main header only counts the first segment
    assert_eq!(avi.main_header().total_frames, 1);
    assert_eq!(avi.total_frames(), 3);

    let stream = avi.stream(video).unwrap();
    assert_eq!(stream.super_index.as_ref().unwrap().entries.len(), 3);
    let resolved: Vec<u64> = stream.chunks.iter().map(|c| c.offset).collect();
    assert_eq!(resolved, offsets);
    assert_eq!(avi.read_chunk(video, 2).unwrap(), vec![2; 12]);
}

#[test]
fn full_super_index() {
    let options = AviWriteOptions {
        ix_entries_per_table: 1,
        superindex_capacity: 2,
        ..AviWriteOptions::default()
    };
    let mut avi = AviWriter::in_memory(options);
    let video = avi.add_video_stream(2, 2, FourCC::from_str("DIB "), 24, 25, 1).unwrap();
    avi.write_chunk(video, &[0; 12], 1, true).unwrap();
    avi.write_chunk(video, &[0; 12], 1, true).unwrap();
    assert!(matches!(
        avi.write_chunk(video, &[0; 12], 1, true),
        Err(ContainerError::WriterState(_))
    ));
}

/// Builds a plain AVI 1.0 file by hand: one video stream,
/// `00dc` chunks, and optionally an `idx1` index.
fn legacy_avi(chunks: &[&[u8]], idx1: Option<bool>) -> (Vec<u8>, Vec<u64>) {
    let mut stream = ByteStream::memory(Vec::new());
    let riff = RiffChunk::write_list(&mut stream, FourCC::Riff, FourCC::Avi).unwrap();

    let hdrl = RiffChunk::write_list(&mut stream, FourCC::List, FourCC::Hdrl).unwrap();
    let main = MainHeader{streams: 1, width: 2, height: 2, ..MainHeader::default()};
    RiffChunk::write_header(&mut stream, FourCC::Avih).unwrap()
        .finish(&mut stream, |s| s.write_le(&main))
        .unwrap();
    let strl = RiffChunk::write_list(&mut stream, FourCC::List, FourCC::Strl).unwrap();
    let strh = StreamHeader{fcc_type: FourCC::Vids, rate: 25, scale: 1, ..StreamHeader::default()};
    RiffChunk::write_header(&mut stream, FourCC::Strh).unwrap()
        .finish(&mut stream, |s| s.write_le(&strh))
        .unwrap();
    let format = StreamFormat::Video {
        header: BitmapInfoHeader{size: 40, width: 2, height: 2, planes: 1, bit_count: 24, ..Default::default()},
        extra: Vec::new(),
    };
    RiffChunk::write_header(&mut stream, FourCC::Strf).unwrap()
        .finish(&mut stream, |s| format.write(s))
        .unwrap();
    strl.write_footer(&mut stream).unwrap();
    hdrl.write_footer(&mut stream).unwrap();

    let movi = RiffChunk::write_list(&mut stream, FourCC::List, FourCC::Movi).unwrap();
    let written: Vec<RiffChunk> = chunks.iter()
        .map(|c| write_chunk(&mut stream, FourCC::from_str("00dc"), c).unwrap())
        .collect();
    // audio chunks of an undeclared stream are ignored
    write_chunk(&mut stream, FourCC::from_str("01wb"), &[9; 4]).unwrap();
    movi.write_footer(&mut stream).unwrap();

    if let Some(absolute) = idx1 {
        let base = if absolute {0} else {movi.start + 8};
        let entries: Vec<Idx1Entry> = written.iter()
            .map(|c| Idx1Entry {
                chunk_id: c.tag,
                flags: AVIIF_KEYFRAME,
                offset: (c.start - base) as u32,
                size: c.data_size() as u32,
            })
            .collect();
        Idx1Entry::write_all(&mut stream, &entries).unwrap();
    }
    riff.write_footer(&mut stream).unwrap();

    let offsets = written.iter().map(|c| c.data_offset()).collect();
    (stream.into_bytes().unwrap(), offsets)
}

#[test]
fn legacy_index_and_scan() {
    let chunks: [&[u8]; 3] = [&[1; 5], &[2; 6], &[3; 7]];
    for idx1 in [Some(false), Some(true), None] {
        let (bytes, offsets) = legacy_avi(&chunks, idx1);
        let mut avi = AviReader::from_bytes(bytes, ReadOptions::default()).unwrap();
        assert!(!avi.is_open_dml());
        assert_eq!(avi.total_frames(), 0);

        let stream = avi.stream(0).unwrap();
        let resolved: Vec<u64> = stream.chunks.iter().map(|c| c.offset).collect();
        assert_eq!(resolved, offsets, "idx1: {idx1:?}");
        assert_eq!(avi.chunk_of_sample(0, 2).unwrap(), (2, 2));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(&avi.read_chunk(0, i).unwrap(), chunk);
        }
    }
}

#[test]
fn not_an_avi() {
    let mut wave = b"RIFF\x04\x00\x00\x00WAVE".to_vec();
    wave.extend_from_slice(&[0; 8]);
    assert!(matches!(
        AviReader::from_bytes(wave, ReadOptions::default()),
        Err(ContainerError::NotRecognized)
    ));
}

#[test]
fn probe_avi() {
    let mut avi = AviWriter::in_memory(AviWriteOptions::default());
    let video = avi.add_video_stream(2, 2, FourCC::from_str("DIB "), 24, 25, 1).unwrap();
    avi.write_chunk(video, &[0; 12], 1, true).unwrap();
    let bytes = avi.finish().unwrap().into_bytes().unwrap();

    let container = Container::from_bytes(bytes, ReadOptions::default()).unwrap();
    assert_eq!(container.kind(), ContainerKind::Avi);
}

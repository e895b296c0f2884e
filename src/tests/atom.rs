use crate::{
    atom::{write_atom, Atom, QtAtomNode, RawAtom},
    atom_types::{
        compress_moov,
        read_descriptor_length,
        write_descriptor_length,
        AtomBody,
        Cmov,
        Moov,
        SampleDescription,
        Stsc,
        TimeToSample,
    },
    quicktime::{QuickTime, ReadOptions},
    track::SampleOffsets,
    writer::{QuickTimeWriter, WriteOptions},
    ByteStream,
    ContainerError,
    FourCC,
};

/// Movie atom with one video and one sound track, as the writer builds it.
fn sample_moov() -> Moov {
    let mut qt = QuickTimeWriter::in_memory(WriteOptions::default()).unwrap();
    let video = qt.add_video_track(4, 4, FourCC::from_str("raw "), 600, 20).unwrap();
    let audio = qt.add_audio_track(2, 48000, 16, FourCC::from_str("twos")).unwrap();
    qt.write_sample(video, &[1; 48], 20, true).unwrap();
    qt.write_sample(video, &[2; 48], 20, false).unwrap();
    qt.write_sample(audio, &[0; 16], 4, true).unwrap();
    qt.set_name("round trip");
    qt.moov().clone()
}

fn serialize(moov: &Moov, wide: bool) -> Vec<u8> {
    let mut stream = ByteStream::memory(Vec::new()).with_wide_sizes(wide);
    moov.write(&mut stream).unwrap();
    stream.into_bytes().unwrap()
}

#[test]
fn moov_round_trip() {
    let moov = sample_moov();
    let bytes = serialize(&moov, false);

    let mut stream = ByteStream::memory(bytes.clone());
    let header = Atom::read_header(&mut stream).unwrap();
    assert_eq!(header.size, bytes.len() as u64);
    assert!(!header.use_64);

    stream.seek_to(0).unwrap();
    let read = Moov::read(&mut stream).unwrap();
    assert_eq!(read, moov);
    assert_eq!(stream.position(), bytes.len() as u64);
}

#[test]
fn forced_64bit_sizes_round_trip() {
    let moov = sample_moov();
    let narrow = serialize(&moov, false);
    let wide = serialize(&moov, true);
    assert!(wide.len() > narrow.len());

    let mut stream = ByteStream::memory(wide.clone());
    let header = Atom::read_header(&mut stream).unwrap();
    assert!(header.use_64);
    assert_eq!(header.header_size(), 16);
    assert_eq!(header.size, wide.len() as u64);
    // size32 == 1 marks the 64-bit escape
    assert_eq!(&wide[0 .. 8], &[0, 0, 0, 1, b'm', b'o', b'o', b'v']);

    stream.seek_to(0).unwrap();
    let read = Moov::read(&mut stream).unwrap();
    assert_eq!(read.tracks, moov.tracks);
    assert_eq!(read.mvhd, moov.mvhd);
}

#[test]
fn nested_sizes_are_patched() {
    let mut stream = ByteStream::memory(Vec::new());
    let outer = write_atom(&mut stream, FourCC::Moov, |s| {
        s.write_u32(0xdeadbeef)?;
        write_atom(s, FourCC::Trak, |s| {
            s.write_fixed_bytes(b"abcde")?;
            write_atom(s, FourCC::Udta, |s| s.write_fixed_bytes(b"xyz"))?;
            s.write_u16(7)
        })?;
        s.write_u8(1)
    }).unwrap();
    assert_eq!(stream.position(), outer.end);

    let bytes = stream.into_bytes().unwrap();
    let mut stream = ByteStream::memory(bytes);

    let a = Atom::read_header(&mut stream).unwrap();
    assert_eq!(stream.read_u32().unwrap(), 0xdeadbeef);
    let b = Atom::read_header(&mut stream).unwrap();
    assert_eq!(stream.read_fixed_bytes(5).unwrap(), b"abcde");
    let c = Atom::read_header(&mut stream).unwrap();

    assert_eq!(c.size, 8 + 3);
    assert_eq!(b.size, 8 + 5 + c.size + 2);
    assert_eq!(a.size, 8 + 4 + b.size + 1);
    assert_eq!(a.size, stream.len());
    assert!(a.contains(&b) && b.contains(&c));
    assert!(a.is_container() && b.is_container() && c.is_container());

    c.skip(&mut stream).unwrap();
    assert_eq!(stream.read_u16().unwrap(), 7);
    b.skip(&mut stream).unwrap();
    assert_eq!(stream.read_u8().unwrap(), 1);
}

#[test]
fn failed_body_rewinds() {
    let mut stream = ByteStream::memory(Vec::new()).with_limit(12);
    stream.write_u32(0).unwrap();
    let res = write_atom(&mut stream, FourCC::Free, |s| s.write_u64(1));
    assert!(matches!(res, Err(ContainerError::IoWriteFailure{..})));
    assert_eq!(stream.position(), 4);
}

#[test]
fn wide_placeholder_is_transparent() {
    let mut plain = ByteStream::memory(Vec::new());
    RawAtom::new(FourCC::from_str("xtra"), b"vendor data").write(&mut plain).unwrap();
    let plain = plain.into_bytes().unwrap();

    let mut wrapped = vec![0, 0, 0, 8, b'w', b'i', b'd', b'e'];
    wrapped.extend_from_slice(&plain);

    let mut a = ByteStream::memory(plain);
    let mut b = ByteStream::memory(wrapped);
    let atom_a = Atom::read_header(&mut a).unwrap();
    let atom_b = Atom::read_header(&mut b).unwrap();

    assert_eq!(atom_a.tag, atom_b.tag);
    assert_eq!(atom_a.size, atom_b.size);
    assert_eq!(atom_b.start, atom_a.start + 8);
    assert_eq!(
        RawAtom::read(&mut a, &atom_a).unwrap(),
        RawAtom::read(&mut b, &atom_b).unwrap()
    );
}

/// Serialized movie atom with an 8-byte `wide` as its last child.
fn moov_with_trailing_wide(moov: &Moov) -> Vec<u8> {
    let mut bytes = serialize(moov, false);
    bytes.extend_from_slice(&[0, 0, 0, 8, b'w', b'i', b'd', b'e']);
    let size = bytes.len() as u32;
    bytes[0 .. 4].copy_from_slice(&size.to_be_bytes());
    bytes
}

#[test]
fn wide_closing_its_parent() {
    let moov = sample_moov();
    let bytes = moov_with_trailing_wide(&moov);
    let moov_len = bytes.len() as u64;

    // sibling after the movie atom
    let mut with_mdat = bytes.clone();
    with_mdat.extend_from_slice(&[0, 0, 0, 12, b'm', b'd', b'a', b't', 1, 2, 3, 4]);
    let mut stream = ByteStream::memory(with_mdat);
    let read = Moov::read(&mut stream).unwrap();
    assert!(read.extra.is_empty());
    assert_eq!(read, moov);
    assert_eq!(stream.position(), moov_len);

    // movie atom last in the file
    let qt = QuickTime::from_bytes(bytes, ReadOptions::default()).unwrap();
    assert_eq!(qt.moov(), &moov);
}

#[test]
fn oversized_64bit_size_is_clamped() {
    let mut bytes = vec![0, 0, 0, 8, b'f', b'r', b'e', b'e'];
    bytes.extend_from_slice(&[0, 0, 0, 1, b'm', b'o', b'o', b'v']);
    bytes.extend_from_slice(&u64::MAX.to_be_bytes());
    bytes.extend_from_slice(&[0; 16]);
    let len = bytes.len() as u64;

    let mut stream = ByteStream::memory(bytes.clone());
    stream.seek_to(8).unwrap();
    let atom = Atom::read_header(&mut stream).unwrap();
    assert_eq!(atom.end, len);
    assert_eq!(atom.size, len - 8);
    atom.skip(&mut stream).unwrap();
    assert_eq!(stream.position(), len);

    assert!(matches!(
        QuickTime::from_bytes(bytes, ReadOptions::default()),
        Err(ContainerError::NoMovieHeader)
    ));
}

#[test]
fn truncated_header() {
    let mut stream = ByteStream::memory(vec![0, 0, 0, 1, b'm', b'd', b'a', b't', 0, 0]);
    assert!(matches!(
        Atom::read_header(&mut stream),
        Err(ContainerError::TruncatedHeader{offset: 0, ..})
    ));
    let mut stream = ByteStream::memory(vec![0, 0, 0]);
    assert!(matches!(
        Atom::read_header(&mut stream),
        Err(ContainerError::TruncatedHeader{offset: 0, available: 3})
    ));
}

#[test]
fn zero_sized_atom_advances() {
    let mut stream = ByteStream::memory(vec![0; 16]);
    let atom = Atom::write_header(&mut stream, FourCC::Free).unwrap();
    assert_eq!(atom.size, 0);
    atom.skip(&mut stream).unwrap();
    assert_eq!(stream.position(), 1);
}

#[test]
fn moov_without_mvhd() {
    let mut stream = ByteStream::memory(Vec::new());
    write_atom(&mut stream, FourCC::Moov, |s| {
        RawAtom::new(FourCC::Free, &[0; 4]).write(s)
    }).unwrap();
    stream.seek_to(0).unwrap();
    assert!(matches!(Moov::read(&mut stream), Err(ContainerError::NoMovieHeader)));
}

#[test]
fn unknown_children_pass_through() {
    let mut moov = sample_moov();
    moov.extra.push(RawAtom::new(FourCC::from_str("xtra"), b"\x01\x02\x03"));
    let bytes = serialize(&moov, false);

    let read = Moov::read(&mut ByteStream::memory(bytes.clone())).unwrap();
    assert_eq!(read.extra, moov.extra);
    assert_eq!(serialize(&read, false), bytes);

    let skipped = Moov::read(&mut ByteStream::memory(bytes).with_capture_unknown(false)).unwrap();
    assert!(skipped.extra.is_empty());
    assert_eq!(skipped.tracks, moov.tracks);
}

#[test]
fn compressed_moov_parses_like_plain() {
    let moov = sample_moov();
    let cmov = compress_moov(&serialize(&moov, false)).unwrap();
    assert!(cmov.algorithm().is(b"zlib"));

    let mut stream = ByteStream::memory(Vec::new());
    write_atom(&mut stream, FourCC::Moov, |s| cmov.write(s)).unwrap();
    let len = stream.len();
    stream.seek_to(0).unwrap();

    let read = Moov::read(&mut stream).unwrap();
    assert!(read.is_compressed());
    assert!(!moov.is_compressed());
    assert_eq!(read.mvhd, moov.mvhd);
    assert_eq!(read.tracks, moov.tracks);
    assert_eq!(read.udta, moov.udta);
    // position is restored to the compressed atom's end
    assert_eq!(stream.position(), len);
}

#[test]
fn unsupported_compression() {
    let cmov = Cmov{algorithm: FourCC::from_str("lzw "), ..Cmov::default()};
    let mut stream = ByteStream::memory(Vec::new());
    write_atom(&mut stream, FourCC::Moov, |s| cmov.write(s)).unwrap();
    stream.seek_to(0).unwrap();
    assert!(matches!(
        Moov::read(&mut stream),
        Err(ContainerError::UnsupportedCompression(f)) if f.is(b"lzw ")
    ));
}

#[test]
fn qt_atom_container_round_trip() {
    let root = QtAtomNode::branch(FourCC::from_str("sean"), 1, vec![
        QtAtomNode::leaf(FourCC::from_str("name"), 1, b"first"),
        QtAtomNode::branch(FourCC::from_str("trak"), 2, vec![
            QtAtomNode::leaf(FourCC::from_str("name"), 1, b""),
        ]),
        QtAtomNode::leaf(FourCC::from_str("name"), 2, b"second"),
    ]);
    let mut stream = ByteStream::memory(Vec::new());
    root.write_container(&mut stream).unwrap();
    let len = stream.len();

    stream.seek_to(0).unwrap();
    let read = QtAtomNode::read_container(&mut stream).unwrap();
    assert_eq!(read, root);
    assert_eq!(stream.position(), len);
    assert_eq!(
        read.find(b"name", 2),
        Some(&QtAtomNode::leaf(FourCC::from_str("name"), 2, b"second"))
    );
    assert!(read.find(b"name", 3).is_none());
}

#[test]
fn sample_description_entries() {
    let moov = sample_moov();

    let video = moov.tracks[0].stbl().stsd.first().unwrap();
    assert!(video.is_video() && video.audio().is_none());
    let description = video.video().unwrap().clone();
    assert_eq!(&SampleDescription::new_video(FourCC::from_str("raw "), description), video);

    let audio = moov.tracks[1].stbl().stsd.first().unwrap();
    assert!(audio.is_audio() && audio.video().is_none());
    let description = audio.audio().unwrap().clone();
    assert_eq!(&SampleDescription::new_audio(FourCC::from_str("twos"), description), audio);
}

#[test]
fn huge_time_to_sample_run() {
    let moov = sample_moov();
    let mut stbl = moov.tracks[0].stbl().clone();
    stbl.stts.table = vec![TimeToSample{sample_count: u32::MAX, sample_duration: 20}];
    assert_eq!(stbl.stts.len(), u32::MAX as u64);

    // durations are only expanded for samples that exist
    let offsets = SampleOffsets::new(&stbl, 600).unwrap();
    assert_eq!(offsets.len(), 2);
    assert!(offsets.iter().all(|o| o.duration_ticks == 20));
    assert_eq!(stbl.stts.durations().nth(1_000_000), Some(20));
}

#[test]
fn descriptor_lengths() {
    for (len, compact_size) in [(0, 1), (0x7f, 1), (0x80, 2), (0x3fff, 2), (0x4000, 3), (0x20_0000, 4)] {
        let mut stream = ByteStream::memory(Vec::new());
        write_descriptor_length(&mut stream, len, true).unwrap();
        assert_eq!(stream.len(), compact_size, "compact length of {len}");
        write_descriptor_length(&mut stream, len, false).unwrap();
        assert_eq!(stream.len(), compact_size + 4, "padded length of {len}");

        stream.seek_to(0).unwrap();
        assert_eq!(read_descriptor_length(&mut stream).unwrap(), len);
        assert_eq!(read_descriptor_length(&mut stream).unwrap(), len);
    }
}

#[test]
fn sample_to_chunk_lookup() {
    let mut stsc = Stsc::default();
    stsc.push_chunk(1, 3, 1);
    stsc.push_chunk(2, 3, 1);
    stsc.push_chunk(3, 1, 1);
    assert_eq!(stsc.table().len(), 2);

    assert_eq!(stsc.samples_in_chunk(2), Some(3));
    assert_eq!(stsc.samples_in_chunk(9), Some(1));
    assert_eq!(stsc.len(3), 7);

    assert_eq!(stsc.chunk_of_sample(0), Some((1, 0)));
    assert_eq!(stsc.chunk_of_sample(5), Some((2, 3)));
    assert_eq!(stsc.chunk_of_sample(6), Some((3, 6)));
    // the last run extends indefinitely
    assert_eq!(stsc.chunk_of_sample(9), Some((6, 9)));
    assert_eq!(Stsc::default().chunk_of_sample(0), None);
}

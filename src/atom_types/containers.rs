//! Container atoms of the movie tree:
//! `moov`, `trak`, `mdia`, `minf`, `stbl`,
//! plus the single-child containers `edts` and `dinf`.
//!
//! Each container is read by walking its children through an
//! ordered handler table. Unknown children are kept as raw atoms
//! and written back after the known ones.

use crate::{
    atom::{walk, write_atom, Atom, ParseFn, RawAtom},
    ByteStream,
    ContainerError,
    FourCC,
};

use super::{
    decompress_moov,
    AtomBody,
    ChunkOffsets,
    Cmov,
    Ctab,
    Ctts,
    Dref,
    Elst,
    Hdlr,
    Iods,
    Mdhd,
    MediaKind,
    Mvhd,
    Smhd,
    Stsc,
    Stsd,
    Stss,
    Stsz,
    Stts,
    Tkhd,
    Udta,
    Vmhd,
};

fn missing(atom: &Atom, child: &str) -> ContainerError {
    ContainerError::MalformedAtomGraph{
        tag: atom.tag,
        offset: atom.start,
        reason: format!("missing '{child}'")
    }
}

fn write_extra(stream: &mut ByteStream, extra: &[RawAtom]) -> Result<(), ContainerError> {
    for raw in extra.iter() {
        raw.write(stream)?;
    }
    Ok(())
}

/// Movie atom (`moov`).
#[derive(Debug, Clone, PartialEq)]
pub struct Moov {
    pub mvhd: Mvhd,
    /// MP4 only.
    pub iods: Option<Iods>,
    pub tracks: Vec<Trak>,
    pub udta: Option<Udta>,
    pub ctab: Option<Ctab>,
    /// Unknown children, in file order.
    pub extra: Vec<RawAtom>,
    /// Read from a compressed movie atom (`cmov`).
    pub(crate) compressed: bool,
}

#[derive(Default)]
struct MoovParse {
    mvhd: Option<Mvhd>,
    iods: Option<Iods>,
    tracks: Vec<Trak>,
    udta: Option<Udta>,
    ctab: Option<Ctab>,
    extra: Vec<RawAtom>,
    compressed: bool,
}

impl MoovParse {
    const HANDLERS: &'static [(FourCC, ParseFn<MoovParse>)] = &[
        (FourCC::Mvhd, MoovParse::read_mvhd),
        (FourCC::Trak, MoovParse::read_trak),
        (FourCC::Udta, MoovParse::read_udta),
        (FourCC::Iods, MoovParse::read_iods),
        (FourCC::Ctab, MoovParse::read_ctab),
        (FourCC::Cmov, MoovParse::read_cmov),
    ];

    fn read_mvhd(stream: &mut ByteStream, moov: &mut MoovParse, atom: &Atom) -> Result<(), ContainerError> {
        moov.mvhd = Some(Mvhd::read_body(stream, atom)?);
        Ok(())
    }

    fn read_trak(stream: &mut ByteStream, moov: &mut MoovParse, atom: &Atom) -> Result<(), ContainerError> {
        moov.tracks.push(Trak::read_body(stream, atom)?);
        Ok(())
    }

    fn read_udta(stream: &mut ByteStream, moov: &mut MoovParse, atom: &Atom) -> Result<(), ContainerError> {
        moov.udta = Some(Udta::read_body(stream, atom)?);
        Ok(())
    }

    fn read_iods(stream: &mut ByteStream, moov: &mut MoovParse, atom: &Atom) -> Result<(), ContainerError> {
        moov.iods = Some(Iods::read_body(stream, atom)?);
        Ok(())
    }

    fn read_ctab(stream: &mut ByteStream, moov: &mut MoovParse, atom: &Atom) -> Result<(), ContainerError> {
        moov.ctab = Some(Ctab::read_body(stream, atom)?);
        Ok(())
    }

    /// Decompresses the movie atom and parses it in place of
    /// the compressed one, with the decompressed bytes as the
    /// active stream.
    fn read_cmov(stream: &mut ByteStream, moov: &mut MoovParse, atom: &Atom) -> Result<(), ContainerError> {
        let cmov = Cmov::read_body(stream, atom)?;
        let data = decompress_moov(&cmov)?;
        stream.log.debug(format_args!(
            "'cmov' @ {}: {} bytes inflated to {}", atom.start, cmov.data.len(), data.len()
        ));
        stream.with_memory(data, |s| {
            let inner = Atom::read_header(s)?;
            if inner.tag != FourCC::Moov {
                return Err(ContainerError::MalformedAtomGraph{
                    tag: inner.tag,
                    offset: atom.start,
                    reason: "compressed data does not hold a 'moov' atom".to_owned()
                })
            }
            walk(s, &inner, moov, MoovParse::HANDLERS, Some(MoovParse::capture))
        })?;
        moov.compressed = true;
        Ok(())
    }

    fn capture(moov: &mut MoovParse, raw: RawAtom) {
        moov.extra.push(raw)
    }
}

impl Moov {
    pub fn new(mvhd: Mvhd) -> Self {
        Self {
            mvhd,
            iods: None,
            tracks: Vec::new(),
            udta: None,
            ctab: None,
            extra: Vec::new(),
            compressed: false,
        }
    }

    /// `true` if read from a compressed movie atom.
    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    pub fn track(&self, index: usize) -> Option<&Trak> {
        self.tracks.get(index)
    }
}

impl AtomBody for Moov {
    const TAG: FourCC = FourCC::Moov;

    /// Fails with `NoMovieHeader` if there is no `mvhd`.
    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        let mut moov = MoovParse::default();
        walk(stream, atom, &mut moov, MoovParse::HANDLERS, Some(MoovParse::capture))?;
        Ok(Self {
            mvhd: moov.mvhd.ok_or(ContainerError::NoMovieHeader)?,
            iods: moov.iods,
            tracks: moov.tracks,
            udta: moov.udta,
            ctab: moov.ctab,
            extra: moov.extra,
            compressed: moov.compressed,
        })
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        self.mvhd.write(stream)?;
        if let Some(iods) = &self.iods {
            iods.write(stream)?;
        }
        for trak in self.tracks.iter() {
            trak.write(stream)?;
        }
        if let Some(udta) = &self.udta {
            udta.write(stream)?;
        }
        if let Some(ctab) = &self.ctab {
            ctab.write(stream)?;
        }
        write_extra(stream, &self.extra)
    }
}

/// Track atom (`trak`).
#[derive(Debug, Clone, PartialEq)]
pub struct Trak {
    pub tkhd: Tkhd,
    /// Edit list, stored inside `edts`.
    pub elst: Option<Elst>,
    pub mdia: Mdia,
    pub udta: Option<Udta>,
    pub extra: Vec<RawAtom>,
}

#[derive(Default)]
struct TrakParse {
    tkhd: Option<Tkhd>,
    elst: Option<Elst>,
    mdia: Option<Mdia>,
    udta: Option<Udta>,
    extra: Vec<RawAtom>,
}

impl TrakParse {
    const HANDLERS: &'static [(FourCC, ParseFn<TrakParse>)] = &[
        (FourCC::Tkhd, TrakParse::read_tkhd),
        (FourCC::Mdia, TrakParse::read_mdia),
        (FourCC::Edts, TrakParse::read_edts),
        (FourCC::Udta, TrakParse::read_udta),
    ];

    const EDTS_HANDLERS: &'static [(FourCC, ParseFn<TrakParse>)] = &[
        (FourCC::Elst, TrakParse::read_elst),
    ];

    fn read_tkhd(stream: &mut ByteStream, trak: &mut TrakParse, atom: &Atom) -> Result<(), ContainerError> {
        trak.tkhd = Some(Tkhd::read_body(stream, atom)?);
        Ok(())
    }

    fn read_mdia(stream: &mut ByteStream, trak: &mut TrakParse, atom: &Atom) -> Result<(), ContainerError> {
        trak.mdia = Some(Mdia::read_body(stream, atom)?);
        Ok(())
    }

    fn read_edts(stream: &mut ByteStream, trak: &mut TrakParse, atom: &Atom) -> Result<(), ContainerError> {
        walk(stream, atom, trak, Self::EDTS_HANDLERS, None)
    }

    fn read_elst(stream: &mut ByteStream, trak: &mut TrakParse, atom: &Atom) -> Result<(), ContainerError> {
        trak.elst = Some(Elst::read_body(stream, atom)?);
        Ok(())
    }

    fn read_udta(stream: &mut ByteStream, trak: &mut TrakParse, atom: &Atom) -> Result<(), ContainerError> {
        trak.udta = Some(Udta::read_body(stream, atom)?);
        Ok(())
    }

    fn capture(trak: &mut TrakParse, raw: RawAtom) {
        trak.extra.push(raw)
    }
}

impl Trak {
    pub fn new(tkhd: Tkhd, mdia: Mdia) -> Self {
        Self{tkhd, elst: None, mdia, udta: None, extra: Vec::new()}
    }

    pub fn kind(&self) -> MediaKind {
        self.mdia.kind()
    }

    pub fn stbl(&self) -> &Stbl {
        &self.mdia.minf.stbl
    }

    pub fn stbl_mut(&mut self) -> &mut Stbl {
        &mut self.mdia.minf.stbl
    }
}

impl AtomBody for Trak {
    const TAG: FourCC = FourCC::Trak;

    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        let mut trak = TrakParse::default();
        walk(stream, atom, &mut trak, TrakParse::HANDLERS, Some(TrakParse::capture))?;
        Ok(Self {
            tkhd: trak.tkhd.ok_or_else(|| missing(atom, "tkhd"))?,
            elst: trak.elst,
            mdia: trak.mdia.ok_or_else(|| missing(atom, "mdia"))?,
            udta: trak.udta,
            extra: trak.extra,
        })
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        self.tkhd.write(stream)?;
        if let Some(elst) = &self.elst {
            write_atom(stream, FourCC::Edts, |s| elst.write(s))?;
        }
        self.mdia.write(stream)?;
        if let Some(udta) = &self.udta {
            udta.write(stream)?;
        }
        write_extra(stream, &self.extra)
    }
}

/// Media atom (`mdia`).
#[derive(Debug, Clone, PartialEq)]
pub struct Mdia {
    pub mdhd: Mdhd,
    pub hdlr: Hdlr,
    pub minf: Minf,
    pub extra: Vec<RawAtom>,
}

#[derive(Default)]
struct MdiaParse {
    mdhd: Option<Mdhd>,
    hdlr: Option<Hdlr>,
    minf: Option<Minf>,
    extra: Vec<RawAtom>,
}

impl MdiaParse {
    const HANDLERS: &'static [(FourCC, ParseFn<MdiaParse>)] = &[
        (FourCC::Mdhd, MdiaParse::read_mdhd),
        (FourCC::Hdlr, MdiaParse::read_hdlr),
        (FourCC::Minf, MdiaParse::read_minf),
    ];

    fn read_mdhd(stream: &mut ByteStream, mdia: &mut MdiaParse, atom: &Atom) -> Result<(), ContainerError> {
        mdia.mdhd = Some(Mdhd::read_body(stream, atom)?);
        Ok(())
    }

    fn read_hdlr(stream: &mut ByteStream, mdia: &mut MdiaParse, atom: &Atom) -> Result<(), ContainerError> {
        mdia.hdlr = Some(Hdlr::read_body(stream, atom)?);
        Ok(())
    }

    /// `hdlr` precedes `minf`, so the media kind is known here.
    fn read_minf(stream: &mut ByteStream, mdia: &mut MdiaParse, atom: &Atom) -> Result<(), ContainerError> {
        let kind = mdia.hdlr.as_ref()
            .map(|h| MediaKind::from_handler(h.component_subtype));
        mdia.minf = Some(Minf::read_media(stream, atom, kind)?);
        Ok(())
    }

    fn capture(mdia: &mut MdiaParse, raw: RawAtom) {
        mdia.extra.push(raw)
    }
}

impl Mdia {
    pub fn new(mdhd: Mdhd, hdlr: Hdlr, minf: Minf) -> Self {
        Self{mdhd, hdlr, minf, extra: Vec::new()}
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::from_handler(self.hdlr.component_subtype)
    }
}

impl AtomBody for Mdia {
    const TAG: FourCC = FourCC::Mdia;

    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        let mut mdia = MdiaParse::default();
        walk(stream, atom, &mut mdia, MdiaParse::HANDLERS, Some(MdiaParse::capture))?;
        Ok(Self {
            mdhd: mdia.mdhd.ok_or_else(|| missing(atom, "mdhd"))?,
            hdlr: mdia.hdlr.ok_or_else(|| missing(atom, "hdlr"))?,
            minf: mdia.minf.ok_or_else(|| missing(atom, "minf"))?,
            extra: mdia.extra,
        })
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        self.mdhd.write(stream)?;
        self.hdlr.write(stream)?;
        self.minf.write(stream)?;
        write_extra(stream, &self.extra)
    }
}

/// Media type specific header of `minf`.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaHeader {
    Video(Vmhd),
    Sound(Smhd),
    /// E.g. `gmhd` for timecode or text tracks.
    Raw(RawAtom),
}

impl MediaHeader {
    fn write(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        match self {
            MediaHeader::Video(v) => v.write(stream),
            MediaHeader::Sound(s) => s.write(stream),
            MediaHeader::Raw(r) => r.write(stream),
        }
    }
}

/// Media information atom (`minf`).
#[derive(Debug, Clone, PartialEq)]
pub struct Minf {
    pub header: MediaHeader,
    /// Data handler (QuickTime only).
    pub hdlr: Option<Hdlr>,
    /// Data references, stored inside `dinf`.
    pub dref: Dref,
    pub stbl: Stbl,
    pub extra: Vec<RawAtom>,
}

struct MinfParse {
    kind: Option<MediaKind>,
    header: Option<MediaHeader>,
    hdlr: Option<Hdlr>,
    dref: Option<Dref>,
    stbl: Option<Stbl>,
    extra: Vec<RawAtom>,
}

impl MinfParse {
    const HANDLERS: &'static [(FourCC, ParseFn<MinfParse>)] = &[
        (FourCC::Vmhd, MinfParse::read_vmhd),
        (FourCC::Smhd, MinfParse::read_smhd),
        (FourCC::Gmhd, MinfParse::read_gmhd),
        (FourCC::Hdlr, MinfParse::read_hdlr),
        (FourCC::Dinf, MinfParse::read_dinf),
        (FourCC::Stbl, MinfParse::read_stbl),
    ];

    const DINF_HANDLERS: &'static [(FourCC, ParseFn<MinfParse>)] = &[
        (FourCC::Dref, MinfParse::read_dref),
    ];

    fn read_vmhd(stream: &mut ByteStream, minf: &mut MinfParse, atom: &Atom) -> Result<(), ContainerError> {
        minf.header = Some(MediaHeader::Video(Vmhd::read_body(stream, atom)?));
        minf.kind.get_or_insert(MediaKind::Video);
        Ok(())
    }

    fn read_smhd(stream: &mut ByteStream, minf: &mut MinfParse, atom: &Atom) -> Result<(), ContainerError> {
        minf.header = Some(MediaHeader::Sound(Smhd::read_body(stream, atom)?));
        minf.kind.get_or_insert(MediaKind::Sound);
        Ok(())
    }

    fn read_gmhd(stream: &mut ByteStream, minf: &mut MinfParse, atom: &Atom) -> Result<(), ContainerError> {
        minf.header = Some(MediaHeader::Raw(RawAtom::read(stream, atom)?));
        Ok(())
    }

    fn read_hdlr(stream: &mut ByteStream, minf: &mut MinfParse, atom: &Atom) -> Result<(), ContainerError> {
        minf.hdlr = Some(Hdlr::read_body(stream, atom)?);
        Ok(())
    }

    fn read_dinf(stream: &mut ByteStream, minf: &mut MinfParse, atom: &Atom) -> Result<(), ContainerError> {
        walk(stream, atom, minf, Self::DINF_HANDLERS, None)
    }

    fn read_dref(stream: &mut ByteStream, minf: &mut MinfParse, atom: &Atom) -> Result<(), ContainerError> {
        minf.dref = Some(Dref::read_body(stream, atom)?);
        Ok(())
    }

    fn read_stbl(stream: &mut ByteStream, minf: &mut MinfParse, atom: &Atom) -> Result<(), ContainerError> {
        minf.stbl = Some(Stbl::read_media(stream, atom, minf.kind)?);
        Ok(())
    }

    fn capture(minf: &mut MinfParse, raw: RawAtom) {
        minf.extra.push(raw)
    }
}

impl Minf {
    pub fn new(header: MediaHeader, stbl: Stbl) -> Self {
        Self{header, hdlr: None, dref: Dref::default(), stbl, extra: Vec::new()}
    }

    /// Reads the data load. `kind` is the media type declared by
    /// the media handler, if known.
    pub fn read_media(
        stream: &mut ByteStream,
        atom: &Atom,
        kind: Option<MediaKind>
    ) -> Result<Self, ContainerError> {
        let mut minf = MinfParse {
            kind,
            header: None,
            hdlr: None,
            dref: None,
            stbl: None,
            extra: Vec::new(),
        };
        walk(stream, atom, &mut minf, MinfParse::HANDLERS, Some(MinfParse::capture))?;

        let dref = minf.dref.unwrap_or_else(|| {
            stream.log.warn(format_args!("'minf' @ {}: no 'dref', assuming self-contained", atom.start));
            Dref::default()
        });

        Ok(Self {
            header: minf.header.ok_or_else(|| missing(atom, "vmhd/smhd/gmhd"))?,
            hdlr: minf.hdlr,
            dref,
            stbl: minf.stbl.ok_or_else(|| missing(atom, "stbl"))?,
            extra: minf.extra,
        })
    }
}

impl AtomBody for Minf {
    const TAG: FourCC = FourCC::Minf;

    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        Self::read_media(stream, atom, None)
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        self.header.write(stream)?;
        if let Some(hdlr) = &self.hdlr {
            hdlr.write(stream)?;
        }
        write_atom(stream, FourCC::Dinf, |s| self.dref.write(s))?;
        self.stbl.write(stream)?;
        write_extra(stream, &self.extra)
    }
}

/// Sample table atom (`stbl`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stbl {
    pub stsd: Stsd,
    pub stts: Stts,
    /// No sync sample table means every sample is a keyframe.
    pub stss: Option<Stss>,
    pub stsc: Stsc,
    pub stsz: Stsz,
    /// `stco` or `co64`
    pub stco: ChunkOffsets,
    pub ctts: Option<Ctts>,
    pub extra: Vec<RawAtom>,
}

struct StblParse {
    kind: Option<MediaKind>,
    stbl: Stbl,
}

impl StblParse {
    const HANDLERS: &'static [(FourCC, ParseFn<StblParse>)] = &[
        (FourCC::Stsd, StblParse::read_stsd),
        (FourCC::Stts, StblParse::read_stts),
        (FourCC::Stss, StblParse::read_stss),
        (FourCC::Stsc, StblParse::read_stsc),
        (FourCC::Stsz, StblParse::read_stsz),
        (FourCC::Stco, StblParse::read_stco),
        (FourCC::Co64, StblParse::read_stco),
        (FourCC::Ctts, StblParse::read_ctts),
    ];

    fn read_stsd(stream: &mut ByteStream, p: &mut StblParse, atom: &Atom) -> Result<(), ContainerError> {
        p.stbl.stsd = Stsd::read_media(stream, atom, p.kind)?;
        Ok(())
    }

    fn read_stts(stream: &mut ByteStream, p: &mut StblParse, atom: &Atom) -> Result<(), ContainerError> {
        p.stbl.stts = Stts::read_body(stream, atom)?;
        Ok(())
    }

    fn read_stss(stream: &mut ByteStream, p: &mut StblParse, atom: &Atom) -> Result<(), ContainerError> {
        p.stbl.stss = Some(Stss::read_body(stream, atom)?);
        Ok(())
    }

    fn read_stsc(stream: &mut ByteStream, p: &mut StblParse, atom: &Atom) -> Result<(), ContainerError> {
        p.stbl.stsc = Stsc::read_body(stream, atom)?;
        Ok(())
    }

    fn read_stsz(stream: &mut ByteStream, p: &mut StblParse, atom: &Atom) -> Result<(), ContainerError> {
        p.stbl.stsz = Stsz::read_body(stream, atom)?;
        Ok(())
    }

    fn read_stco(stream: &mut ByteStream, p: &mut StblParse, atom: &Atom) -> Result<(), ContainerError> {
        p.stbl.stco = ChunkOffsets::read_body(stream, atom)?;
        Ok(())
    }

    fn read_ctts(stream: &mut ByteStream, p: &mut StblParse, atom: &Atom) -> Result<(), ContainerError> {
        p.stbl.ctts = Some(Ctts::read_body(stream, atom)?);
        Ok(())
    }

    fn capture(p: &mut StblParse, raw: RawAtom) {
        p.stbl.extra.push(raw)
    }
}

impl Stbl {
    pub fn new(stsd: Stsd) -> Self {
        Self{stsd, ..Default::default()}
    }

    pub fn read_media(
        stream: &mut ByteStream,
        atom: &Atom,
        kind: Option<MediaKind>
    ) -> Result<Self, ContainerError> {
        let mut p = StblParse{kind, stbl: Stbl::default()};
        walk(stream, atom, &mut p, StblParse::HANDLERS, Some(StblParse::capture))?;
        Ok(p.stbl)
    }

    /// Number of samples, as listed in `stsz`.
    pub fn sample_count(&self) -> u64 {
        self.stsz.len()
    }

    /// Keyframe status of `sample` (0-based).
    pub fn is_keyframe(&self, sample: u64) -> bool {
        match &self.stss {
            Some(stss) => stss.is_keyframe(sample),
            None => true,
        }
    }

    /// Absolute offset and size of `sample` (0-based).
    pub fn sample_location(&self, sample: u64) -> Option<(u64, u32)> {
        let (chunk, first) = self.stsc.chunk_of_sample(sample)?;
        let chunk_offset = self.stco.offset_of_chunk(chunk)?;
        let before = self.stsz.range_size(first, sample - first);
        let size = self.stsz.size_of_sample(sample)?;
        Some((chunk_offset + before, size))
    }
}

impl AtomBody for Stbl {
    const TAG: FourCC = FourCC::Stbl;

    fn read_body(stream: &mut ByteStream, atom: &Atom) -> Result<Self, ContainerError> {
        Self::read_media(stream, atom, None)
    }

    fn write_body(&self, stream: &mut ByteStream) -> Result<(), ContainerError> {
        self.stsd.write(stream)?;
        self.stts.write(stream)?;
        if let Some(stss) = &self.stss {
            stss.write(stream)?;
        }
        self.stsc.write(stream)?;
        self.stsz.write(stream)?;
        self.stco.write(stream)?;
        if let Some(ctts) = &self.ctts {
            ctts.write(stream)?;
        }
        write_extra(stream, &self.extra)
    }
}

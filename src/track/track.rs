//! A summary of one `trak`: media kind, codec,
//! dimensions or audio format, and timing.

use time::Duration;

use crate::{atom_types::{MediaKind, Trak}, FourCC};

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Position among the movie's tracks.
    pub index: usize,
    /// Track ID, from `tkhd`.
    pub id: u32,
    pub kind: MediaKind,
    /// Sample description format of the first entry.
    pub codec: FourCC,
    pub width: u32,
    pub height: u32,
    /// Pixel depth, video only.
    pub depth: u16,
    pub sample_rate: f64,
    pub channels: u32,
    /// Bits per audio sample.
    pub bits: u32,
    /// Media time scale, from `mdhd`.
    pub time_scale: u32,
    pub sample_count: u64,
    /// Duration in the media time scale.
    pub duration_ticks: u64,
    /// Handler name, e.g. "Linux Video Media Handler".
    pub name: String,
}

impl Track {
    pub(crate) fn new(index: usize, trak: &Trak) -> Self {
        let stbl = trak.stbl();
        let entry = stbl.stsd.first();

        let mut track = Self {
            index,
            id: trak.tkhd.track_id(),
            kind: trak.kind(),
            codec: entry.map(|e| e.format).unwrap_or_default(),
            width: trak.tkhd.width(),
            height: trak.tkhd.height(),
            depth: 0,
            sample_rate: 0.0,
            channels: 0,
            bits: 0,
            time_scale: trak.mdia.mdhd.time_scale(),
            sample_count: stbl.sample_count(),
            duration_ticks: stbl.stts.total_duration(),
            name: trak.mdia.hdlr.component_name().to_owned(),
        };

        if let Some(video) = entry.and_then(|e| e.video()) {
            // sample description is authoritative over tkhd
            track.width = video.width as u32;
            track.height = video.height as u32;
            track.depth = video.depth;
        }
        if let Some(audio) = entry.and_then(|e| e.audio()) {
            track.sample_rate = audio.sample_rate;
            track.channels = audio.channels;
            track.bits = audio.sample_size;
        }

        track
    }

    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    pub fn is_audio(&self) -> bool {
        self.kind == MediaKind::Sound
    }

    pub fn duration(&self) -> Duration {
        let time_scale = self.time_scale.max(1);
        Duration::seconds_f64(self.duration_ticks as f64 / time_scale as f64)
    }
}

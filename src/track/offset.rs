//! Per-sample byte offsets, sizes and durations, derived from
//! the sample table: `stsc` (samples per chunk), `stco`/`co64`
//! (chunk offsets), `stsz` (sample sizes) and `stts` (durations).

use rayon::iter::{IntoParallelIterator, ParallelIterator};
use time::Duration;

use crate::{atom_types::Stbl, ContainerError, FourCC};

/// Byte offset, size and duration of every sample in a track.
#[derive(Debug, Default, Clone)]
pub struct SampleOffsets {
    pub(crate) offsets: Vec<SampleOffset>
}

impl SampleOffsets {
    /// Expands chunk offsets into sample offsets.
    ///
    /// Chunks are independent once the index of their first
    /// sample is known, so they are resolved in parallel.
    pub fn new(stbl: &Stbl, time_scale: u32) -> Result<Self, ContainerError> {
        let chunks = stbl.stco.offsets();

        // First sample and sample count for each chunk (1-based in stsc).
        let mut first = 0_u64;
        let layout = (0 .. chunks.len())
            .map(|i| {
                let chunk = u32::try_from(i + 1)?;
                let count = stbl.stsc.samples_in_chunk(chunk)
                    .ok_or(ContainerError::NoSuchAtom(FourCC::Stsc))?;
                let entry = (chunks[i], first, count as u64);
                first += count as u64;
                Ok(entry)
            })
            .collect::<Result<Vec<(u64, u64, u64)>, ContainerError>>()?;

        let sample_count = stbl.stsz.len();
        let positions: Vec<(u64, u32)> = layout
            .into_par_iter()
            .map(|(chunk_offset, first, count)| {
                let mut delta = 0_u64;
                (first .. (first + count).min(sample_count))
                    .map(|s| {
                        let size = stbl.stsz.size_of_sample(s).unwrap_or(0);
                        let position = chunk_offset + delta;
                        delta += size as u64;
                        (position, size)
                    })
                    .collect::<Vec<_>>()
            })
            .flatten_iter()
            .collect();

        // Samples missing from 'stts' get zero duration.
        let durations = stbl.stts.durations().chain(std::iter::repeat(0));
        let offsets = positions.into_iter()
            .zip(durations)
            .map(|((position, size), ticks)| SampleOffset::new(position, size, ticks, time_scale))
            .collect();

        Ok(Self{offsets})
    }

    pub fn iter(&self) -> impl Iterator<Item = &SampleOffset> {
        self.offsets.iter()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn first(&self) -> Option<&SampleOffset> {
        self.offsets.first()
    }

    pub fn last(&self) -> Option<&SampleOffset> {
        self.offsets.last()
    }

    pub fn get(&self, index: usize) -> Option<&SampleOffset> {
        self.offsets.get(index)
    }
}

/// Sample offset consisting of byte offset (from `stco`/`co64`
/// and `stsc`), size in bytes (from `stsz`) and duration (from `stts`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleOffset {
    /// Offset in bytes from start of file.
    pub position: u64,
    /// Size in bytes.
    pub size: u32,
    /// Duration in the media's time scale.
    pub duration_ticks: u32,
    /// The sample's duration in seconds.
    pub duration: Duration
}

impl SampleOffset {
    /// A zero `time_scale` is treated as 1.
    pub fn new(position: u64, size: u32, duration_ticks: u32, time_scale: u32) -> Self {
        let time_scale = time_scale.max(1);
        let duration = Duration::seconds_f64(duration_ticks as f64 / time_scale as f64);
        Self{position, size, duration_ticks, duration}
    }
}

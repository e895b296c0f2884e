//! Time-to-sample atom (`stts`).
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stts`
//!
//! See <https://developer.apple.com/documentation/quicktime-file-format/time-to-sample_atom>

use binrw::binrw;

use crate::FourCC;

#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeToSample {
    pub(crate) sample_count: u32,
    pub(crate) sample_duration: u32,
}

impl TimeToSample {
    pub fn sample_count(&self) -> u32 {
        self.sample_count
    }

    pub fn sample_duration(&self) -> u32 {
        self.sample_duration
    }
}

/// Time to sample atom (`stts`).
///
/// Path: `moov/trak[multiple]/mdia/minf/stbl/stts`
///
/// See <https://developer.apple.com/documentation/quicktime-file-format/time-to-sample_atom>
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stts {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    #[br(temp)]
    #[bw(calc = table.len() as u32)]
    no_of_entries: u32,
    #[br(count = no_of_entries)]
    pub(crate) table: Vec<TimeToSample>,
}

binrw_atom!(Stts, FourCC::Stts);

impl Stts {
    /// Returns total number of samples.
    ///
    /// If an entry lists a duration for four samples,
    /// it counts as four entries towards the total.
    pub fn len(&self) -> u64 {
        self.table.iter()
            .map(|t| t.sample_count as u64)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn table(&self) -> &[TimeToSample] {
        &self.table
    }

    /// Appends one sample, extending the last run if
    /// it has the same duration.
    pub fn push(&mut self, duration: u32) {
        match self.table.last_mut() {
            Some(last) if last.sample_duration == duration => last.sample_count += 1,
            _ => self.table.push(TimeToSample{sample_count: 1, sample_duration: duration}),
        }
    }

    /// Sample durations in sample order, expanded lazily
    /// since run lengths come straight from the file.
    pub fn durations(&self) -> impl Iterator<Item = u32> + '_ {
        self.table.iter()
            .flat_map(|t| std::iter::repeat(t.sample_duration).take(t.sample_count as usize))
    }

    /// Sum of all sample durations, in media time units.
    pub fn total_duration(&self) -> u64 {
        self.table.iter()
            .map(|t| t.sample_count as u64 * t.sample_duration as u64)
            .sum()
    }

    /// Start time of `sample` (0-based), in media time units.
    pub fn time_of_sample(&self, sample: u64) -> u64 {
        let mut time = 0;
        let mut remaining = sample;
        for entry in self.table.iter() {
            let count = entry.sample_count as u64;
            if remaining < count {
                return time + remaining * entry.sample_duration as u64
            }
            time += count * entry.sample_duration as u64;
            remaining -= count;
        }
        time
    }

    /// The sample (0-based) playing at `time`, in media time units.
    pub fn sample_of_time(&self, time: u64) -> u64 {
        let mut start = 0;
        let mut sample = 0;
        for entry in self.table.iter() {
            let count = entry.sample_count as u64;
            let span = count * entry.sample_duration as u64;
            if time < start + span {
                return match entry.sample_duration {
                    0 => sample,
                    d => sample + (time - start) / d as u64,
                }
            }
            start += span;
            sample += count;
        }
        sample
    }
}

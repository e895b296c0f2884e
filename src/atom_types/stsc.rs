//! Sample to chunk atom (`stsc`)
//!
//! Location: `moov/trak[multiple]/mdia/minf/stbl/stsc`
//!
//! See:
//! - Sample to chunk atom: <https://developer.apple.com/documentation/quicktime-file-format/sample-to-chunk_atom>
//! - Sample to chunk table: <https://developer.apple.com/documentation/quicktime-file-format/sample-to-chunk_atom/sample-to-chunk_table>

use binrw::binrw;

use crate::FourCC;

/// Sample to chunk atom (`stsc`)
#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stsc {
    pub(crate) version: u8,
    pub(crate) flags: [u8; 3],
    #[br(temp)]
    #[bw(calc = sample_to_chunk_table.len() as u32)]
    no_of_entries: u32,
    #[br(count = no_of_entries)]
    pub(crate) sample_to_chunk_table: Vec<SampleToChunk>,
}

binrw_atom!(Stsc, FourCC::Stsc);

impl Stsc {
    pub fn table(&self) -> &[SampleToChunk] {
        &self.sample_to_chunk_table
    }

    /// Returns number of samples for specified chunk.
    ///
    /// > Important: The `first_chunk` field in an `stsc`
    /// > atom starts on 1,
    /// > so `chunk` is also a 1-based index.
    pub fn samples_in_chunk(&self, chunk: u32) -> Option<u32> {
        // last entry with first_chunk <= chunk
        let idx = self.sample_to_chunk_table.partition_point(|s| s.first_chunk <= chunk);
        idx.checked_sub(1)
            .map(|i| self.sample_to_chunk_table[i].samples_per_chunk)
    }

    /// Returns the chunk containing `sample` (0-based) as
    /// `(CHUNK, FIRST_SAMPLE_IN_CHUNK)`, where `CHUNK` is 1-based.
    /// The last entry extends indefinitely.
    pub fn chunk_of_sample(&self, sample: u64) -> Option<(u32, u64)> {
        let mut first_sample = 0_u64;
        for (i, entry) in self.sample_to_chunk_table.iter().enumerate() {
            let per_chunk = entry.samples_per_chunk as u64;
            if per_chunk == 0 {
                continue
            }
            let run = self.sample_to_chunk_table.get(i + 1)
                .map(|next| next.first_chunk.saturating_sub(entry.first_chunk) as u64 * per_chunk);
            match run {
                Some(samples) if sample >= first_sample + samples => first_sample += samples,
                _ => {
                    let k = (sample - first_sample) / per_chunk;
                    let chunk = entry.first_chunk.checked_add(u32::try_from(k).ok()?)?;
                    return Some((chunk, first_sample + k * per_chunk))
                }
            }
        }
        None
    }

    /// Total number of samples in `total_chunks` chunks.
    pub fn len(&self, total_chunks: u32) -> u64 {
        let mut sum = 0;
        for (i, entry) in self.sample_to_chunk_table.iter().enumerate() {
            let end = self.sample_to_chunk_table.get(i + 1)
                .map(|next| next.first_chunk)
                .unwrap_or(total_chunks + 1);
            sum += end.saturating_sub(entry.first_chunk) as u64 * entry.samples_per_chunk as u64;
        }
        sum
    }

    /// Registers chunk `chunk` (1-based) holding `samples` samples,
    /// adding an entry only when the count changes.
    pub fn push_chunk(&mut self, chunk: u32, samples: u32, sample_description_id: u32) {
        match self.sample_to_chunk_table.last() {
            Some(last) if last.samples_per_chunk == samples
                && last.sample_description_id == sample_description_id => (),
            _ => self.sample_to_chunk_table.push(SampleToChunk{
                first_chunk: chunk,
                samples_per_chunk: samples,
                sample_description_id,
            }),
        }
    }
}

#[binrw]
#[brw(big)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleToChunk {
    /// 1-based index of first chunk
    /// that contains the number of
    /// samples specified in `samples_per_chunk`.
    /// The following chunks will all contain the
    /// same number of samples until the next
    /// sample to chunk entry.
    pub(crate) first_chunk: u32,
    /// Number of samples for chunk number
    /// specified by `first_chunk` and on,
    /// until the next sample to chunk entry.
    pub(crate) samples_per_chunk: u32,
    pub(crate) sample_description_id: u32,
}

impl SampleToChunk {
    pub fn new(first_chunk: u32, samples_per_chunk: u32, sample_description_id: u32) -> Self {
        Self{first_chunk, samples_per_chunk, sample_description_id}
    }
}

//! Per-stream chunk table, resolved from whichever index the file has.

/// Location of one chunk's data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkEntry {
    /// Absolute offset of the chunk data, after the 8-byte header.
    pub offset: u64,
    pub size: u32,
    pub keyframe: bool,
    /// Samples held by the chunk.
    pub samples: u32,
}

/// All chunks of one stream, in file order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkTable {
    entries: Vec<ChunkEntry>,
    /// `first_sample[i]` is the number of samples before chunk `i`.
    first_sample: Vec<u64>,
    total_samples: u64,
}

impl ChunkTable {
    pub fn push(&mut self, entry: ChunkEntry) {
        self.first_sample.push(self.total_samples);
        self.total_samples += entry.samples as u64;
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_samples(&self) -> u64 {
        self.total_samples
    }

    pub fn get(&self, chunk: usize) -> Option<&ChunkEntry> {
        self.entries.get(chunk)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChunkEntry> {
        self.entries.iter()
    }

    /// Chunk holding `sample`, and the first sample of that chunk.
    ///
    /// Chunks holding no samples are never returned.
    pub fn chunk_of_sample(&self, sample: u64) -> Option<(usize, u64)> {
        if sample >= self.total_samples {
            return None
        }
        // last chunk starting at or before `sample`
        let chunk = self.first_sample.partition_point(|first| *first <= sample).checked_sub(1)?;
        Some((chunk, self.first_sample[chunk]))
    }
}

impl FromIterator<ChunkEntry> for ChunkTable {
    fn from_iter<I: IntoIterator<Item = ChunkEntry>>(iter: I) -> Self {
        let mut table = Self::default();
        iter.into_iter().for_each(|e| table.push(e));
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(samples: u32) -> ChunkEntry {
        ChunkEntry{offset: 0, size: samples, keyframe: true, samples}
    }

    #[test]
    fn lookup() {
        let table: ChunkTable = [4, 0, 3, 1].into_iter().map(entry).collect();
        assert_eq!(table.total_samples(), 8);
        assert_eq!(table.chunk_of_sample(0), Some((0, 0)));
        assert_eq!(table.chunk_of_sample(3), Some((0, 0)));
        // chunk 1 is empty
        assert_eq!(table.chunk_of_sample(4), Some((2, 4)));
        assert_eq!(table.chunk_of_sample(6), Some((2, 4)));
        assert_eq!(table.chunk_of_sample(7), Some((3, 7)));
        assert_eq!(table.chunk_of_sample(8), None);
    }

    #[test]
    fn empty() {
        assert_eq!(ChunkTable::default().chunk_of_sample(0), None);
    }
}

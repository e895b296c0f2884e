/// Nearest-neighbour lookup tables from output to input
/// coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScaleTables {
    /// Input column for each output column.
    pub column_table: Vec<usize>,
    /// Input row for each output row.
    pub row_table: Vec<usize>,
}

impl ScaleTables {
    /// Tables mapping an `out_w` x `out_h` output onto the
    /// input rectangle `in_x, in_y, in_w, in_h`.
    pub fn new(
        in_x: u32,
        in_y: u32,
        in_w: u32,
        in_h: u32,
        out_w: u32,
        out_h: u32,
    ) -> Self {
        Self {
            column_table: Self::table(in_x, in_w, out_w),
            row_table: Self::table(in_y, in_h, out_h),
        }
    }

    fn table(offset: u32, input: u32, output: u32) -> Vec<usize> {
        (0 .. output as u64)
            .map(|i| (i * input as u64 / output as u64 + offset as u64) as usize)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::ScaleTables;

    #[test]
    fn identity() {
        let t = ScaleTables::new(0, 0, 4, 3, 4, 3);
        assert_eq!(t.column_table, vec![0, 1, 2, 3]);
        assert_eq!(t.row_table, vec![0, 1, 2]);
    }

    #[test]
    fn downscale_with_offset() {
        let t = ScaleTables::new(2, 1, 8, 4, 4, 2);
        assert_eq!(t.column_table, vec![2, 4, 6, 8]);
        assert_eq!(t.row_table, vec![1, 3]);
    }

    #[test]
    fn upscale_repeats() {
        let t = ScaleTables::new(0, 0, 2, 2, 4, 4);
        assert_eq!(t.column_table, vec![0, 0, 1, 1]);
        assert_eq!(t.row_table, vec![0, 0, 1, 1]);
    }

    #[test]
    fn empty_output() {
        let t = ScaleTables::new(0, 0, 2, 2, 0, 0);
        assert!(t.column_table.is_empty());
        assert!(t.row_table.is_empty());
    }
}

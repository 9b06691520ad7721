use crate::utils::constants::MEASUREMENTS_PREFIX;
use std::path::{Path, PathBuf};

/// Decimal width of the largest partition index (`partitions - 1`).
pub fn index_width(partitions: u32) -> usize {
    partitions.saturating_sub(1).max(1).ilog10() as usize + 1
}

/// File name for one partition: `measurements-<index>.<ext>`, with the
/// index zero-padded so lexicographic and numeric order coincide.
pub fn partition_file_name(index: u32, partitions: u32, extension: &str) -> String {
    format!(
        "{}-{:0width$}.{}",
        MEASUREMENTS_PREFIX,
        index,
        extension,
        width = index_width(partitions)
    )
}

pub fn partition_path(dir: &Path, index: u32, partitions: u32, extension: &str) -> PathBuf {
    dir.join(partition_file_name(index, partitions, extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_width() {
        assert_eq!(index_width(1), 1);
        assert_eq!(index_width(10), 1);
        assert_eq!(index_width(11), 2);
        assert_eq!(index_width(100), 2);
        assert_eq!(index_width(101), 3);
    }

    #[test]
    fn test_ten_partitions_are_single_digit() {
        let names: Vec<String> = (0..10).map(|i| partition_file_name(i, 10, "csv")).collect();

        assert_eq!(names.first().unwrap(), "measurements-0.csv");
        assert_eq!(names.last().unwrap(), "measurements-9.csv");
    }

    #[test]
    fn test_lexicographic_matches_numeric_order() {
        let names: Vec<String> = (0..120)
            .map(|i| partition_file_name(i, 120, "parquet"))
            .collect();

        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names[7], "measurements-007.parquet");
    }

    #[test]
    fn test_partition_path() {
        let path = partition_path(Path::new("/data"), 3, 12, "csv");
        assert_eq!(path, PathBuf::from("/data/measurements-03.csv"));
    }
}

//! Segment file naming and discovery.

use std::fs;
use std::path::{Path, PathBuf};

use crate::shared::error::{AppError, AppResult};

pub const SEGMENT_PREFIX: &str = "translation_history_";
pub const SEGMENT_EXTENSION: &str = "csv";

/// Staging file for a rewrite that has not reached its commit point.
pub const REWRITE_TMP: &str = "rewrite.tmp";
/// Fully written rewrite content waiting to replace every segment.
pub const REWRITE_PENDING: &str = "rewrite.pending";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentFile {
    pub seq: u64,
    pub path: PathBuf,
}

pub fn segment_file_name(seq: u64) -> String {
    format!("{}{:06}.{}", SEGMENT_PREFIX, seq, SEGMENT_EXTENSION)
}

pub fn segment_path(dir: &Path, seq: u64) -> PathBuf {
    dir.join(segment_file_name(seq))
}

/// Sequence number encoded in a segment file name. Accepts unpadded legacy
/// names such as `translation_history_12.csv`.
pub fn parse_segment_seq(file_name: &str) -> Option<u64> {
    let stem = file_name
        .strip_prefix(SEGMENT_PREFIX)?
        .strip_suffix(SEGMENT_EXTENSION)?
        .strip_suffix('.')?;
    if stem.is_empty() || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    stem.parse().ok()
}

/// All segments on disk, oldest first.
pub fn list_segments(dir: &Path) -> AppResult<Vec<SegmentFile>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(AppError::Storage(format!(
                "Failed to list history directory {}: {}",
                dir.display(),
                e
            )))
        }
    };

    let mut segments: Vec<SegmentFile> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|entry| {
            let name = entry.file_name();
            let seq = parse_segment_seq(name.to_str()?)?;
            Some(SegmentFile { seq, path: entry.path() })
        })
        .collect();

    segments.sort_by_key(|segment| segment.seq);
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_segment_seq() {
        assert_eq!(parse_segment_seq("translation_history_000007.csv"), Some(7));
        assert_eq!(parse_segment_seq("translation_history_12.csv"), Some(12));
        assert_eq!(parse_segment_seq("translation_history_.csv"), None);
        assert_eq!(parse_segment_seq("translation_history_3.csv.bak"), None);
        assert_eq!(parse_segment_seq("translation_history_x1.csv"), None);
        assert_eq!(parse_segment_seq(REWRITE_PENDING), None);
    }

    #[test]
    fn test_listing_sorts_numerically() {
        let dir = TempDir::new().unwrap();
        for name in [
            "translation_history_10.csv",
            "translation_history_2.csv",
            "translation_history_000009.csv",
            "notes.txt",
            REWRITE_TMP,
        ] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }

        let seqs: Vec<u64> = list_segments(dir.path())
            .unwrap()
            .into_iter()
            .map(|s| s.seq)
            .collect();
        assert_eq!(seqs, vec![2, 9, 10]);
    }

    #[test]
    fn test_missing_directory_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        assert!(list_segments(&missing).unwrap().is_empty());
    }
}

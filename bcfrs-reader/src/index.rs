//! The coordinate-range index collaborator. Range queries only need one
//! operation from an index: contig + interval in, ordered virtual-offset
//! spans out. The on-disk CSI format is handled by noodles; anything else
//! implementing [`VariantIndex`] works too.

use std::io;
use std::path::{Path, PathBuf};

use noodles::core::{Position, region::Interval};
use noodles::csi::{self, BinningIndex};

use bcfrs_core::{BcfError, Result};

/// File extension of CSI indexes, appended to the data file name.
pub const INDEX_EXTENSION: &str = "csi";

/// Delimiter of `file##idx##index` pseudo-paths.
const PATH_INDEX_DELIMITER: &str = "##idx##";

/// A span of BGZF virtual offsets that may contain matching records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

/// Maps a contig index and a 1-based inclusive interval to the ordered
/// file spans a range query has to visit.
pub trait VariantIndex {
    fn spans(&self, tid: usize, start: u32, end: u32) -> Result<Vec<Span>>;
}

impl VariantIndex for csi::Index {
    fn spans(&self, tid: usize, start: u32, end: u32) -> Result<Vec<Span>> {
        let invalid =
            |e: noodles::core::position::TryFromIntError| io::Error::new(io::ErrorKind::InvalidInput, e);
        let start = Position::try_from(start.max(1) as usize).map_err(invalid)?;
        let end = Position::try_from(end.max(1) as usize).map_err(invalid)?;
        let chunks = self.query(tid, Interval::from(start..=end))?;
        Ok(chunks
            .into_iter()
            .map(|chunk| Span {
                start: u64::from(chunk.start()),
                end: u64::from(chunk.end()),
            })
            .collect())
    }
}

/// Split a `file##idx##index` pseudo-path into its two halves.
pub fn split_path_and_index(spec: &str) -> (&str, Option<&str>) {
    match spec.split_once(PATH_INDEX_DELIMITER) {
        Some((path, index)) => (path, Some(index)),
        None => (spec, None),
    }
}

/// Sibling `.csi` path for a data file, when it exists on disk.
pub fn find_index<P: AsRef<Path>>(path: P) -> Option<PathBuf> {
    let path = path.as_ref();
    let file_name = path.file_name()?.to_str()?;
    let sibling = path.with_file_name(format!("{}.{}", file_name, INDEX_EXTENSION));
    sibling.is_file().then_some(sibling)
}

/// Load a CSI index from disk.
pub fn read_index<P: AsRef<Path>>(path: P) -> Result<csi::Index> {
    csi::read(path).map_err(BcfError::Io)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_path_and_index() {
        assert_eq!(split_path_and_index("a.bcf"), ("a.bcf", None));
        assert_eq!(
            split_path_and_index("a.bcf##idx##b.csi"),
            ("a.bcf", Some("b.csi"))
        );
    }

    #[test]
    fn test_find_index() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("sample.bcf");
        std::fs::write(&data, b"x").unwrap();
        assert_eq!(find_index(&data), None);

        let csi = dir.path().join("sample.bcf.csi");
        std::fs::write(&csi, b"x").unwrap();
        assert_eq!(find_index(&data), Some(csi));
    }
}

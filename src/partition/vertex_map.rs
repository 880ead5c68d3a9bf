//! Vertex→host assignment file and the prior-partition meta file.
//!
//! The vertex map is a binary file of one little-endian `i32` per global
//! node id: entry `i` is the owning host of GID `i`. Each host reads only
//! the slice covering its master range, at byte offset `lo * 4`.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::ops::Range;
use std::path::Path;

use crate::error::SubstrateError;

fn io_err(path: &Path, source: std::io::Error) -> SubstrateError {
    SubstrateError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// One host's slice of the vertex→host map.
#[derive(Debug)]
pub struct VertexHostMap {
    lo: u64,
    entries: Vec<i32>,
}

impl VertexHostMap {
    /// Read entries `[range.start, range.end)` and validate every host id
    /// against `num_hosts`. A missing file is a fatal configuration error.
    pub fn load(
        path: impl AsRef<Path>,
        range: Range<u64>,
        num_hosts: usize,
    ) -> Result<Self, SubstrateError> {
        let path = path.as_ref();
        let n = (range.end - range.start) as usize;
        let mut file = File::open(path).map_err(|e| io_err(path, e))?;
        file.seek(SeekFrom::Start(range.start * 4))
            .map_err(|e| io_err(path, e))?;
        let mut bytes = vec![0u8; n * 4];
        file.read_exact(&mut bytes).map_err(|e| io_err(path, e))?;
        let entries: Vec<i32> = bytemuck::pod_collect_to_vec(&bytes);

        for (offset, &host) in entries.iter().enumerate() {
            if host < 0 || host as usize >= num_hosts {
                return Err(SubstrateError::InvalidHostEntry {
                    offset,
                    host,
                    num_hosts,
                });
            }
        }
        Ok(Self {
            lo: range.start,
            entries,
        })
    }

    /// Entries held.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the slice is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Owning host of the node at `offset` within this slice.
    ///
    /// An out-of-range offset is a caller bug, not a lookup miss.
    #[inline]
    pub fn find_host(&self, offset: u64) -> u32 {
        assert!(
            (offset as usize) < self.entries.len(),
            "vertex-map offset {offset} out of range {}",
            self.entries.len()
        );
        self.entries[offset as usize] as u32
    }

    /// Owning host of global id `gid` (must fall in this slice's range).
    #[inline]
    pub fn host_of_gid(&self, gid: u64) -> u32 {
        self.find_host(gid - self.lo)
    }
}

/// Write a full vertex→host map file. Fixture and tooling helper.
pub fn write_vertex_map(path: impl AsRef<Path>, hosts: &[i32]) -> Result<(), SubstrateError> {
    let path = path.as_ref();
    let mut file = File::create(path).map_err(|e| io_err(path, e))?;
    file.write_all(bytemuck::cast_slice(hosts))
        .map_err(|e| io_err(path, e))?;
    Ok(())
}

/// One record of a previously computed partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInfo {
    /// Global node id.
    pub global: u64,
    /// Local id the node had on its host.
    pub local: u64,
    /// Owning host.
    pub owner: u64,
}

/// Read a partition meta file: `u64` record count, then
/// `(global, local, owner)` `u64` triples.
pub fn read_meta_file(path: impl AsRef<Path>) -> Result<Vec<NodeInfo>, SubstrateError> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut count_bytes = [0u8; 8];
    file.read_exact(&mut count_bytes).map_err(|e| io_err(path, e))?;
    let expected = u64::from_le_bytes(count_bytes);

    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| io_err(path, e))?;
    let words: Vec<u64> = bytemuck::pod_collect_to_vec(&bytes[..bytes.len() - bytes.len() % 8]);
    let read = (words.len() / 3) as u64;
    if read < expected {
        return Err(SubstrateError::TruncatedMetaFile {
            path: path.to_path_buf(),
            expected,
            read,
        });
    }
    Ok(words
        .chunks_exact(3)
        .take(expected as usize)
        .map(|c| NodeInfo {
            global: c[0],
            local: c[1],
            owner: c[2],
        })
        .collect())
}

/// Write a partition meta file. Fixture and tooling helper.
pub fn write_meta_file(
    path: impl AsRef<Path>,
    records: &[NodeInfo],
) -> Result<(), SubstrateError> {
    let path = path.as_ref();
    let mut out = Vec::with_capacity(8 + records.len() * 24);
    out.extend_from_slice(&(records.len() as u64).to_le_bytes());
    for r in records {
        out.extend_from_slice(&r.global.to_le_bytes());
        out.extend_from_slice(&r.local.to_le_bytes());
        out.extend_from_slice(&r.owner.to_le_bytes());
    }
    let mut file = File::create(path).map_err(|e| io_err(path, e))?;
    file.write_all(&out).map_err(|e| io_err(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_read_at_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vmap.bin");
        write_vertex_map(&path, &[0, 0, 1, 1, 2, 2]).unwrap();
        let m = VertexHostMap::load(&path, 2..5, 3).unwrap();
        assert_eq!(m.len(), 3);
        assert_eq!(m.find_host(0), 1);
        assert_eq!(m.find_host(2), 2);
        assert_eq!(m.host_of_gid(3), 1);
    }

    #[test]
    fn rejects_out_of_range_host() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vmap.bin");
        write_vertex_map(&path, &[0, 7]).unwrap();
        let err = VertexHostMap::load(&path, 0..2, 2).unwrap_err();
        assert!(matches!(
            err,
            SubstrateError::InvalidHostEntry { offset: 1, host: 7, num_hosts: 2 }
        ));
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = VertexHostMap::load("/nonexistent/vmap.bin", 0..1, 1).unwrap_err();
        assert!(matches!(err, SubstrateError::Io { .. }));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn out_of_range_offset_is_a_bug() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vmap.bin");
        write_vertex_map(&path, &[0]).unwrap();
        let m = VertexHostMap::load(&path, 0..1, 1).unwrap();
        m.find_host(5);
    }

    #[test]
    fn meta_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.meta");
        let records = vec![
            NodeInfo { global: 9, local: 0, owner: 1 },
            NodeInfo { global: 11, local: 1, owner: 0 },
        ];
        write_meta_file(&path, &records).unwrap();
        assert_eq!(read_meta_file(&path).unwrap(), records);
    }

    #[test]
    fn truncated_meta_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.meta");
        let mut bytes = 5u64.to_le_bytes().to_vec();
        bytes.extend_from_slice(&1u64.to_le_bytes());
        std::fs::write(&path, bytes).unwrap();
        let err = read_meta_file(&path).unwrap_err();
        assert!(matches!(
            err,
            SubstrateError::TruncatedMetaFile { expected: 5, read: 0, .. }
        ));
    }
}

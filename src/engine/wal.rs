//! MVSTORE - Write-Ahead Log (WAL)
//! Every mutation batch is appended as a single frame before it is
//! applied to the MemTable, so a batch is either replayed whole on
//! recovery or not at all.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

use super::batch::Mutation;

/// Frame type for WAL entries.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(u8)]
enum FrameKind {
    /// A batch submitted by a caller.
    Batch = 1,
    /// Live cells rewritten by compaction.
    Checkpoint = 2,
}

impl FrameKind {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(FrameKind::Batch),
            2 => Some(FrameKind::Checkpoint),
            _ => None,
        }
    }
}

const HEADER_LEN: usize = 1 + 4;
const CRC_LEN: usize = 4;

/// Write-Ahead Log for crash recovery and batch atomicity.
///
/// ## Binary Format (per frame)
/// ```text
/// [kind: 1 byte][payload_len: 4 bytes (LE)][payload: bincode Vec<Mutation>][crc: 4 bytes (LE)]
/// ```
/// The CRC covers kind, length and payload.
pub struct WriteAheadLog {
    /// Path to the WAL file on disk.
    path: PathBuf,
    /// File handle opened for appending.
    file: File,
    /// fsync after every frame.
    sync: bool,
    /// A failed append could not be cut back; the tail may hold a partial frame.
    poisoned: bool,
}

/// Batches read back from disk.
#[derive(Debug, Default)]
pub struct Recovered {
    pub batches: Vec<Vec<Mutation>>,
    pub checkpoint_frames: usize,
    /// A torn trailing frame was found and dropped.
    pub torn_tail: bool,
}

impl WriteAheadLog {
    /// Open or create a WAL file at the specified path.
    pub fn open(path: PathBuf, sync: bool) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file,
            sync,
            poisoned: false,
        })
    }

    /// Returns the path to the WAL file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode_frame(kind: FrameKind, mutations: &[Mutation]) -> Result<Vec<u8>> {
        let payload = bincode::serialize(mutations)?;
        let mut buf = Vec::with_capacity(HEADER_LEN + payload.len() + CRC_LEN);
        buf.push(kind as u8);
        buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        buf.extend_from_slice(&payload);
        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        Ok(buf)
    }

    /// Append one batch as a single frame.
    ///
    /// A failed write is cut back to the last whole frame, so a partial
    /// frame never ends up in front of later ones. If the cut fails too the
    /// log refuses further appends until `rewrite` replaces it.
    pub fn append_batch(&mut self, mutations: &[Mutation]) -> Result<()> {
        if self.poisoned {
            return Err(StoreError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("WAL {:?} has an unrecovered partial frame", self.path),
            )));
        }
        let encoded = Self::encode_frame(FrameKind::Batch, mutations)?;
        let committed_len = self.file.metadata()?.len();

        if let Err(e) = self.write_frame(&encoded) {
            log::error!("WAL append failed at offset {}: {}", committed_len, e);
            self.rollback(committed_len);
            return Err(e.into());
        }
        Ok(())
    }

    fn write_frame(&mut self, encoded: &[u8]) -> io::Result<()> {
        self.file.write_all(encoded)?;
        if self.sync {
            self.file.sync_all()?;
        }
        Ok(())
    }

    fn rollback(&mut self, committed_len: u64) {
        let cut = self
            .file
            .set_len(committed_len)
            .and_then(|_| if self.sync { self.file.sync_all() } else { Ok(()) });
        if let Err(e) = cut {
            log::error!(
                "Could not truncate {:?} back to {} bytes: {}",
                self.path,
                committed_len,
                e
            );
            self.poisoned = true;
        }
    }

    /// Replace the log with checkpoint frames holding the given mutations.
    /// The new log is written beside the old one and renamed over it.
    pub fn rewrite(&mut self, chunks: &[Vec<Mutation>]) -> Result<()> {
        let tmp_path = self.path.with_extension("wal.tmp");
        {
            let mut tmp = File::create(&tmp_path)?;
            for chunk in chunks {
                tmp.write_all(&Self::encode_frame(FrameKind::Checkpoint, chunk)?)?;
            }
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.poisoned = false;
        Ok(())
    }

    /// Read every intact frame from the log at `path`.
    ///
    /// An incomplete or checksum-failing *final* frame is a write torn by a
    /// crash and is dropped. A bad frame followed by more data is corruption.
    pub fn recover(path: &Path) -> Result<Recovered> {
        let mut recovered = Recovered::default();
        if !path.exists() {
            return Ok(recovered);
        }
        let buf = fs::read(path)?;
        let mut offset = 0;

        while offset < buf.len() {
            let remaining = buf.len() - offset;
            if remaining < HEADER_LEN + CRC_LEN {
                recovered.torn_tail = true;
                break;
            }
            let kind_byte = buf[offset];
            let mut len_bytes = [0u8; 4];
            len_bytes.copy_from_slice(&buf[offset + 1..offset + HEADER_LEN]);
            let payload_len = u32::from_le_bytes(len_bytes) as usize;
            let frame_len = HEADER_LEN + payload_len + CRC_LEN;
            if remaining < frame_len {
                recovered.torn_tail = true;
                break;
            }

            let body_end = offset + HEADER_LEN + payload_len;
            let mut crc_bytes = [0u8; 4];
            crc_bytes.copy_from_slice(&buf[body_end..body_end + CRC_LEN]);
            let expected = u32::from_le_bytes(crc_bytes);
            let is_last = offset + frame_len == buf.len();

            if crc32fast::hash(&buf[offset..body_end]) != expected {
                if is_last {
                    recovered.torn_tail = true;
                    break;
                }
                return Err(StoreError::Corruption(format!(
                    "WAL frame at offset {} failed its checksum",
                    offset
                )));
            }

            let kind = FrameKind::from_byte(kind_byte).ok_or_else(|| {
                StoreError::Corruption(format!("unknown WAL frame kind {}", kind_byte))
            })?;
            let mutations: Vec<Mutation> =
                bincode::deserialize(&buf[offset + HEADER_LEN..body_end]).map_err(|e| {
                    StoreError::RecoveryFailed(format!("frame at offset {}: {}", offset, e))
                })?;

            if kind == FrameKind::Checkpoint {
                recovered.checkpoint_frames += 1;
            }
            recovered.batches.push(mutations);
            offset += frame_len;
        }

        if recovered.torn_tail {
            log::warn!(
                "Discarded torn frame at offset {} of {:?}",
                offset,
                path
            );
            // cut the torn bytes so later appends follow the last good frame
            let file = OpenOptions::new().write(true).open(path)?;
            file.set_len(offset as u64)?;
        }
        Ok(recovered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memtable::Cell;
    use crate::engine::ColumnFamily;

    fn put(column: &str) -> Mutation {
        Mutation::PutColumn {
            family: ColumnFamily::MapKeys,
            row: b"row".to_vec(),
            column: column.as_bytes().to_vec(),
            cell: Cell::new(Vec::new()),
        }
    }

    #[test]
    fn test_append_and_recover() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");
        {
            let mut wal = WriteAheadLog::open(path.clone(), true).unwrap();
            wal.append_batch(&[put("a"), put("b")]).unwrap();
            wal.append_batch(&[put("c")]).unwrap();
        }
        let recovered = WriteAheadLog::recover(&path).unwrap();
        assert_eq!(recovered.batches.len(), 2);
        assert_eq!(recovered.batches[0], vec![put("a"), put("b")]);
        assert!(!recovered.torn_tail);
    }

    #[test]
    fn test_missing_file_recovers_empty() {
        let dir = tempfile::tempdir().unwrap();
        let recovered = WriteAheadLog::recover(&dir.path().join("absent.wal")).unwrap();
        assert!(recovered.batches.is_empty());
    }

    #[test]
    fn test_torn_tail_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");
        {
            let mut wal = WriteAheadLog::open(path.clone(), true).unwrap();
            wal.append_batch(&[put("a")]).unwrap();
            wal.append_batch(&[put("b")]).unwrap();
        }
        let len = fs::metadata(&path).unwrap().len();
        let file = OpenOptions::new().write(true).open(&path).unwrap();
        file.set_len(len - 3).unwrap();

        let recovered = WriteAheadLog::recover(&path).unwrap();
        assert_eq!(recovered.batches, vec![vec![put("a")]]);
        assert!(recovered.torn_tail);

        // the torn bytes are gone, so a second recovery is clean
        let again = WriteAheadLog::recover(&path).unwrap();
        assert!(!again.torn_tail);
    }

    #[test]
    fn test_corrupt_middle_frame_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");
        {
            let mut wal = WriteAheadLog::open(path.clone(), true).unwrap();
            wal.append_batch(&[put("a")]).unwrap();
            wal.append_batch(&[put("b")]).unwrap();
        }
        let mut bytes = fs::read(&path).unwrap();
        bytes[HEADER_LEN + 2] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(
            WriteAheadLog::recover(&path),
            Err(StoreError::Corruption(_))
        ));
    }

    #[test]
    fn test_partial_append_is_cut_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");
        let mut wal = WriteAheadLog::open(path.clone(), true).unwrap();
        wal.append_batch(&[put("a")]).unwrap();

        // half a frame reaches the file before the write fails
        let committed_len = wal.file.metadata().unwrap().len();
        let frame = WriteAheadLog::encode_frame(FrameKind::Batch, &[put("lost")]).unwrap();
        wal.file.write_all(&frame[..frame.len() / 2]).unwrap();
        wal.rollback(committed_len);
        assert!(!wal.poisoned);

        wal.append_batch(&[put("b")]).unwrap();
        let recovered = WriteAheadLog::recover(&path).unwrap();
        assert_eq!(recovered.batches, vec![vec![put("a")], vec![put("b")]]);
        assert!(!recovered.torn_tail);
    }

    #[test]
    fn test_failed_append_refuses_later_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");
        let mut wal = WriteAheadLog::open(path.clone(), false).unwrap();
        wal.append_batch(&[put("a")]).unwrap();

        // neither the write nor the truncate can go through a read-only handle
        wal.file = File::open(&path).unwrap();
        assert!(wal.append_batch(&[put("b")]).is_err());
        assert!(wal.poisoned);

        wal.file = OpenOptions::new().append(true).open(&path).unwrap();
        assert!(matches!(
            wal.append_batch(&[put("c")]),
            Err(StoreError::Io(_))
        ));

        let recovered = WriteAheadLog::recover(&path).unwrap();
        assert_eq!(recovered.batches, vec![vec![put("a")]]);

        wal.rewrite(&recovered.batches).unwrap();
        wal.append_batch(&[put("d")]).unwrap();
        let recovered = WriteAheadLog::recover(&path).unwrap();
        assert_eq!(recovered.batches, vec![vec![put("a")], vec![put("d")]]);
    }

    #[test]
    fn test_rewrite_replaces_frames() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wal");
        let mut wal = WriteAheadLog::open(path.clone(), false).unwrap();
        wal.append_batch(&[put("a")]).unwrap();
        wal.append_batch(&[put("b")]).unwrap();

        wal.rewrite(&[vec![put("b")]]).unwrap();
        wal.append_batch(&[put("c")]).unwrap();

        let recovered = WriteAheadLog::recover(&path).unwrap();
        assert_eq!(recovered.batches, vec![vec![put("b")], vec![put("c")]]);
        assert_eq!(recovered.checkpoint_frames, 1);
    }
}

//! Journal record framing
//!
//! ```text
//! +------------------+
//! | Record Length    | (u32 LE, whole record incl. length and checksum)
//! +------------------+
//! | Op               | (u8)
//! +------------------+
//! | Payload          | (Record Length - 9 bytes)
//! +------------------+
//! | Checksum         | (u32 LE, CRC32 over length, op and payload)
//! +------------------+
//! ```
//!
//! The meaning of op and payload is up to the journal owner.

use super::errors::{StorageError, StorageResult};

/// Length prefix, op byte and checksum
pub const MIN_RECORD_SIZE: usize = 4 + 1 + 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub op: u8,
    pub payload: Vec<u8>,
}

impl Record {
    pub fn new(op: u8, payload: Vec<u8>) -> Self {
        Self { op, payload }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let record_length = (MIN_RECORD_SIZE + self.payload.len()) as u32;
        let mut buf = Vec::with_capacity(record_length as usize);
        buf.extend_from_slice(&record_length.to_le_bytes());
        buf.push(self.op);
        buf.extend_from_slice(&self.payload);
        let checksum = crc32fast::hash(&buf);
        buf.extend_from_slice(&checksum.to_le_bytes());
        buf
    }

    /// Deserializes the record starting at the beginning of `data`.
    ///
    /// `offset` is the position of `data` within the file and only used for
    /// error reporting. Returns the record and the number of bytes consumed.
    pub fn deserialize(data: &[u8], offset: u64) -> StorageResult<(Self, usize)> {
        if data.len() < MIN_RECORD_SIZE {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!(
                    "truncated record: {} bytes remaining, minimum record size is {}",
                    data.len(),
                    MIN_RECORD_SIZE
                ),
            ));
        }

        let record_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
        if record_length < MIN_RECORD_SIZE {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!("invalid record length: {}", record_length),
            ));
        }
        if record_length > data.len() {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!(
                    "record length {} exceeds remaining file size {}",
                    record_length,
                    data.len()
                ),
            ));
        }

        let checksum_offset = record_length - 4;
        let stored = u32::from_le_bytes([
            data[checksum_offset],
            data[checksum_offset + 1],
            data[checksum_offset + 2],
            data[checksum_offset + 3],
        ]);
        let computed = crc32fast::hash(&data[..checksum_offset]);
        if computed != stored {
            return Err(StorageError::corruption_at_offset(
                offset,
                format!(
                    "checksum mismatch: computed {:08x}, stored {:08x}",
                    computed, stored
                ),
            ));
        }

        Ok((
            Self {
                op: data[4],
                payload: data[5..checksum_offset].to_vec(),
            },
            record_length,
        ))
    }
}

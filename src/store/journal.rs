//! Operations of the persistent store journal.
//!
//! Payloads per op:
//!
//! - CREATED: RFC 3339 creation timestamp, first record of every journal
//! - PUT: `[normalized key length u32 LE][normalized key][IndexName JSON]`
//! - DELETE: `[key u32 LE][normalized key]`
//! - CLEAR: empty

use chrono::{DateTime, Utc};

use super::errors::{StoreError, StoreResult};
use crate::model::{IndexName, NameKey};
use crate::storage::Record;

/// File name of the journal inside the index directory
pub const JOURNAL_FILE: &str = "nidx.dat";

const OP_CREATED: u8 = 0;
const OP_PUT: u8 = 1;
const OP_DELETE: u8 = 2;
const OP_CLEAR: u8 = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalOp {
    Created(DateTime<Utc>),
    Put {
        normalized_key: String,
        name: IndexName,
    },
    Delete {
        key: NameKey,
        normalized_key: String,
    },
    Clear,
}

impl JournalOp {
    pub fn to_record(&self) -> StoreResult<Record> {
        let record = match self {
            JournalOp::Created(ts) => Record::new(OP_CREATED, ts.to_rfc3339().into_bytes()),
            JournalOp::Put {
                normalized_key,
                name,
            } => {
                let json = serde_json::to_vec(name)?;
                let mut payload = Vec::with_capacity(4 + normalized_key.len() + json.len());
                payload.extend_from_slice(&(normalized_key.len() as u32).to_le_bytes());
                payload.extend_from_slice(normalized_key.as_bytes());
                payload.extend_from_slice(&json);
                Record::new(OP_PUT, payload)
            }
            JournalOp::Delete {
                key,
                normalized_key,
            } => {
                let mut payload = Vec::with_capacity(4 + normalized_key.len());
                payload.extend_from_slice(&key.to_le_bytes());
                payload.extend_from_slice(normalized_key.as_bytes());
                Record::new(OP_DELETE, payload)
            }
            JournalOp::Clear => Record::new(OP_CLEAR, Vec::new()),
        };
        Ok(record)
    }

    /// Decodes a record read at the given byte offset.
    ///
    /// Any unknown op or malformed payload is reported as corruption.
    pub fn from_record(record: &Record, offset: u64) -> StoreResult<Self> {
        match record.op {
            OP_CREATED => {
                let text = std::str::from_utf8(&record.payload)
                    .map_err(|e| StoreError::corruption(offset, format!("invalid timestamp: {}", e)))?;
                let ts = DateTime::parse_from_rfc3339(text)
                    .map_err(|e| StoreError::corruption(offset, format!("invalid timestamp: {}", e)))?;
                Ok(JournalOp::Created(ts.with_timezone(&Utc)))
            }
            OP_PUT => {
                let payload = &record.payload;
                if payload.len() < 4 {
                    return Err(StoreError::corruption(offset, "truncated put payload"));
                }
                let key_len = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]) as usize;
                if payload.len() < 4 + key_len {
                    return Err(StoreError::corruption(offset, "truncated normalized key"));
                }
                let normalized_key = String::from_utf8(payload[4..4 + key_len].to_vec())
                    .map_err(|e| StoreError::corruption(offset, format!("invalid normalized key: {}", e)))?;
                let name: IndexName = serde_json::from_slice(&payload[4 + key_len..])
                    .map_err(|e| StoreError::corruption(offset, format!("invalid index name: {}", e)))?;
                Ok(JournalOp::Put {
                    normalized_key,
                    name,
                })
            }
            OP_DELETE => {
                let payload = &record.payload;
                if payload.len() < 4 {
                    return Err(StoreError::corruption(offset, "invalid delete payload"));
                }
                let key = NameKey::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
                let normalized_key = String::from_utf8(payload[4..].to_vec())
                    .map_err(|e| StoreError::corruption(offset, format!("invalid normalized key: {}", e)))?;
                Ok(JournalOp::Delete {
                    key,
                    normalized_key,
                })
            }
            OP_CLEAR => Ok(JournalOp::Clear),
            op => Err(StoreError::corruption(offset, format!("unknown journal op {}", op))),
        }
    }
}

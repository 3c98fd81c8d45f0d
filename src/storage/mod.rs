//! Checksummed append-only journals
//!
//! Shared by the persistent names index store and the file mirror. A journal
//! is a sequence of framed [`Record`]s.
//!
//! - Append-only, no in-place updates
//! - Checksum verified on every read
//! - Compaction rewrites the whole file atomically via rename

mod errors;
mod reader;
mod record;
mod writer;

pub use errors::{StorageError, StorageResult};
pub use reader::{map_file, read_file, RecordReader};
pub use record::{Record, MIN_RECORD_SIZE};
pub use writer::RecordWriter;

//! Journal reader over memory-mapped files
//!
//! Journals are read front to back in one pass. The whole file is mapped
//! read-only and every record validates its checksum.

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use memmap2::{Mmap, MmapOptions};

use super::errors::{StorageError, StorageResult};
use super::record::Record;

/// Sequential reader over journal bytes.
pub struct RecordReader<'a> {
    data: &'a [u8],
    current_offset: usize,
}

impl<'a> RecordReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            current_offset: 0,
        }
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset as u64
    }

    pub fn has_more(&self) -> bool {
        self.current_offset < self.data.len()
    }

    /// Reads the next record.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(record))` if a record was read
    /// - `Ok(None)` at the end of the data
    /// - `Err(Corruption)` on framing or checksum failures
    pub fn read_next(&mut self) -> StorageResult<Option<Record>> {
        if !self.has_more() {
            return Ok(None);
        }
        let (record, consumed) =
            Record::deserialize(&self.data[self.current_offset..], self.current_offset())?;
        self.current_offset += consumed;
        Ok(Some(record))
    }

    pub fn read_all(&mut self) -> StorageResult<Vec<Record>> {
        let mut records = Vec::new();
        while let Some(record) = self.read_next()? {
            records.push(record);
        }
        Ok(records)
    }
}

/// Memory-maps a journal file read-only.
///
/// Returns `None` for missing or empty files, which cannot be mapped.
pub fn map_file(path: &Path) -> StorageResult<Option<Mmap>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(StorageError::io(path, e)),
    };
    let len = file
        .metadata()
        .map_err(|e| StorageError::io(path, e))?
        .len();
    if len == 0 {
        return Ok(None);
    }
    // SAFETY: journals are only appended to by their single owner, which never
    // writes while a replay holds the mapping.
    let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(|e| StorageError::io(path, e))?;
    Ok(Some(mmap))
}

/// Reads every record of a journal file.
pub fn read_file(path: &Path) -> StorageResult<Vec<Record>> {
    match map_file(path)? {
        Some(mmap) => RecordReader::new(&mmap).read_all(),
        None => Ok(Vec::new()),
    }
}

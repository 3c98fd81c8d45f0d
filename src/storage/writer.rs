//! Append-only journal writer
//!
//! Every record is written with a single `write_all` call straight to the
//! file. With `sync_writes` each append is followed by an fsync, otherwise
//! durability is only guaranteed after [`RecordWriter::sync`].

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::errors::{StorageError, StorageResult};
use super::record::Record;

pub struct RecordWriter {
    path: PathBuf,
    file: File,
    current_offset: u64,
    sync_writes: bool,
}

impl RecordWriter {
    /// Opens or creates the journal file for appending.
    ///
    /// Creates parent directories if needed.
    pub fn open(path: &Path, sync_writes: bool) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| StorageError::io(path, e))?;
        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::io(path, e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            current_offset,
            sync_writes,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Appends a record, returning the byte offset it was written at.
    pub fn append(&mut self, record: &Record) -> StorageResult<u64> {
        let bytes = record.serialize();
        let offset = self.current_offset;
        self.file
            .write_all(&bytes)
            .map_err(|e| StorageError::io(&self.path, e))?;
        if self.sync_writes {
            self.sync()?;
        }
        self.current_offset += bytes.len() as u64;
        Ok(offset)
    }

    pub fn sync(&mut self) -> StorageResult<()> {
        self.file
            .sync_all()
            .map_err(|e| StorageError::io(&self.path, e))
    }

    /// Drops every record of the journal.
    pub fn truncate(&mut self) -> StorageResult<()> {
        self.file
            .set_len(0)
            .map_err(|e| StorageError::io(&self.path, e))?;
        self.sync()?;
        self.current_offset = 0;
        Ok(())
    }

    /// Atomically replaces the journal with the given records.
    ///
    /// Records go to a temporary sibling file which is fsynced and renamed
    /// over the journal. The writer continues appending to the new file.
    pub fn rewrite<I>(&mut self, records: I) -> StorageResult<()>
    where
        I: IntoIterator<Item = Record>,
    {
        let tmp_path = self.path.with_extension("tmp");
        {
            let mut tmp = File::create(&tmp_path).map_err(|e| StorageError::io(&tmp_path, e))?;
            for record in records {
                tmp.write_all(&record.serialize())
                    .map_err(|e| StorageError::io(&tmp_path, e))?;
            }
            tmp.sync_all().map_err(|e| StorageError::io(&tmp_path, e))?;
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| StorageError::io(&self.path, e))?;

        let reopened = Self::open(&self.path, self.sync_writes)?;
        *self = reopened;
        Ok(())
    }
}

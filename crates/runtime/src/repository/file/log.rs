//! Append-only record log.
//!
//! Stores items of type `T` using the format:
//! ```text
//! [u32 length][bincode serialized T]
//! [u32 length][bincode serialized T]
//! ...
//! ```

use std::fs::{File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};

use crate::repository::{RepositoryError, Result};

pub struct RecordLog<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> RecordLog<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _phantom: PhantomData,
        }
    }

    /// Appends one item and syncs it to disk. Returns the byte offset the
    /// item was written at.
    pub fn append(&self, item: &T) -> Result<u64> {
        let bytes =
            bincode::serialize(item).map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let len = u32::try_from(bytes.len())
            .map_err(|_| RepositoryError::Serialization("record exceeds 4 GiB".to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(RepositoryError::Io)?;
        let offset = file.metadata().map_err(RepositoryError::Io)?.len();

        let mut frame = Vec::with_capacity(4 + bytes.len());
        frame.extend_from_slice(&len.to_le_bytes());
        frame.extend_from_slice(&bytes);
        file.write_all(&frame).map_err(RepositoryError::Io)?;
        file.sync_data().map_err(RepositoryError::Io)?;

        Ok(offset)
    }

    /// Reads every item in write order. A missing file reads as empty.
    pub fn read_all(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let file = File::open(&self.path).map_err(RepositoryError::Io)?;
        let file_size = file.metadata().map_err(RepositoryError::Io)?.len();
        let mut reader = BufReader::new(file);

        let mut items = Vec::new();
        let mut offset = 0u64;
        while offset < file_size {
            let mut len_bytes = [0u8; 4];
            let available = read_up_to(&mut reader, &mut len_bytes)?;
            if available < len_bytes.len() {
                return Err(RepositoryError::PartialWrite {
                    offset,
                    expected: len_bytes.len(),
                    actual: available,
                });
            }
            let len = u32::from_le_bytes(len_bytes) as usize;

            let mut data = vec![0u8; len];
            let available = read_up_to(&mut reader, &mut data)?;
            if available < len {
                return Err(RepositoryError::PartialWrite {
                    offset,
                    expected: len,
                    actual: available,
                });
            }
            let item = bincode::deserialize(&data)
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
            items.push(item);
            offset += 4 + len as u64;
        }
        Ok(items)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Fills `buf` as far as the reader allows, returning the bytes read.
fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).map_err(RepositoryError::Io)? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

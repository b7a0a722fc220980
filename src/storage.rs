use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Db(#[from] rocksdb::Error),
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
}

/// Handle to the embedded key-value store.
///
/// Opened once by the binary and shared (`Arc<Storage>`) with every
/// component that persists state.
pub struct Storage {
    db: DB,
}

/// A set of writes applied atomically by [`Storage::commit`].
#[derive(Default)]
pub struct Batch {
    inner: WriteBatch,
}

impl Batch {
    pub fn put<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StorageError> {
        let serialized = bincode::serialize(value)?;
        self.inner.put(key.as_bytes(), serialized);
        Ok(())
    }

    pub fn delete(&mut self, key: &str) {
        self.inner.delete(key.as_bytes());
    }
}

impl Storage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        let db = DB::open(&opts, path)?;
        Ok(Storage { db })
    }

    // Generic Helper: Put
    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let serialized = bincode::serialize(value)?;
        self.db.put(key.as_bytes(), serialized)?;
        Ok(())
    }

    // Generic Helper: Get
    pub fn get<T: for<'a> Deserialize<'a>>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.db.get(key.as_bytes())? {
            Some(data) => Ok(Some(bincode::deserialize(&data)?)),
            None => Ok(None),
        }
    }

    pub fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.db.get_pinned(key.as_bytes())?.is_some())
    }

    /// Decode every value whose key starts with `prefix`, in key order.
    pub fn scan_prefix<T: for<'a> Deserialize<'a>>(
        &self,
        prefix: &str,
    ) -> Result<Vec<T>, StorageError> {
        let mut out = Vec::new();
        let iter = self
            .db
            .iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward));
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix.as_bytes()) {
                break;
            }
            out.push(bincode::deserialize(&value)?);
        }
        Ok(out)
    }

    pub fn commit(&self, batch: Batch) -> Result<(), StorageError> {
        self.db.write(batch.inner)?;
        Ok(())
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

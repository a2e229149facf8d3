use std::marker::PhantomData;
use std::path::Path;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::domain::Comment;
use crate::domain::SubscriberRecord;

pub type SubscriberStore = JsonFileStore<SubscriberRecord>;
pub type CommentStore = JsonFileStore<Comment>;

#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("Failed to access store file {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file exists but is not a JSON array of records. Surfaced rather
    /// than treated as an empty store, so that the next write does not wipe
    /// whatever is in there.
    #[error("Store file {path:?} is corrupt")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Failed to serialize records for {path:?}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl std::fmt::Debug for StoreError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        crate::routes::error_chain_fmt(self, f)
    }
}

/// Returned by the closure passed to `JsonFileStore::update`: whether the
/// collection needs writing back, plus whatever the caller wants out of it.
#[derive(Debug)]
pub enum Update<R> {
    Changed(R),
    Unchanged(R),
}

/// A whole collection of `T`, kept as one JSON array in one file.
///
/// Every read loads the full file and every write rewrites it. Writes go to a
/// sibling `.tmp` file that is then renamed over the target, so readers see
/// either the old or the new array, never half of one.
///
/// `update` holds an async mutex across load/modify/save; all mutations made
/// through the same `JsonFileStore` are serialized. Writers in other processes
/// (or someone editing the file by hand) are not coordinated with.
pub struct JsonFileStore<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _records: PhantomData<fn() -> T>,
}

impl<T> JsonFileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            _records: PhantomData,
        }
    }

    pub fn path(&self) -> &Path { &self.path }

    /// Missing file -> empty collection. Anything else that goes wrong is an
    /// error.
    #[tracing::instrument(name = "Loading store", skip(self), fields(path = ?self.path))]
    pub async fn load(&self) -> Result<Vec<T>, StoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("store file does not exist yet");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        // a file truncated to nothing by hand is as good as a missing one
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Replace the whole collection on disk
    #[tracing::instrument(
        name = "Saving store",
        skip(self, records),
        fields(path = ?self.path, n_records = records.len())
    )]
    pub async fn save(
        &self,
        records: &[T],
    ) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        // compact output: a single line, no trailing newline
        let json = serde_json::to_vec(records).map_err(|source| StoreError::Serialize {
            path: self.path.clone(),
            source,
        })?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let tmp_path = self.tmp_path();
        tokio::fs::write(&tmp_path, json).await.map_err(io_err)?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(io_err)?;
        Ok(())
    }

    /// Read-modify-write under the store lock. `f` sees the full collection;
    /// if it reports `Update::Changed`, whatever it leaves behind is persisted.
    /// Its payload is passed through either way.
    ///
    /// Nothing is written if loading fails.
    pub async fn update<F, R>(
        &self,
        f: F,
    ) -> Result<R, StoreError>
    where
        F: FnOnce(&mut Vec<T>) -> Update<R>,
    {
        let _guard = self.lock.lock().await;
        let mut records = self.load().await?;
        match f(&mut records) {
            Update::Changed(outcome) => {
                self.save(&records).await?;
                Ok(outcome)
            }
            Update::Unchanged(outcome) => Ok(outcome),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

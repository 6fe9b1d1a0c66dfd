use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use futures::future::{BoxFuture, FutureExt};

use crate::errors::BackendError;
use crate::io::write_atomic;

pub mod mock;

pub trait Store: Send + Sync {
    /// The type of successful result.
    type Output;

    /// The type of raw data.
    type Raw;

    /// Loads the bytes of the named object.
    fn load(&self, name: &str) -> BoxFuture<Result<Vec<u8>, BackendError>>;

    /// Saves the given data under the given object name.
    fn save(&self, name: &str, raw: Self::Raw) -> BoxFuture<Result<Self::Output, BackendError>>;
}

/// A store that keeps each media object as one file in a directory.
/// Objects are written once and never modified.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Creates the store, ensuring its directory exists.
    pub fn create(root: impl Into<PathBuf>) -> Result<Self, BackendError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(BackendError::storage)?;

        Ok(FsStore { root })
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl Store for FsStore {
    type Output = ();
    type Raw = Vec<u8>;

    fn load(&self, name: &str) -> BoxFuture<Result<Vec<u8>, BackendError>> {
        let path = self.object_path(name);
        let name = name.to_owned();

        async move {
            match fs::read(&path) {
                Ok(raw) => Ok(raw),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    Err(BackendError::MediaNotFound { name })
                }
                Err(source) => Err(BackendError::storage(source)),
            }
        }
        .boxed()
    }

    fn save(&self, name: &str, raw: Vec<u8>) -> BoxFuture<Result<(), BackendError>> {
        let path = self.object_path(name);

        async move { write_atomic(&path, &raw) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::{FsStore, Store};
    use crate::errors::BackendError;

    #[tokio::test]
    async fn saving_then_loading_round_trips() {
        let dir = tempfile::tempdir().expect("create temporary directory");
        let store = FsStore::create(dir.path().join("videos")).expect("create store");

        store
            .save("video-iv1-1-q0.webm", b"clip bytes".to_vec())
            .await
            .expect("save object");

        let raw = store.load("video-iv1-1-q0.webm").await.expect("load object");
        assert_eq!(raw, b"clip bytes");
    }

    #[tokio::test]
    async fn loading_a_missing_object_fails() {
        let dir = tempfile::tempdir().expect("create temporary directory");
        let store = FsStore::create(dir.path().join("videos")).expect("create store");

        let result = store.load("video-iv1-1-q0.webm").await;
        assert!(matches!(result, Err(BackendError::MediaNotFound { .. })));
    }
}

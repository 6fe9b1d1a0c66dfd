use std::collections::HashMap;
use std::sync::RwLock;

use futures::future::{BoxFuture, FutureExt};

use crate::errors::BackendError;
use crate::store::Store;

/// In-memory store for tests. The map is public so tests can inspect
/// exactly what was written.
#[derive(Default)]
pub struct MockStore {
    pub map: RwLock<HashMap<String, Vec<u8>>>,
}

impl Store for MockStore {
    type Output = ();
    type Raw = Vec<u8>;

    fn load(&self, name: &str) -> BoxFuture<Result<Vec<u8>, BackendError>> {
        let name = name.to_owned();

        async move {
            let raw = {
                let map = self.map.read().expect("mock store lock");
                map.get(&name).cloned()
            };

            raw.ok_or(BackendError::MediaNotFound { name })
        }
        .boxed()
    }

    fn save(&self, name: &str, raw: Vec<u8>) -> BoxFuture<Result<(), BackendError>> {
        let name = name.to_owned();

        async move {
            self.map.write().expect("mock store lock").insert(name, raw);

            Ok(())
        }
        .boxed()
    }
}

use std::sync::Arc;

use log::Logger;

use crate::auth::Verifier;
use crate::db::Db;
use crate::store::Store;
use crate::urls::Urls;

pub type VecStore<O> = dyn Store<Output = O, Raw = Vec<u8>> + Send + Sync;

/// Shorthand for the bound every route places on the store output.
pub trait SafeStore: Clone + Send + Sync {}

impl<T: Clone + Send + Sync> SafeStore for T {}

#[derive(Clone)]
pub struct Environment<O: Clone + Send + Sync> {
    pub logger: Arc<Logger>,
    pub db: Arc<dyn Db + Send + Sync>,
    pub urls: Arc<Urls>,
    pub store: Arc<VecStore<O>>,
    pub verifier: Arc<dyn Verifier>,
}

impl<O: Clone + Send + Sync> Environment<O> {
    pub fn new(
        logger: Arc<Logger>,
        db: Arc<dyn Db + Send + Sync>,
        urls: Arc<Urls>,
        store: Arc<VecStore<O>>,
        verifier: Arc<dyn Verifier>,
    ) -> Self {
        Self {
            logger,
            db,
            urls,
            store,
            verifier,
        }
    }
}

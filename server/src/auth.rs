use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::RwLock;

use futures::future::{BoxFuture, FutureExt};
use uuid::Uuid;

use crate::errors::BackendError;
use crate::io::write_atomic;

/// Verifies bearer tokens, resolving each to a user id.
pub trait Verifier: Send + Sync {
    fn verify(&self, token: &str) -> BoxFuture<Result<String, BackendError>>;
}

/// Extracts and verifies the bearer token from an `Authorization`
/// header. A missing or malformed header is `Unauthorized`; a present
/// but unknown token is `InvalidToken`.
pub async fn authenticate(
    verifier: &dyn Verifier,
    header: Option<String>,
) -> Result<String, BackendError> {
    let header = header.ok_or(BackendError::Unauthorized)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(BackendError::Unauthorized)?;

    verifier.verify(token).await
}

/// A verifier backed by a JSON file mapping tokens to user ids. The
/// file is loaded lazily on first use; a missing file means no tokens.
pub struct TokenFileVerifier {
    path: PathBuf,
    tokens: RwLock<Option<HashMap<String, String>>>,
}

impl TokenFileVerifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TokenFileVerifier {
            path: path.into(),
            tokens: RwLock::new(None),
        }
    }

    fn load(&self) -> Result<HashMap<String, String>, BackendError> {
        {
            let tokens = self.tokens.read().expect("token table lock");

            if let Some(tokens) = &*tokens {
                return Ok(tokens.clone());
            }
        }

        let tokens = match fs::read(&self.path) {
            Ok(raw) => serde_json::from_slice(&raw).map_err(|source| BackendError::BadRecord {
                name: self.path.to_string_lossy().into_owned(),
                source,
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(BackendError::storage(source)),
        };

        *self.tokens.write().expect("token table lock") = Some(tokens.clone());

        Ok(tokens)
    }

    /// Issues a fresh token for the given user and persists the table.
    pub fn register(&self, user_id: &str) -> Result<String, BackendError> {
        let mut tokens = self.load()?;
        let token = Uuid::new_v4().to_string();
        tokens.insert(token.clone(), user_id.to_owned());

        let raw = serde_json::to_vec_pretty(&tokens)
            .map_err(|source| BackendError::SerializeRecord { source })?;
        write_atomic(&self.path, &raw)?;

        *self.tokens.write().expect("token table lock") = Some(tokens);

        Ok(token)
    }
}

impl Verifier for TokenFileVerifier {
    fn verify(&self, token: &str) -> BoxFuture<Result<String, BackendError>> {
        let token = token.to_owned();

        async move {
            self.load()?
                .get(&token)
                .cloned()
                .ok_or(BackendError::InvalidToken)
        }
        .boxed()
    }
}

/// A verifier with a fixed token table, for tests.
#[derive(Default)]
pub struct StaticVerifier {
    pub tokens: HashMap<String, String>,
}

impl Verifier for StaticVerifier {
    fn verify(&self, token: &str) -> BoxFuture<Result<String, BackendError>> {
        let user_id = self.tokens.get(token).cloned();

        async move { user_id.ok_or(BackendError::InvalidToken) }.boxed()
    }
}

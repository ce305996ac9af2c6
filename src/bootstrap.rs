//! Bootstrap token invariant.
//!
//! The install-time bootstrap token is persisted on first startup and must
//! never change afterwards. A mismatch on a later startup is treated as
//! configuration tampering and aborts the process before it serves traffic.

use thiserror::Error;
use tracing::info;

use crate::store::{BootstrapStore, StoreError};

#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The supplied token does not match the persisted record. Fatal.
    #[error("bootstrap token does not match the persisted record; refusing to start")]
    TokenMismatch,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Persist the token on first run; on later runs require it to be unchanged.
///
/// # Errors
/// `TokenMismatch` when the persisted token differs from `supplied`; the
/// caller must treat this as fatal and halt.
pub async fn load_or_initialize(
    store: &dyn BootstrapStore,
    supplied: &str,
) -> Result<(), BootstrapError> {
    match store.find_record().await? {
        Some(persisted) if persisted == supplied => Ok(()),
        Some(_) => Err(BootstrapError::TokenMismatch),
        None => {
            store.create_record(supplied).await?;
            info!("bootstrap token persisted");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn first_run_persists_then_enforces() {
        let store = MemoryStore::new();

        load_or_initialize(&store, "abc").await.unwrap();

        // Same token on a later startup: no-op.
        load_or_initialize(&store, "abc").await.unwrap();

        // Different token: fatal.
        let err = load_or_initialize(&store, "xyz").await.unwrap_err();
        assert!(matches!(err, BootstrapError::TokenMismatch));

        // Original token still works after the failed attempt.
        load_or_initialize(&store, "abc").await.unwrap();
    }
}

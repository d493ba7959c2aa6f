//! In-memory reference implementation of the account capability.
//!
//! Deterministic and test-friendly. Production deployments back this trait
//! with the homeserver's real account store; the conditional insert below is
//! what a real backend must provide at the storage layer.

use crate::error::{StoreError, StoreResult};
use crate::traits::AccountHandler;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::RwLock;

/// In-memory account handler scoped to one server name.
#[derive(Debug)]
pub struct InMemoryAccountHandler {
    server_name: String,
    localparts: RwLock<HashSet<String>>,
}

impl InMemoryAccountHandler {
    pub fn new(server_name: impl Into<String>) -> Self {
        Self {
            server_name: server_name.into(),
            localparts: RwLock::new(HashSet::new()),
        }
    }

    /// Number of accounts ever created. Used to assert provisioning
    /// idempotence.
    pub fn user_count(&self) -> usize {
        self.localparts.read().map(|guard| guard.len()).unwrap_or(0)
    }
}

#[async_trait]
impl AccountHandler for InMemoryAccountHandler {
    fn qualified_user_id(&self, localpart: &str) -> String {
        format!("@{}:{}", localpart, self.server_name)
    }

    async fn check_user_exists(&self, user_id: &str) -> StoreResult<Option<String>> {
        let guard = self
            .localparts
            .read()
            .map_err(|_| StoreError::Backend("account lock poisoned".to_string()))?;
        let known = guard
            .iter()
            .any(|localpart| self.qualified_user_id(localpart) == user_id);
        Ok(known.then(|| user_id.to_string()))
    }

    async fn register_user(&self, localpart: &str) -> StoreResult<String> {
        let mut guard = self
            .localparts
            .write()
            .map_err(|_| StoreError::Backend("account lock poisoned".to_string()))?;
        // Single write-locked check-and-insert: concurrent first logins for
        // the same localpart cannot both create.
        guard.insert(localpart.to_string());
        Ok(self.qualified_user_id(localpart))
    }
}

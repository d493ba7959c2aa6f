use crate::error::StoreResult;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Capability for delegated auth-chain verification.
///
/// Implementations consult whatever source of truth they trust (remote
/// verification servers in production, fixtures in tests) and report the
/// owning address when the chain conclusively checks out.
#[async_trait]
pub trait ChainValidator: Send + Sync {
    /// Returns the owner address asserted by a conclusively valid chain, or
    /// absence when no conclusive verdict could be obtained. Absence is not
    /// an error; it means the credential cannot be accepted.
    ///
    /// `timestamp` is forwarded exactly as received from the client so the
    /// verifier checks the same bytes the user signed.
    async fn validate(&self, timestamp: &Value, auth_chain: &Value) -> Option<String>;

    /// Worst-case wall-clock bound for one `validate` call, for the host's
    /// request-timeout policy. In-process validators answer immediately.
    fn max_attempt_duration(&self) -> Duration {
        Duration::ZERO
    }
}

/// Capability over the host's account/identity store.
///
/// The provider only reads existence and requests creation; it never mutates
/// account fields. Implementations must guarantee at-most-one creation per
/// identifier under concurrent registration.
#[async_trait]
pub trait AccountHandler: Send + Sync {
    /// Derives the fully-qualified user id for a localpart.
    fn qualified_user_id(&self, localpart: &str) -> String;

    /// Looks up an existing account by qualified user id.
    async fn check_user_exists(&self, user_id: &str) -> StoreResult<Option<String>>;

    /// Registers an account for `localpart`, returning its qualified user
    /// id. Must be idempotent: registering an already-known localpart
    /// returns the existing id without creating a duplicate.
    async fn register_user(&self, localpart: &str) -> StoreResult<String>;
}

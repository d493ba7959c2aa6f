//! The credential-validation orchestrator.
//!
//! One pass per login attempt: freshness check, delegated chain
//! verification, identity-match enforcement, then idempotent account
//! provisioning. Every rejection is terminal and non-fatal to the host.

use crate::config::ProviderConfig;
use crate::error::ProviderError;
use crate::freshness::{self, Freshness};
use crate::traits::{AccountHandler, ChainValidator};
use crate::types::{
    LoginAttempt, LoginDecision, RejectionReason, AUTH_CHAIN_FIELD, LOGIN_TYPE, TIMESTAMP_FIELD,
};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Blockchain-identity login provider.
///
/// Holds the immutable configuration plus the two injected capabilities:
/// chain verification and the account store.
pub struct AuthProvider {
    config: ProviderConfig,
    validator: Arc<dyn ChainValidator>,
    accounts: Arc<dyn AccountHandler>,
    tolerance: Duration,
}

impl AuthProvider {
    pub fn new(
        config: ProviderConfig,
        validator: Arc<dyn ChainValidator>,
        accounts: Arc<dyn AccountHandler>,
    ) -> Self {
        Self {
            config,
            validator,
            accounts,
            tolerance: freshness::default_tolerance(),
        }
    }

    /// Overrides the freshness tolerance window.
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Login kinds this provider answers for, mapped to their required
    /// credential fields. Empty when administratively disabled.
    pub fn supported_login_types(&self) -> HashMap<&'static str, Vec<&'static str>> {
        if self.config.enabled {
            HashMap::from([(LOGIN_TYPE, vec![TIMESTAMP_FIELD, AUTH_CHAIN_FIELD])])
        } else {
            HashMap::new()
        }
    }

    /// Worst-case wall-clock bound for one attempt, to be folded into the
    /// host's own request-timeout policy.
    pub fn max_attempt_duration(&self) -> std::time::Duration {
        self.validator.max_attempt_duration()
    }

    /// Host-facing credential check. Absence means "this credential is not
    /// acceptable here; defer to other providers" and is never an error.
    pub async fn check_credential(
        &self,
        attempt: &LoginAttempt,
    ) -> Result<Option<String>, ProviderError> {
        Ok(self.check_credential_detailed(attempt).await?.into_user_id())
    }

    /// Reason-bearing variant of [`check_credential`](Self::check_credential)
    /// for diagnostics. Only account-store faults surface as errors.
    pub async fn check_credential_detailed(
        &self,
        attempt: &LoginAttempt,
    ) -> Result<LoginDecision, ProviderError> {
        let username = attempt.username.to_lowercase();

        if !self.config.enabled {
            return Ok(reject(&username, RejectionReason::Disabled));
        }

        if attempt.login_type != LOGIN_TYPE {
            return Ok(reject(&username, RejectionReason::UnsupportedKind));
        }

        let (Some(timestamp), Some(auth_chain)) = (
            attempt.field(TIMESTAMP_FIELD),
            attempt.field(AUTH_CHAIN_FIELD),
        ) else {
            return Ok(reject(&username, RejectionReason::MissingFields));
        };

        // An unparseable timestamp can never be recent.
        let Some(timestamp_millis) = freshness::parse_timestamp_millis(timestamp) else {
            return Ok(reject(&username, RejectionReason::Stale));
        };
        match freshness::check_freshness(timestamp_millis, Utc::now(), self.tolerance) {
            Freshness::Stale => return Ok(reject(&username, RejectionReason::Stale)),
            Freshness::Future => return Ok(reject(&username, RejectionReason::Future)),
            Freshness::Fresh => {}
        }

        let Some(owner_address) = self.validator.validate(timestamp, auth_chain).await else {
            return Ok(reject(&username, RejectionReason::InvalidChain));
        };

        if owner_address.to_lowercase() != username {
            return Ok(reject(&username, RejectionReason::IdentityMismatch));
        }

        let user_id = self.resolve_account(&username).await?;
        Ok(LoginDecision::Accepted(user_id))
    }

    /// Looks up or creates the account for a validated identity. The store's
    /// conditional insert guarantees at-most-one creation per localpart.
    async fn resolve_account(&self, localpart: &str) -> Result<String, ProviderError> {
        let qualified = self.accounts.qualified_user_id(localpart);
        if let Some(existing) = self.accounts.check_user_exists(&qualified).await? {
            return Ok(existing);
        }

        let user_id = self.accounts.register_user(localpart).await?;
        debug!(username = %localpart, %user_id, "registered new user");
        Ok(user_id)
    }
}

fn reject(username: &str, reason: RejectionReason) -> LoginDecision {
    debug!(%username, %reason, "login rejected");
    LoginDecision::Rejected(reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::memory::InMemoryAccountHandler;
    use crate::types::{simple_auth_chain, LoginFields};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Validator fixture answering with a fixed owner address.
    struct StaticValidator {
        owner: Option<String>,
        calls: AtomicUsize,
    }

    impl StaticValidator {
        fn valid_for(owner: &str) -> Self {
            Self {
                owner: Some(owner.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn inconclusive() -> Self {
            Self {
                owner: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ChainValidator for StaticValidator {
        async fn validate(&self, _timestamp: &Value, _auth_chain: &Value) -> Option<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.owner.clone()
        }
    }

    struct FailingAccountHandler;

    #[async_trait]
    impl AccountHandler for FailingAccountHandler {
        fn qualified_user_id(&self, localpart: &str) -> String {
            format!("@{}:decentraland.org", localpart)
        }

        async fn check_user_exists(&self, _user_id: &str) -> StoreResult<Option<String>> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }

        async fn register_user(&self, _localpart: &str) -> StoreResult<String> {
            Err(StoreError::Unavailable("store is down".to_string()))
        }
    }

    fn config(enabled: bool) -> ProviderConfig {
        ProviderConfig::new(enabled, vec!["https://peer.decentraland.org".to_string()]).unwrap()
    }

    fn login_fields(timestamp: Value) -> LoginFields {
        let chain = simple_auth_chain("0xabc", timestamp.to_string(), "0xsigned");
        let mut fields = LoginFields::new();
        fields.insert("timestamp".to_string(), timestamp);
        fields.insert(
            "auth_chain".to_string(),
            serde_json::to_value(chain).unwrap(),
        );
        fields
    }

    fn fresh_attempt(username: &str) -> LoginAttempt {
        let now_millis = Utc::now().timestamp_millis();
        LoginAttempt::new(username, LOGIN_TYPE, login_fields(json!(now_millis)))
    }

    fn provider(
        enabled: bool,
        validator: Arc<StaticValidator>,
        accounts: Arc<dyn AccountHandler>,
    ) -> AuthProvider {
        AuthProvider::new(config(enabled), validator, accounts)
    }

    #[tokio::test]
    async fn disabled_provider_rejects_without_contacting_verifiers() {
        let validator = Arc::new(StaticValidator::valid_for("0xabc"));
        let accounts = Arc::new(InMemoryAccountHandler::new("decentraland.org"));
        let provider = provider(false, validator.clone(), accounts);

        assert!(provider.supported_login_types().is_empty());

        let decision = provider
            .check_credential_detailed(&fresh_attempt("0xabc"))
            .await
            .unwrap();
        assert_eq!(decision, LoginDecision::Rejected(RejectionReason::Disabled));
        assert_eq!(validator.calls(), 0);
    }

    #[tokio::test]
    async fn enabled_provider_advertises_required_fields() {
        let validator = Arc::new(StaticValidator::valid_for("0xabc"));
        let accounts = Arc::new(InMemoryAccountHandler::new("decentraland.org"));
        let provider = provider(true, validator, accounts);

        let types = provider.supported_login_types();
        assert_eq!(
            types.get(LOGIN_TYPE),
            Some(&vec![TIMESTAMP_FIELD, AUTH_CHAIN_FIELD])
        );
    }

    #[tokio::test]
    async fn rejects_unsupported_login_types() {
        let validator = Arc::new(StaticValidator::valid_for("0xabc"));
        let accounts = Arc::new(InMemoryAccountHandler::new("decentraland.org"));
        let provider = provider(true, validator.clone(), accounts);

        let mut attempt = fresh_attempt("0xabc");
        attempt.login_type = "m.login.password".to_string();
        let decision = provider.check_credential_detailed(&attempt).await.unwrap();
        assert_eq!(
            decision,
            LoginDecision::Rejected(RejectionReason::UnsupportedKind)
        );
        assert_eq!(validator.calls(), 0);
    }

    #[tokio::test]
    async fn rejects_attempts_missing_required_fields() {
        let validator = Arc::new(StaticValidator::valid_for("0xabc"));
        let accounts = Arc::new(InMemoryAccountHandler::new("decentraland.org"));
        let provider = provider(true, validator, accounts);

        let mut fields = LoginFields::new();
        fields.insert("timestamp".to_string(), json!(Utc::now().timestamp_millis()));
        let attempt = LoginAttempt::new("0xabc", LOGIN_TYPE, fields);

        let decision = provider.check_credential_detailed(&attempt).await.unwrap();
        assert_eq!(
            decision,
            LoginDecision::Rejected(RejectionReason::MissingFields)
        );
    }

    #[tokio::test]
    async fn stale_timestamp_is_rejected_before_any_verifier_call() {
        let validator = Arc::new(StaticValidator::valid_for("0xabc"));
        let accounts = Arc::new(InMemoryAccountHandler::new("decentraland.org"));
        let provider = provider(true, validator.clone(), accounts);

        let stale = Utc::now().timestamp_millis() - 90_000;
        let attempt = LoginAttempt::new("0xabc", LOGIN_TYPE, login_fields(json!(stale)));
        let decision = provider.check_credential_detailed(&attempt).await.unwrap();
        assert_eq!(decision, LoginDecision::Rejected(RejectionReason::Stale));
        assert_eq!(validator.calls(), 0);
    }

    #[tokio::test]
    async fn future_timestamp_is_rejected() {
        let validator = Arc::new(StaticValidator::valid_for("0xabc"));
        let accounts = Arc::new(InMemoryAccountHandler::new("decentraland.org"));
        let provider = provider(true, validator, accounts);

        let future = Utc::now().timestamp_millis() + 90_000;
        let attempt = LoginAttempt::new("0xabc", LOGIN_TYPE, login_fields(json!(future)));
        let decision = provider.check_credential_detailed(&attempt).await.unwrap();
        assert_eq!(decision, LoginDecision::Rejected(RejectionReason::Future));
    }

    #[tokio::test]
    async fn unparseable_timestamp_is_treated_as_stale() {
        let validator = Arc::new(StaticValidator::valid_for("0xabc"));
        let accounts = Arc::new(InMemoryAccountHandler::new("decentraland.org"));
        let provider = provider(true, validator.clone(), accounts);

        let attempt = LoginAttempt::new("0xabc", LOGIN_TYPE, login_fields(json!("soon")));
        let decision = provider.check_credential_detailed(&attempt).await.unwrap();
        assert_eq!(decision, LoginDecision::Rejected(RejectionReason::Stale));
        assert_eq!(validator.calls(), 0);
    }

    #[tokio::test]
    async fn rejects_when_no_verifier_is_conclusive() {
        let validator = Arc::new(StaticValidator::inconclusive());
        let accounts = Arc::new(InMemoryAccountHandler::new("decentraland.org"));
        let provider = provider(true, validator, accounts);

        let decision = provider
            .check_credential_detailed(&fresh_attempt("0xabc"))
            .await
            .unwrap();
        assert_eq!(
            decision,
            LoginDecision::Rejected(RejectionReason::InvalidChain)
        );
    }

    #[tokio::test]
    async fn identity_match_is_case_insensitive() {
        let validator = Arc::new(StaticValidator::valid_for("0xAbC123"));
        let accounts = Arc::new(InMemoryAccountHandler::new("decentraland.org"));
        let provider = provider(true, validator, accounts);

        let user_id = provider
            .check_credential(&fresh_attempt("0xABC123"))
            .await
            .unwrap();
        assert_eq!(user_id, Some("@0xabc123:decentraland.org".to_string()));
    }

    #[tokio::test]
    async fn rejects_owner_addresses_for_other_identities() {
        let validator = Arc::new(StaticValidator::valid_for("0xdef"));
        let accounts = Arc::new(InMemoryAccountHandler::new("decentraland.org"));
        let provider = provider(true, validator, accounts);

        let decision = provider
            .check_credential_detailed(&fresh_attempt("0xabc"))
            .await
            .unwrap();
        assert_eq!(
            decision,
            LoginDecision::Rejected(RejectionReason::IdentityMismatch)
        );
    }

    #[tokio::test]
    async fn repeated_logins_reuse_the_same_account() {
        let validator = Arc::new(StaticValidator::valid_for("0xabc"));
        let accounts = Arc::new(InMemoryAccountHandler::new("decentraland.org"));
        let provider = provider(true, validator, accounts.clone());

        let first = provider
            .check_credential(&fresh_attempt("0xabc"))
            .await
            .unwrap();
        let second = provider
            .check_credential(&fresh_attempt("0xABC"))
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(accounts.user_count(), 1);
    }

    #[tokio::test]
    async fn concurrent_first_logins_create_exactly_one_account() {
        let validator = Arc::new(StaticValidator::valid_for("0xabc"));
        let accounts = Arc::new(InMemoryAccountHandler::new("decentraland.org"));
        let provider = provider(true, validator, accounts.clone());

        let attempt_a = fresh_attempt("0xabc");
        let attempt_b = fresh_attempt("0xABC");
        let (first, second) = futures::join!(
            provider.check_credential(&attempt_a),
            provider.check_credential(&attempt_b)
        );

        assert_eq!(first.unwrap(), second.unwrap());
        assert_eq!(accounts.user_count(), 1);
    }

    #[tokio::test]
    async fn store_faults_propagate_as_errors_not_rejections() {
        let validator = Arc::new(StaticValidator::valid_for("0xabc"));
        let provider = provider(true, validator, Arc::new(FailingAccountHandler));

        let result = provider.check_credential(&fresh_attempt("0xabc")).await;
        assert!(matches!(result, Err(ProviderError::Store(_))));
    }
}

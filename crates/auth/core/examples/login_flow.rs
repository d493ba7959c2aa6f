//! End-to-end login flow against an in-process chain validator.
//!
//! Run with: cargo run -p dcl-auth-core --example login_flow

use async_trait::async_trait;
use chrono::Utc;
use dcl_auth_core::{
    simple_auth_chain, AuthProvider, ChainValidator, LoginAttempt, LoginFields, ProviderConfig,
    AUTH_CHAIN_FIELD, LOGIN_TYPE, TIMESTAMP_FIELD,
};
use dcl_auth_core::memory::InMemoryAccountHandler;
use serde_json::{json, Value};
use std::sync::Arc;

/// Stand-in verifier that trusts every chain and echoes its signer link.
struct SignerEchoValidator;

#[async_trait]
impl ChainValidator for SignerEchoValidator {
    async fn validate(&self, _timestamp: &Value, auth_chain: &Value) -> Option<String> {
        auth_chain
            .as_array()?
            .first()?
            .get("payload")?
            .as_str()
            .map(str::to_string)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .init();

    let config = ProviderConfig::new(true, vec!["https://peer.decentraland.org/".to_string()])?;
    let accounts = Arc::new(InMemoryAccountHandler::new("decentraland.org"));
    let provider = AuthProvider::new(config, Arc::new(SignerEchoValidator), accounts);

    let address = "0xDc13378daFca7Fe2306368A16BC86c3e0d9f0AAf";
    let timestamp = Utc::now().timestamp_millis();
    let chain = simple_auth_chain(address, timestamp.to_string(), "0xsigned");

    let mut fields = LoginFields::new();
    fields.insert(TIMESTAMP_FIELD.to_string(), json!(timestamp));
    fields.insert(AUTH_CHAIN_FIELD.to_string(), serde_json::to_value(chain)?);
    let attempt = LoginAttempt::new(address, LOGIN_TYPE, fields);

    let decision = provider.check_credential_detailed(&attempt).await?;
    println!("first login: {decision:?}");

    let decision = provider.check_credential_detailed(&attempt).await?;
    println!("second login: {decision:?}");

    Ok(())
}

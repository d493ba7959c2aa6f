//! Blockchain-identity login provider core.
//!
//! This crate decides whether a login attempt backed by a signed auth chain
//! is acceptable:
//! - timestamp freshness against a tolerance window
//! - delegated chain verification through a `ChainValidator` capability
//! - case-insensitive identity-match enforcement
//! - idempotent account provisioning through an `AccountHandler` capability
//!
//! Design stance:
//! - Signature verification is never performed locally; trusted remote
//!   verifiers are the source of truth for chain validity.
//! - Credential rejections are values, not errors. Only account-store
//!   faults propagate as `ProviderError`.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod config;
mod error;
pub mod freshness;
pub mod memory;
mod provider;
mod traits;
mod types;

pub use config::ProviderConfig;
pub use error::{ConfigError, ProviderError, StoreError, StoreResult};
pub use provider::AuthProvider;
pub use traits::{AccountHandler, ChainValidator};
pub use types::{
    simple_auth_chain, AuthLink, LoginAttempt, LoginDecision, LoginFields, RejectionReason,
    AUTH_CHAIN_FIELD, LOGIN_TYPE, TIMESTAMP_FIELD,
};

use thiserror::Error;

/// Result type for account-store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Startup configuration errors. These are fatal: the provider must not be
/// constructed from an invalid configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required property 'trusted_servers'")]
    MissingTrustedServers,

    #[error("expected property 'trusted_servers' to be a list of strings")]
    TrustedServersNotAList,

    #[error("expected property 'trusted_servers' to have at least one element")]
    NoTrustedServers,
}

/// Account-store faults. These reflect infrastructure failure, never an
/// invalid credential.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("account store unavailable: {0}")]
    Unavailable(String),

    #[error("account store backend error: {0}")]
    Backend(String),
}

/// Faults surfaced by the provider to the host framework. A rejected
/// credential is not a fault; it resolves to an absent user id instead.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("account store fault: {0}")]
    Store(#[from] StoreError),
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Login kind handled by this provider. The claimed identity is the
/// blockchain address alone (the localpart); the domain must not be passed.
pub const LOGIN_TYPE: &str = "m.login.decentraland";

/// Required credential field carrying the signed timestamp (millis).
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Required credential field carrying the auth chain.
pub const AUTH_CHAIN_FIELD: &str = "auth_chain";

/// Credential fields submitted with one login attempt, as received from the
/// host framework. The `auth_chain` entry is treated as opaque and forwarded
/// to trusted verifiers verbatim.
pub type LoginFields = serde_json::Map<String, Value>;

/// One login attempt. Constructed per request, immutable, discarded once the
/// attempt resolves.
#[derive(Clone, Debug)]
pub struct LoginAttempt {
    /// Claimed identity: a blockchain address, compared case-insensitively.
    pub username: String,
    /// Login kind tag supplied by the client.
    pub login_type: String,
    /// Extra credential fields (`timestamp`, `auth_chain`).
    pub fields: LoginFields,
}

impl LoginAttempt {
    pub fn new(
        username: impl Into<String>,
        login_type: impl Into<String>,
        fields: LoginFields,
    ) -> Self {
        Self {
            username: username.into(),
            login_type: login_type.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// One signed link of an auth chain.
///
/// The provider never interprets links itself; this type exists so callers
/// and tests can construct well-formed chains to submit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthLink {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: String,
    pub signature: String,
}

impl AuthLink {
    /// Root link naming the signing address.
    pub fn signer(address: impl Into<String>) -> Self {
        Self {
            kind: "SIGNER".to_string(),
            payload: address.into(),
            signature: String::new(),
        }
    }

    /// Terminal link carrying the signature over the payload.
    pub fn signed_entity(payload: impl Into<String>, signature: impl Into<String>) -> Self {
        Self {
            kind: "ECDSA_SIGNED_ENTITY".to_string(),
            payload: payload.into(),
            signature: signature.into(),
        }
    }
}

/// Two-link chain asserting that `address` signed `payload` directly.
pub fn simple_auth_chain(
    address: impl Into<String>,
    payload: impl Into<String>,
    signature: impl Into<String>,
) -> Vec<AuthLink> {
    vec![
        AuthLink::signer(address),
        AuthLink::signed_entity(payload, signature),
    ]
}

/// Why a credential was not accepted. Diagnostic value, never a fault.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectionReason {
    /// The provider is administratively disabled.
    Disabled,
    /// The login kind tag is not the one this provider supports.
    UnsupportedKind,
    /// `timestamp` or `auth_chain` was not provided.
    MissingFields,
    /// The timestamp is too old, or could not be parsed.
    Stale,
    /// The timestamp is too far into the future.
    Future,
    /// No trusted verifier produced a conclusive valid verdict.
    InvalidChain,
    /// The verified owner address does not match the claimed identity.
    IdentityMismatch,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::Disabled => "provider disabled",
            RejectionReason::UnsupportedKind => "unsupported login type",
            RejectionReason::MissingFields => "required fields not provided",
            RejectionReason::Stale => "timestamp too old",
            RejectionReason::Future => "timestamp too far into the future",
            RejectionReason::InvalidChain => "auth chain invalid",
            RejectionReason::IdentityMismatch => "owner address does not match username",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state of one login attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginDecision {
    /// Credential accepted; carries the qualified user id.
    Accepted(String),
    /// Credential rejected; the host may fall through to other providers.
    Rejected(RejectionReason),
}

impl LoginDecision {
    /// Qualified user id for an accepted attempt, absence for a rejection.
    pub fn into_user_id(self) -> Option<String> {
        match self {
            LoginDecision::Accepted(user_id) => Some(user_id),
            LoginDecision::Rejected(_) => None,
        }
    }
}

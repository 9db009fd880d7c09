//! Authentication and role authorization: token codec, session cookie,
//! password hashing and the Role Gate.

pub mod cookie;
pub mod password;
pub mod role_gate;
pub mod token;

use std::time::Duration;

pub use cookie::{read_token, SessionCookies, TOKEN_COOKIE};
pub use role_gate::{AllowlistPolicy, DenyReason, GateDecision, RoleGate};
pub use token::{Claims, TokenCodec};

use crate::config::Config;

/// Everything request handling needs to authenticate callers. Immutable and
/// shared by every request.
#[derive(Clone)]
pub struct AuthContext {
    pub codec: TokenCodec,
    pub cookies: SessionCookies,
    pub policy: AllowlistPolicy,
}

impl AuthContext {
    pub fn new(secret: &str, ttl: Duration, secure_cookies: bool, policy: AllowlistPolicy) -> Self {
        Self {
            codec: TokenCodec::new(secret, ttl),
            cookies: SessionCookies::new(secure_cookies, ttl),
            policy,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            Duration::from_secs(config.token_ttl_secs),
            config.environment.secure_cookies(),
            config.enforce_role_allowlist.into(),
        )
    }

    /// Binds a gate admitting `roles`.
    pub fn gate<I, S>(&self, roles: I) -> RoleGate
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RoleGate::new(self.codec.clone(), roles, self.policy)
    }

    pub fn any_role(&self) -> RoleGate {
        RoleGate::any_role(self.codec.clone())
    }
}

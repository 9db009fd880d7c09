//! Role-gated access.
//!
//! A [`RoleGate`] is bound once per protected route with the roles that route
//! admits. It can answer a request itself ([`respond`]) or guard a wrapped
//! handler ([`require_role`]).
//!
//! By default the decoded role is not compared against the allowed set: any
//! valid token is admitted and its role echoed back. [`AllowlistPolicy::Enforce`]
//! (`ROLE_GATE_ENFORCE_ALLOWLIST=true`) turns on the membership check.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::cookie::read_token;
use super::token::{Claims, TokenCodec};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AllowlistPolicy {
    /// Admit every verified token regardless of role.
    #[default]
    Ignore,
    /// Admit only verified tokens whose role is in the gate's allowed set.
    Enforce,
}

impl From<bool> for AllowlistPolicy {
    fn from(enforce: bool) -> Self {
        if enforce {
            AllowlistPolicy::Enforce
        } else {
            AllowlistPolicy::Ignore
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    InvalidToken,
    RoleNotAllowed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Authorized(Claims),
    Denied(DenyReason),
}

#[derive(Clone)]
pub struct RoleGate {
    codec: TokenCodec,
    allowed: Option<Arc<BTreeSet<String>>>,
    policy: AllowlistPolicy,
}

impl RoleGate {
    pub fn new<I, S>(codec: TokenCodec, allowed: I, policy: AllowlistPolicy) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            codec,
            allowed: Some(Arc::new(allowed.into_iter().map(Into::into).collect())),
            policy,
        }
    }

    /// A gate that admits any role carried by a valid token.
    pub fn any_role(codec: TokenCodec) -> Self {
        Self {
            codec,
            allowed: None,
            policy: AllowlistPolicy::Ignore,
        }
    }

    pub fn permits(&self, role: &str) -> bool {
        self.allowed
            .as_ref()
            .map_or(true, |allowed| allowed.contains(role))
    }

    pub fn decide(&self, headers: &HeaderMap) -> GateDecision {
        // A missing cookie is verified as an empty token and fails like any other.
        let token = read_token(headers).unwrap_or_default();

        let Some(claims) = self.codec.verify(&token) else {
            return GateDecision::Denied(DenyReason::InvalidToken);
        };

        if self.policy == AllowlistPolicy::Enforce && !self.permits(&claims.role) {
            tracing::warn!(role = %claims.role, "Role not in allowed set");
            return GateDecision::Denied(DenyReason::RoleNotAllowed);
        }

        if !self.permits(&claims.role) {
            tracing::debug!(role = %claims.role, "Admitting role outside allowed set");
        }

        GateDecision::Authorized(claims)
    }
}

/// Answers the request directly: 200 with the bare role string, or 403.
pub async fn respond(State(gate): State<RoleGate>, headers: HeaderMap) -> Response {
    match gate.decide(&headers) {
        GateDecision::Authorized(claims) => (StatusCode::OK, Json(claims.role)).into_response(),
        GateDecision::Denied(_) => AppError::AuthDenied.into_response(),
    }
}

/// Guards the wrapped route, exposing the verified [`Claims`] as a request
/// extension.
pub async fn require_role(State(gate): State<RoleGate>, mut req: Request, next: Next) -> Response {
    match gate.decide(req.headers()) {
        GateDecision::Authorized(claims) => {
            req.extensions_mut().insert(claims);
            next.run(req).await
        }
        GateDecision::Denied(_) => AppError::AuthDenied.into_response(),
    }
}

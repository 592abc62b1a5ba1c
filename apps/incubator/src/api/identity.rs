//! # Caller Identity
//!
//! The upstream auth provider forwards the authenticated person as headers:
//!
//! ```text
//! X-Actor-Id:   u-1842
//! X-Actor-Name: Dana Reviewer
//! X-Actor-Role: reviewer
//! ```
//!
//! A request with a missing id, a missing role or an unknown role is
//! treated as unauthenticated. Unauthenticated callers get the same
//! authorization error as callers whose role may not act.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use incubator_core::{Actor, AuthorizationGate, Role, StageKey, WorkflowError};
use std::convert::Infallible;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Identity of the caller, if the headers carried a valid one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller(Option<Actor>);

impl Caller {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self(actor_from_headers(headers))
    }

    /// Caller known to be `actor`, as on the command line.
    #[must_use]
    pub fn acting(actor: Actor) -> Self {
        Self(Some(actor))
    }

    #[must_use]
    pub fn actor(&self) -> Option<&Actor> {
        self.0.as_ref()
    }

    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.0.as_ref().map(|actor| actor.role)
    }

    /// True iff the caller may act on `stage`.
    #[must_use]
    pub fn can_act(&self, stage: StageKey) -> bool {
        AuthorizationGate::authorize(self.role(), stage).is_ok()
    }

    /// Require read access to an assessment sitting at `stage`.
    pub fn require_view(&self, stage: StageKey) -> Result<(), WorkflowError> {
        match self.role() {
            Some(role) if AuthorizationGate::can_view(role, stage) => Ok(()),
            _ => Err(WorkflowError::Authorization { stage }),
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let id = header_str(headers, ACTOR_ID_HEADER)?;
    let role = match header_str(headers, ACTOR_ROLE_HEADER)?.parse::<Role>() {
        Ok(role) => role,
        Err(e) => {
            tracing::warn!(event = "identity_rejected", actor = id, "{}", e);
            return None;
        }
    };
    let name = header_str(headers, ACTOR_NAME_HEADER).unwrap_or(id);
    Some(Actor::new(id, name, role))
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn full_identity_is_read() {
        let caller = Caller::from_headers(&headers(&[
            (ACTOR_ID_HEADER, "u-7"),
            (ACTOR_NAME_HEADER, "Dana Reviewer"),
            (ACTOR_ROLE_HEADER, "Reviewer"),
        ]));
        assert_eq!(
            caller.actor(),
            Some(&Actor::new("u-7", "Dana Reviewer", Role::Reviewer))
        );
    }

    #[test]
    fn name_defaults_to_id() {
        let caller = Caller::from_headers(&headers(&[
            (ACTOR_ID_HEADER, "u-7"),
            (ACTOR_ROLE_HEADER, "viewer"),
        ]));
        assert_eq!(caller.actor().map(|a| a.name.as_str()), Some("u-7"));
    }

    #[test]
    fn unknown_role_is_unauthenticated() {
        let caller = Caller::from_headers(&headers(&[
            (ACTOR_ID_HEADER, "u-7"),
            (ACTOR_ROLE_HEADER, "superuser"),
        ]));
        assert_eq!(caller, Caller::default());
    }

    #[test]
    fn unauthenticated_matches_wrong_role() {
        let anonymous = Caller::default();
        let viewer = Caller::from_headers(&headers(&[
            (ACTOR_ID_HEADER, "u-7"),
            (ACTOR_ROLE_HEADER, "viewer"),
        ]));

        let stage = StageKey::TechnicalReview;
        assert!(!anonymous.can_act(stage));
        assert!(!viewer.can_act(stage));
        assert!(viewer.require_view(stage).is_ok());
        assert_eq!(
            anonymous.require_view(stage),
            Err(WorkflowError::Authorization { stage })
        );
    }
}

//! # Service Key
//!
//! The API sits behind the incubator portal, which holds a single shared
//! service key. When `INCUBATOR_API_KEY` is set, every request except
//! `/health` must present it:
//!
//! ```text
//! Authorization: Bearer <service-key>
//! ```
//!
//! The key says which *service* is calling. Which *person* is acting comes
//! from the `X-Actor-*` headers the portal forwards, see [`super::identity`].
//! Without a key those headers are trusted from any client.

use super::types::ErrorResponse;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;

/// Environment variable holding the portal's service key.
pub const API_KEY_ENV: &str = "INCUBATOR_API_KEY";

/// Paths reachable without the service key (load balancer health checks).
const OPEN_PATHS: &[&str] = &["/health"];

/// The shared secret the portal presents on every call.
#[derive(Clone)]
pub struct ServiceKey(String);

impl std::fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ServiceKey(..)")
    }
}

impl ServiceKey {
    /// Key from [`API_KEY_ENV`]; `None` when unset or empty.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.is_empty())
            .map(Self)
    }

    /// Check the `Authorization` header of a request.
    ///
    /// Accepts `Bearer <key>` or the raw key.
    pub fn verify(&self, headers: &HeaderMap) -> Result<(), KeyRejection> {
        let presented = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(KeyRejection::Missing)?;
        let presented = presented.strip_prefix("Bearer ").unwrap_or(presented);

        if self.matches(presented) {
            Ok(())
        } else {
            Err(KeyRejection::Invalid)
        }
    }

    /// Constant-time comparison; length is compared only after the bytes.
    fn matches(&self, presented: &str) -> bool {
        let expected = self.0.as_bytes();
        let presented = presented.as_bytes();

        let len = presented.len().max(expected.len());
        let mut lhs = vec![0u8; len];
        let mut rhs = vec![0u8; len];
        lhs[..presented.len()].copy_from_slice(presented);
        rhs[..expected.len()].copy_from_slice(expected);

        let bytes_match: bool = lhs.ct_eq(&rhs).into();
        bytes_match && presented.len() == expected.len()
    }
}

/// Why a request was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRejection {
    Missing,
    Invalid,
}

impl KeyRejection {
    fn reason(self) -> &'static str {
        match self {
            Self::Missing => "missing_authorization_header",
            Self::Invalid => "invalid_api_key",
        }
    }
}

impl IntoResponse for KeyRejection {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: "Unauthorized".to_string(),
            error_kind: "unauthorized".to_string(),
            missing_fields: Vec::new(),
            blockers: Vec::new(),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

/// Middleware requiring the service key on every non-open path.
pub async fn require_service_key(
    State(key): State<ServiceKey>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, KeyRejection> {
    if OPEN_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    if let Err(rejection) = key.verify(request.headers()) {
        tracing::warn!(
            event = "auth_failure",
            reason = rejection.reason(),
            path = request.uri().path(),
            "Service key rejected"
        );
        return Err(rejection);
    }
    Ok(next.run(request).await)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn key() -> ServiceKey {
        ServiceKey("s3cret".to_string())
    }

    fn with_auth(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn bearer_and_raw_key_accepted() {
        assert_eq!(key().verify(&with_auth("Bearer s3cret")), Ok(()));
        assert_eq!(key().verify(&with_auth("s3cret")), Ok(()));
    }

    #[test]
    fn prefix_or_extension_of_key_rejected() {
        for value in ["Bearer s3c", "Bearer s3cret-and-more", "Bearer "] {
            assert_eq!(key().verify(&with_auth(value)), Err(KeyRejection::Invalid));
        }
    }

    #[test]
    fn missing_header_rejected() {
        assert_eq!(key().verify(&HeaderMap::new()), Err(KeyRejection::Missing));
    }

    #[test]
    fn debug_hides_the_key() {
        assert!(!format!("{:?}", key()).contains("s3cret"));
    }
}

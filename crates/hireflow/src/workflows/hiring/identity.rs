//! Bearer credential resolution.
//!
//! Credentials take the form `<kind>.<id>.<expires_unix>.<signature>` where the signature is
//! a hex-encoded HMAC-SHA256 over the first three segments.

use std::fmt;

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::domain::{ClientId, Principal, PrincipalKind, WorkerId};

type HmacSha256 = Hmac<Sha256>;

/// Turns an opaque bearer credential into a principal.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Result<Principal, IdentityError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("credential missing")]
    Missing,
    #[error("credential malformed")]
    Malformed,
    #[error("credential signature invalid")]
    BadSignature,
    #[error("credential expired")]
    Expired,
}

/// Issues and verifies HMAC-signed credentials.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: impl AsRef<[u8]>, ttl_hours: u64) -> Self {
        // Capped at ten years.
        let hours = ttl_hours.min(87_600) as i64;
        Self {
            secret: secret.as_ref().to_vec(),
            ttl: Duration::hours(hours),
        }
    }

    pub fn issue(&self, principal: Principal) -> String {
        self.issue_at(principal, Utc::now())
    }

    pub fn issue_at(&self, principal: Principal, now: DateTime<Utc>) -> String {
        let expires = (now + self.ttl).timestamp();
        let claims = format!(
            "{}.{}.{}",
            principal.kind().label(),
            principal.raw_id(),
            expires
        );
        let signature = hex::encode(self.mac(&claims).finalize().into_bytes());
        format!("{claims}.{signature}")
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Principal, IdentityError> {
        let (claims, signature) = token.rsplit_once('.').ok_or(IdentityError::Malformed)?;
        let signature = hex::decode(signature).map_err(|_| IdentityError::Malformed)?;
        self.mac(claims)
            .verify_slice(&signature)
            .map_err(|_| IdentityError::BadSignature)?;

        let mut parts = claims.splitn(3, '.');
        let kind = match parts.next() {
            Some("client") => PrincipalKind::Client,
            Some("worker") => PrincipalKind::Worker,
            _ => return Err(IdentityError::Malformed),
        };
        let id = parts
            .next()
            .and_then(|raw| raw.parse::<u64>().ok())
            .ok_or(IdentityError::Malformed)?;
        let expires = parts
            .next()
            .and_then(|raw| raw.parse::<i64>().ok())
            .ok_or(IdentityError::Malformed)?;

        if now.timestamp() >= expires {
            return Err(IdentityError::Expired);
        }

        Ok(match kind {
            PrincipalKind::Client => Principal::Client(ClientId(id)),
            PrincipalKind::Worker => Principal::Worker(WorkerId(id)),
        })
    }

    fn mac(&self, claims: &str) -> HmacSha256 {
        // HMAC accepts keys of any length.
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!("hmac keys are unbounded"));
        mac.update(claims.as_bytes());
        mac
    }
}

impl IdentityResolver for TokenSigner {
    fn resolve(&self, token: &str) -> Result<Principal, IdentityError> {
        self.verify_at(token, Utc::now())
    }
}

/// Extracts the credential from an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

pub fn authenticate(
    resolver: &dyn IdentityResolver,
    headers: &HeaderMap,
) -> Result<Principal, IdentityError> {
    let token = bearer_token(headers).ok_or(IdentityError::Missing)?;
    resolver.resolve(token)
}

/// Static operator credential guarding moderation routes.
#[derive(Clone, Default)]
pub struct OperatorKey(Option<String>);

impl fmt::Debug for OperatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OperatorKey")
            .field(&self.0.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl OperatorKey {
    pub fn new(key: Option<String>) -> Self {
        Self(key)
    }

    /// Constant-time comparison; always false when no key is configured.
    pub fn admits(&self, headers: &HeaderMap) -> bool {
        let (Some(expected), Some(presented)) = (self.0.as_deref(), bearer_token(headers)) else {
            return false;
        };
        let expected = expected.as_bytes();
        let presented = presented.as_bytes();
        if expected.len() != presented.len() {
            return false;
        }
        expected
            .iter()
            .zip(presented)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn signer() -> TokenSigner {
        TokenSigner::new("unit-test-secret", 1)
    }

    #[test]
    fn issued_tokens_round_trip_to_principal() {
        let signer = signer();
        let token = signer.issue(Principal::Worker(WorkerId(42)));
        assert_eq!(signer.resolve(&token), Ok(Principal::Worker(WorkerId(42))));
    }

    #[test]
    fn tampered_claims_fail_signature_check() {
        let signer = signer();
        let token = signer.issue(Principal::Client(ClientId(1)));
        let forged = token.replacen("client.1.", "client.2.", 1);
        assert_eq!(signer.resolve(&forged), Err(IdentityError::BadSignature));

        let other = TokenSigner::new("different-secret", 1);
        assert_eq!(other.resolve(&token), Err(IdentityError::BadSignature));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let signer = signer();
        let issued = Utc::now() - Duration::hours(2);
        let token = signer.issue_at(Principal::Client(ClientId(9)), issued);
        assert_eq!(signer.resolve(&token), Err(IdentityError::Expired));
    }

    #[test]
    fn garbage_is_malformed() {
        assert_eq!(signer().resolve("not-a-token"), Err(IdentityError::Malformed));
        assert_eq!(signer().resolve("a.b.c.zz"), Err(IdentityError::Malformed));
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));
    }

    #[test]
    fn operator_key_requires_exact_match() {
        let key = OperatorKey::new(Some("ops-key".to_string()));
        let mut headers = HeaderMap::new();
        assert!(!key.admits(&headers));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer ops-kex"));
        assert!(!key.admits(&headers));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer ops-key"));
        assert!(key.admits(&headers));
        assert!(!OperatorKey::default().admits(&headers));
    }
}

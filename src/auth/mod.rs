//! Signed session tokens with issue-time revocation.
//!
//! Every successful issuance records its instant per principal. A token is
//! only accepted while its `iat` is at least the recorded instant, so the
//! latest login invalidates everything issued before it.

pub mod issuer;
pub mod keys;
pub mod revocation;
pub mod validator;

pub use issuer::Issuer;
pub use keys::{KeyError, Keys};
pub use revocation::{MemoryRevocationStore, RevocationStore, StoreError};
pub use validator::Validator;

use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Seconds between issuance and expiry.
pub const TOKEN_LIFETIME_SECS: i64 = 15 * 60;
pub const DEFAULT_AUDIENCE: &str = "api";
pub const DEFAULT_ISSUER: &str = "http://localhost:8080";

/// Attribute snapshot of the authenticated user, frozen at issuance.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub bio: String,
    pub image: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub user: Principal,
    pub aud: String,
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(principal: Principal, audience: &str, issuer: &str, now: Timestamp) -> Claims {
        let now = now.unix();
        Claims {
            sub: principal.id.to_string(),
            user: principal,
            aud: audience.to_owned(),
            iss: issuer.to_owned(),
            iat: now,
            nbf: now,
            exp: now + TOKEN_LIFETIME_SECS,
        }
    }
}

/// What a successful validation hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified {
    pub principal: Principal,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("no token presented")]
    Missing,
    #[error("invalid token: {0}")]
    BadSignature(String),
    #[error("token expired")]
    Expired,
    #[error("no issuance recorded for principal {0}")]
    UnknownPrincipal(i64),
    #[error("token issued at {issued_at} superseded by issuance at {latest}")]
    StaleIssuance {
        issued_at: Timestamp,
        latest: Timestamp,
    },
    #[error("could not sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// True for the kinds that mean "this token is not acceptable", as
    /// opposed to a failure on our side.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AuthError::Missing
                | AuthError::BadSignature(_)
                | AuthError::Expired
                | AuthError::UnknownPrincipal(_)
                | AuthError::StaleIssuance { .. }
        )
    }
}

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Issuer and validator sharing one revocation store. Managed as Rocket state.
#[derive(Clone)]
pub struct Tokens {
    pub issuer: Arc<Issuer>,
    pub validator: Arc<Validator>,
}

impl Tokens {
    pub fn new(
        keys: Keys,
        audience: &str,
        issuer: &str,
        store: Arc<dyn RevocationStore>,
        clock: Arc<dyn Clock>,
    ) -> Tokens {
        Tokens {
            issuer: Arc::new(Issuer::new(
                keys.encoding,
                audience,
                issuer,
                store.clone(),
                clock.clone(),
            )),
            validator: Arc::new(Validator::new(
                keys.decoding,
                audience,
                issuer,
                store,
                clock,
            )),
        }
    }

    pub fn issue(&self, principal: &Principal) -> Result<String, AuthError> {
        self.issuer.issue(principal)
    }

    pub fn validate(&self, token: &str) -> Result<Verified, AuthError> {
        self.validator.validate(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> Principal {
        Principal {
            id: 7,
            email: "jane@example.com".into(),
            username: "jane".into(),
            bio: String::new(),
            image: None,
        }
    }

    #[test]
    fn claims_carry_subject_and_fifteen_minute_window() {
        let now = Timestamp::from_unix(1_700_000_000).unwrap();
        let claims = Claims::new(jane(), "api", "http://localhost:8080", now);
        assert_eq!(claims.sub, "7");
        assert_eq!(claims.iat, claims.nbf);
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.user, jane());
    }

    #[test]
    fn store_failures_are_not_rejections() {
        assert!(AuthError::Expired.is_rejection());
        assert!(AuthError::UnknownPrincipal(1).is_rejection());
        assert!(!AuthError::Store(StoreError::Backend("down".into())).is_rejection());
    }
}

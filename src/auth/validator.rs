use super::{AuthError, Claims, Clock, RevocationStore, Verified};
use crate::timestamp::Timestamp;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;

pub struct Validator {
    key: DecodingKey,
    validation: Validation,
    store: Arc<dyn RevocationStore>,
    clock: Arc<dyn Clock>,
}

impl Validator {
    pub fn new(
        key: DecodingKey,
        audience: &str,
        issuer: &str,
        store: Arc<dyn RevocationStore>,
        clock: Arc<dyn Clock>,
    ) -> Validator {
        let mut validation = Validation::new(Algorithm::EdDSA);
        // The window is judged against `clock`, not the system time.
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_audience(&[audience]);
        validation.set_issuer(&[issuer]);
        validation.set_required_spec_claims(&["exp", "nbf", "aud", "iss"]);
        Validator {
            key,
            validation,
            store,
            clock,
        }
    }

    /// Checks signature, window, and that no newer token has been issued
    /// for the same principal.
    pub fn validate(&self, token: &str) -> Result<Verified, AuthError> {
        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::BadSignature(e.to_string()))?
            .claims;

        let now = self.clock.now().unix();
        if claims.exp < now {
            return Err(AuthError::Expired);
        }
        if claims.nbf > now {
            return Err(AuthError::BadSignature("token is not yet valid".into()));
        }

        let principal_id = claims.user.id;
        if claims.sub != principal_id.to_string() {
            return Err(AuthError::BadSignature(
                "subject does not match principal".into(),
            ));
        }
        let issued_at = instant(claims.iat)?;
        let expires_at = instant(claims.exp)?;

        // Always re-read; a concurrent issuance must be seen.
        match self.store.get(principal_id)? {
            None => Err(AuthError::UnknownPrincipal(principal_id)),
            Some(latest) if issued_at < latest => {
                Err(AuthError::StaleIssuance { issued_at, latest })
            }
            Some(_) => Ok(Verified {
                principal: claims.user,
                issued_at,
                expires_at,
            }),
        }
    }
}

fn instant(secs: i64) -> Result<Timestamp, AuthError> {
    Timestamp::from_unix(secs)
        .ok_or_else(|| AuthError::BadSignature(format!("timestamp {} out of range", secs)))
}

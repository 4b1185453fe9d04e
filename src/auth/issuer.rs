use super::{AuthError, Claims, Clock, Principal, RevocationStore};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use std::sync::Arc;

pub struct Issuer {
    key: EncodingKey,
    audience: String,
    issuer: String,
    store: Arc<dyn RevocationStore>,
    clock: Arc<dyn Clock>,
}

impl Issuer {
    pub fn new(
        key: EncodingKey,
        audience: &str,
        issuer: &str,
        store: Arc<dyn RevocationStore>,
        clock: Arc<dyn Clock>,
    ) -> Issuer {
        Issuer {
            key,
            audience: audience.to_owned(),
            issuer: issuer.to_owned(),
            store,
            clock,
        }
    }

    /// Signs a token for `principal` and makes it the only valid one.
    ///
    /// The revocation entry is written only once signing has succeeded.
    pub fn issue(&self, principal: &Principal) -> Result<String, AuthError> {
        let now = self.clock.now().trunc_secs();
        let claims = Claims::new(principal.clone(), &self.audience, &self.issuer, now);
        let token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.key)
            .map_err(AuthError::Signing)?;

        self.store.set(principal.id, now)?;
        log::info!("Issued token for user {} at {}", principal.id, now);
        Ok(token)
    }
}

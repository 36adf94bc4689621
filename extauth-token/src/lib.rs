//! # Extauth Token
//!
//! Signs and verifies the OAuth `state` parameter. The state is a compact HS256 JWT carrying
//! [`StateClaims`] plus issued-at and expiry times, so both halves of the redirect flow stay
//! stateless on the server.

use chrono::{Duration, Utc};
use extauth_core::{AuthError, StateClaims};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The only algorithm state tokens are signed or accepted with.
pub const STATE_ALGORITHM: Algorithm = Algorithm::HS256;

/// Default lifetime of a state token.
pub const DEFAULT_STATE_TTL_SECS: i64 = 300;

/// Errors raised while signing or verifying a state token.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("state token has expired")]
    Expired,
    #[error("state token uses an unexpected signing algorithm")]
    AlgorithmMismatch,
    #[error("state token signature is invalid")]
    InvalidSignature,
    #[error("state token is malformed: {0}")]
    Malformed(String),
    #[error("failed to sign state token: {0}")]
    Signing(String),
}

impl From<jsonwebtoken::errors::Error> for StateError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => StateError::Expired,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
                StateError::AlgorithmMismatch
            }
            ErrorKind::InvalidSignature => StateError::InvalidSignature,
            _ => StateError::Malformed(e.to_string()),
        }
    }
}

impl From<StateError> for AuthError {
    fn from(e: StateError) -> Self {
        AuthError::InvalidState(e.to_string())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SignedState {
    #[serde(flatten)]
    claims: StateClaims,
    iat: i64,
    exp: i64,
}

/// Signs and verifies [`StateClaims`] with a server-wide secret.
#[derive(Clone)]
pub struct StateCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl StateCodec {
    /// Create a codec for `secret` whose tokens live for `ttl`.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(STATE_ALGORITHM);
        validation.algorithms = vec![STATE_ALGORITHM];
        validation.set_required_spec_claims(&["exp", "iat"]);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Lifetime of tokens produced by [`StateCodec::sign`].
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign `claims` into a compact token.
    pub fn sign(&self, claims: &StateClaims) -> Result<String, StateError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| StateError::Signing(format!("TTL of {} overflows", self.ttl)))?;
        let signed = SignedState {
            claims: claims.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&Header::new(STATE_ALGORITHM), &signed, &self.encoding_key)
            .map_err(|e| StateError::Signing(e.to_string()))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<StateClaims, StateError> {
        let data = decode::<SignedState>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;

    const SECRET: &[u8] = b"testsecret";

    fn codec() -> StateCodec {
        StateCodec::new(SECRET, Duration::seconds(DEFAULT_STATE_TTL_SECS))
    }

    fn claims() -> StateClaims {
        StateClaims::new("descope", "http://localhost:3000")
            .with_referrer("http://localhost:3000/welcome")
            .with_linking_target("user-1")
    }

    fn forge(alg: Algorithm, secret: &[u8], exp_offset: i64) -> String {
        let now = Utc::now().timestamp();
        let body = serde_json::json!({
            "provider": "descope",
            "site_url": "http://localhost:3000",
            "iat": now,
            "exp": now + exp_offset,
        });
        encode(&Header::new(alg), &body, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn sign_then_verify_returns_claims() {
        let codec = codec();
        let token = codec.sign(&claims()).unwrap();
        assert_eq!(codec.verify(&token).unwrap(), claims());
    }

    #[test]
    fn optional_fields_survive_absent() {
        let codec = codec();
        let plain = StateClaims::new("descope", "http://localhost:3000");
        let token = codec.sign(&plain).unwrap();
        let verified = codec.verify(&token).unwrap();
        assert_eq!(verified, plain);
        assert!(verified.invite_token.is_none());
    }

    #[test]
    fn rejects_other_secret() {
        let token = StateCodec::new(b"other", Duration::minutes(5))
            .sign(&claims())
            .unwrap();
        assert!(matches!(codec().verify(&token), Err(StateError::InvalidSignature)));
    }

    #[test]
    fn rejects_other_algorithm_with_same_secret() {
        let token = forge(Algorithm::HS384, SECRET, 300);
        assert!(matches!(codec().verify(&token), Err(StateError::AlgorithmMismatch)));
    }

    #[test]
    fn rejects_unsigned_token() {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"none","typ":"JWT"}"#);
        let now = Utc::now().timestamp();
        let body = URL_SAFE_NO_PAD.encode(
            serde_json::json!({
                "provider": "descope",
                "site_url": "http://localhost:3000",
                "iat": now,
                "exp": now + 300,
            })
            .to_string(),
        );
        let token = format!("{header}.{body}.");
        assert!(codec().verify(&token).is_err());
    }

    #[test]
    fn rejects_expired_token() {
        let token = forge(STATE_ALGORITHM, SECRET, -60);
        assert!(matches!(codec().verify(&token), Err(StateError::Expired)));
    }

    #[test]
    fn rejects_tampered_payload() {
        let codec = codec();
        let token = codec.sign(&claims()).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        let evil = URL_SAFE_NO_PAD.encode(
            serde_json::json!({
                "provider": "evil",
                "site_url": "https://evil.example",
                "iat": Utc::now().timestamp(),
                "exp": Utc::now().timestamp() + 300,
            })
            .to_string(),
        );
        parts[1] = &evil;
        assert!(codec.verify(&parts.join(".")).is_err());
    }

    #[test]
    fn overflowing_ttl_fails_to_sign() {
        let codec = StateCodec::new(SECRET, Duration::seconds(i64::MAX / 1000));
        assert!(matches!(codec.sign(&claims()), Err(StateError::Signing(_))));
    }

    #[test]
    fn state_errors_become_invalid_state() {
        let err: AuthError = StateError::Expired.into();
        assert!(matches!(err, AuthError::InvalidState(_)));
    }
}

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::user::User;

#[derive(Debug, Error)]
pub(crate) enum JwtError {
    #[error("token encode failed")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("token decode/validation failed")]
    Decode(#[source] jsonwebtoken::errors::Error),
}

/// Identity carried by an access token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub(crate) struct Claims {
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) exp: i64,
}

pub(crate) struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl JwtService {
    const DEFAULT_TTL_SECONDS: i64 = 24 * 60 * 60;
    const LEEWAY_SECONDS: u64 = 10;

    pub(crate) fn new(secret: &str, ttl_seconds: i64) -> Self {
        let ttl_seconds = if ttl_seconds > 0 {
            ttl_seconds
        } else {
            Self::DEFAULT_TTL_SECONDS
        };

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds,
        }
    }

    pub(crate) fn generate_token(&self, user: &User) -> Result<String, JwtError> {
        let claims = Claims {
            user_id: user.id,
            username: user.username.clone(),
            exp: (Utc::now() + Duration::seconds(self.ttl_seconds)).timestamp(),
        };
        self.encode_claims(&claims)
    }

    pub(crate) fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = Self::LEEWAY_SECONDS;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(JwtError::Decode)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(JwtError::Encode)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::{Claims, JwtError, JwtService};
    use crate::domain::user::User;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn user() -> User {
        User::new(7, "amalia", "amalia@example.com", Utc::now()).expect("valid user")
    }

    #[test]
    fn generated_token_carries_identity() {
        let jwt = JwtService::new(SECRET, 3600);
        let token = jwt.generate_token(&user()).expect("token must encode");

        let claims = jwt.verify_token(&token).expect("token must verify");
        assert_eq!(claims.user_id, 7);
        assert_eq!(claims.username, "amalia");
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = JwtService::new("another-secret-another-secret-xx", 3600);
        let token = issuer.generate_token(&user()).expect("token must encode");

        let err = JwtService::new(SECRET, 3600)
            .verify_token(&token)
            .expect_err("signature must not match");
        assert!(matches!(err, JwtError::Decode(_)));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = JwtService::new(SECRET, 3600);
        let token = jwt
            .encode_claims(&Claims {
                user_id: 7,
                username: "amalia".to_string(),
                exp: (Utc::now() - Duration::hours(1)).timestamp(),
            })
            .expect("token must encode");

        assert!(jwt.verify_token(&token).is_err());
    }
}

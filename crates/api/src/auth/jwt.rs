//! JWT access-token validation.
//!
//! Tokens are issued by the account service; this server only verifies
//! HS256 signatures against the shared secret and reads the user id out
//! of the claims.

use jsonwebtoken::{decode, DecodingKey, Validation};
use lumina_core::types::DbId;
use serde::{Deserialize, Serialize};

/// JWT claims embedded in every access token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's internal database id.
    pub sub: DbId,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
}

/// Configuration for JWT token validation.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC-SHA256 secret shared with the token issuer.
    pub secret: String,
}

impl JwtConfig {
    /// Load JWT configuration from environment variables.
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!secret.is_empty(), "JWT_SECRET must not be empty");

        Self { secret }
    }
}

/// Validate and decode an access token, returning the embedded [`Claims`].
///
/// Validates the signature and expiration automatically.
pub fn validate_token(
    token: &str,
    config: &JwtConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(), // HS256, validates exp
    )?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;

    /// Helper to build a test config with a known secret.
    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".to_string(),
        }
    }

    fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("encoding should succeed")
    }

    #[test]
    fn valid_token_decodes_claims() {
        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let token = sign(
            &Claims {
                sub: 42,
                exp: now + 900,
                iat: now,
            },
            &config.secret,
        );

        let claims = validate_token(&token, &config).expect("token validation should succeed");
        assert_eq!(claims.sub, 42);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn expired_token_fails() {
        let config = test_config();

        // Expired well beyond the default 60-second leeway.
        let now = chrono::Utc::now().timestamp();
        let token = sign(
            &Claims {
                sub: 1,
                exp: now - 300,
                iat: now - 600,
            },
            &config.secret,
        );

        assert!(
            validate_token(&token, &config).is_err(),
            "expired token must fail validation"
        );
    }

    #[test]
    fn different_secret_fails() {
        let config = test_config();
        let now = chrono::Utc::now().timestamp();
        let token = sign(
            &Claims {
                sub: 1,
                exp: now + 900,
                iat: now,
            },
            "some-other-secret",
        );

        assert!(
            validate_token(&token, &config).is_err(),
            "token signed with a different secret must fail"
        );
    }
}

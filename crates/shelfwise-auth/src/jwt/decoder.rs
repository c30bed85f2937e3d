//! Access token validation.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use shelfwise_core::config::auth::AuthConfig;

use crate::error::AuthError;

use super::claims::Claims;

/// Validates access tokens by signature and expiry alone.
#[derive(Clone)]
pub struct AccessTokenDecoder {
    /// HMAC secret key for verification.
    decoding_key: DecodingKey,
    /// Validation configuration.
    validation: Validation,
}

impl std::fmt::Debug for AccessTokenDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenDecoder")
            .field("validation", &self.validation)
            .finish()
    }
}

impl AccessTokenDecoder {
    /// Creates a new decoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 5; // 5 seconds leeway for clock skew

        Self {
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
        }
    }

    /// Decodes and validates an access token string.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::Unauthorized,
                }
            })?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::encoder::AccessTokenEncoder;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use shelfwise_entity::user::UserRole;
    use uuid::Uuid;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-signing-key".to_string(),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_roundtrip_preserves_subject_and_role() {
        let config = config();
        let encoder = AccessTokenEncoder::new(&config);
        let decoder = AccessTokenDecoder::new(&config);

        let user_id = Uuid::new_v4();
        let issued = encoder.issue(user_id, UserRole::Moderator).unwrap();
        let claims = decoder.decode(&issued.token).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.role, UserRole::Moderator);
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_rejects_expired_token() {
        let config = config();
        let decoder = AccessTokenDecoder::new(&config);

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: UserRole::User,
            iat: now - 3600,
            exp: now - 120,
            jti: Uuid::new_v4(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(matches!(
            decoder.decode(&token),
            Err(AuthError::TokenExpired)
        ));
    }

    #[test]
    fn test_rejects_wrong_signature() {
        let encoder = AccessTokenEncoder::new(&config());
        let other = AuthConfig {
            jwt_secret: "a-different-key".to_string(),
            ..AuthConfig::default()
        };
        let decoder = AccessTokenDecoder::new(&other);

        let issued = encoder.issue(Uuid::new_v4(), UserRole::User).unwrap();
        assert!(matches!(
            decoder.decode(&issued.token),
            Err(AuthError::Unauthorized)
        ));
    }
}

use jsonwebtoken::{encode, Header, decode, Validation, TokenData, Algorithm};
use chrono::{Utc, Duration};
use crate::entities::token::Claims;
use crate::repositories::token::TokenService;
use crate::settings::{AppConfig, JwtKeys};
use crate::errors::AuthError;

const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    expiration_hours: i64,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: JwtKeys::from(config),
            expiration_hours: config.jwt_expiration_hours,
        }
    }

    pub fn create_jwt(&self, username: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = (now + Duration::hours(self.expiration_hours)).timestamp() as usize;

        let claims = Claims {
            sub: username.to_string(),
            admin: true,
            exp,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.encoding).map_err(|e| {
            tracing::error!("JWT encoding failed: {}", e);
            AuthError::TokenCreation
        })
    }

    pub fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(token, &self.keys.decoding, &validation).map_err(AuthError::from)
    }
}

impl TokenService for JwtService {
    fn create_jwt(&self, username: &str) -> Result<String, AuthError> {
        self.create_jwt(username)
    }

    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        self.decode_jwt(token)
    }

    fn expires_in(&self) -> String {
        format!("{}h", self.expiration_hours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::EncodingKey;

    fn service(hours: i64) -> JwtService {
        JwtService {
            keys: JwtKeys {
                encoding: EncodingKey::from_secret(b"test-secret-that-is-long-enough-for-hs512"),
                decoding: jsonwebtoken::DecodingKey::from_secret(b"test-secret-that-is-long-enough-for-hs512"),
            },
            expiration_hours: hours,
        }
    }

    #[test]
    fn issued_token_decodes_to_admin_claims() {
        let jwt = service(24);
        let token = jwt.create_jwt("admin").unwrap();

        let claims = jwt.decode_jwt(&token).unwrap().claims;

        assert_eq!(claims.sub, "admin");
        assert!(claims.admin);
        assert!(claims.exp > claims.iat);
        assert_eq!(TokenService::expires_in(&jwt), "24h");
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let jwt = service(-1);
        let token = jwt.create_jwt("admin").unwrap();

        assert!(matches!(jwt.decode_jwt(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let other = JwtService {
            keys: JwtKeys {
                encoding: EncodingKey::from_secret(b"a-completely-different-secret-value!!"),
                decoding: jsonwebtoken::DecodingKey::from_secret(b"a-completely-different-secret-value!!"),
            },
            expiration_hours: 24,
        };
        let token = other.create_jwt("admin").unwrap();

        assert!(matches!(service(24).decode_jwt(&token), Err(AuthError::InvalidToken)));
    }
}

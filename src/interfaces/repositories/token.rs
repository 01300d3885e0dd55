use jsonwebtoken::TokenData;

use crate::{entities::token::Claims, errors::AuthError};

#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Issues a signed admin token for `username`
    fn create_jwt(&self, username: &str) -> Result<String, AuthError>;

    /// Decodes a token, rejecting bad signatures and expired tokens
    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError>;

    /// Human-readable lifetime reported to clients, e.g. `24h`
    fn expires_in(&self) -> String;
}

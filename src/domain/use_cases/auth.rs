use std::fmt;

use validator::Validate;
use zeroize::Zeroizing;

use crate::auth::password::verify_password;
use crate::entities::admin::{AdminIdentity, LoginRequest, VerifyResponse};
use crate::entities::token::{Claims, LoginResponse};
use crate::errors::{AppError, AuthError};
use crate::repositories::token::TokenService;
use crate::settings::AppConfig;

/// The single admin account, configured rather than stored.
#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    password_hash: Zeroizing<String>,
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        AdminCredentials {
            username: username.into(),
            password_hash: Zeroizing::new(password_hash.into()),
        }
    }
}

impl From<&AppConfig> for AdminCredentials {
    fn from(config: &AppConfig) -> Self {
        AdminCredentials::new(config.admin_username.clone(), config.admin_password_hash.clone())
    }
}

impl fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

pub struct AdminAuthHandler<T>
where
    T: TokenService,
{
    pub token_service: T,
    credentials: AdminCredentials,
}

impl<T> AdminAuthHandler<T>
where
    T: TokenService,
{
    pub fn new(token_service: T, credentials: AdminCredentials) -> Self {
        AdminAuthHandler {
            token_service,
            credentials,
        }
    }

    /// Checks the submitted credentials and issues an admin token
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AppError> {
        request.validate()?;

        // The hash is verified even for an unknown username so both failures cost the same
        let password_ok = verify_password(&request.password, &self.credentials.password_hash)
            .map_err(|e| {
                tracing::error!("Admin password hash could not be checked: {}", e);
                AuthError::WrongCredentials
            })?;
        let username_ok = request.username == self.credentials.username;

        if !(username_ok && password_ok) {
            tracing::warn!(username = %request.username, "Rejected admin login");
            return Err(AuthError::WrongCredentials.into());
        }

        let token = self.token_service.create_jwt(&self.credentials.username).map_err(|e| {
            tracing::warn!("Failed to create JWT: {}", e);
            AuthError::TokenCreation
        })?;

        tracing::info!(username = %self.credentials.username, "Admin logged in");
        Ok(LoginResponse::new(token, self.token_service.expires_in()))
    }

    /// Describes the admin behind an already verified token
    pub fn verify(&self, claims: &Claims) -> VerifyResponse {
        VerifyResponse {
            success: true,
            message: "Token is valid".to_string(),
            admin: AdminIdentity {
                username: claims.sub.clone(),
            },
        }
    }
}

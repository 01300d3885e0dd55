use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Admin username.
    pub sub: String,
    pub admin: bool,
    pub exp: usize,
    pub iat: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub expires_in: String,
}

impl LoginResponse {
    pub fn new(token: String, expires_in: String) -> Self {
        LoginResponse {
            success: true,
            message: "Login successful".to_string(),
            token,
            expires_in,
        }
    }
}

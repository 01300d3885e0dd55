use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entities::{contact_me::ContactMeMessage, project::Project};

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AdminIdentity {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub message: String,
    pub admin: AdminIdentity,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct DashboardStats {
    pub projects: i64,
    pub contacts: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub stats: DashboardStats,
    pub recent_projects: Vec<Project>,
    pub recent_contacts: Vec<ContactMeMessage>,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub success: bool,
    pub data: DashboardData,
}

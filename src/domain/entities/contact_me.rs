use std::{borrow::Cow, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::constants::{CONTACT_PAGE_CEILING, CONTACT_PAGE_DEFAULT, CONTACT_PAGE_MAX};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "contact_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    New,
    Read,
    Replied,
}

impl FromStr for ContactStatus {
    type Err = ValidationErrors;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "new" => Ok(ContactStatus::New),
            "read" => Ok(ContactStatus::Read),
            "replied" => Ok(ContactStatus::Replied),
            _ => {
                let mut errors = ValidationErrors::new();
                errors.add("status", new_validation_error("invalid_status", "Invalid status"));
                Err(errors)
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ContactMeForm {
    #[validate(custom(function = "validate_name"))]
    pub name: String,

    #[validate(email(message = "Valid email is required"))]
    pub email: String,

    #[validate(custom(function = "validate_subject"))]
    pub subject: String,

    #[validate(custom(function = "validate_message"))]
    pub message: String,
}

impl ContactMeForm {
    pub fn normalized(self) -> Self {
        ContactMeForm {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactMeInsert {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ContactMeForm> for ContactMeInsert {
    type Error = ValidationErrors;

    fn try_from(form: ContactMeForm) -> Result<Self, Self::Error> {
        let form = form.normalized();
        form.validate()?;

        Ok(ContactMeInsert {
            name: form.name,
            email: form.email,
            subject: form.subject,
            message: form.message,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ContactMeMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: ContactStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactListQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ContactListQuery {
    /// Unknown statuses are ignored rather than rejected.
    pub fn status_filter(&self) -> Option<ContactStatus> {
        self.status.as_deref().and_then(|s| s.parse().ok())
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, CONTACT_PAGE_CEILING)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(CONTACT_PAGE_DEFAULT).clamp(1, CONTACT_PAGE_MAX)
    }
}

#[derive(Debug, Deserialize)]
pub struct ContactStatusUpdate {
    pub status: String,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ContactMeMessage> for ContactSummary {
    fn from(msg: &ContactMeMessage) -> Self {
        ContactSummary {
            id: msg.id,
            name: msg.name.clone(),
            email: msg.email.clone(),
            subject: msg.subject.clone(),
            created_at: msg.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactCreatedResponse {
    pub success: bool,
    pub message: String,
    pub contact: ContactSummary,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Pagination {
    pub current: i64,
    pub pages: i64,
    pub total: i64,
}

impl Pagination {
    pub fn new(current: i64, limit: i64, total: i64) -> Self {
        Pagination {
            current,
            pages: (total + limit - 1) / limit,
            total,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactPage {
    pub contacts: Vec<ContactMeMessage>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    pub success: bool,
    pub data: ContactPage,
}

#[derive(Debug, Serialize)]
pub struct ContactStatusResponse {
    pub success: bool,
    pub message: String,
    pub contact: ContactMeMessage,
}

// ───── Validation Helpers ───────────────────────────────────────────

fn validate_name(name: &str) -> Result<(), ValidationError> {
    required_within(name, 100, "Name is required", "Name cannot exceed 100 characters")
}

fn validate_subject(subject: &str) -> Result<(), ValidationError> {
    required_within(subject, 200, "Subject is required", "Subject cannot exceed 200 characters")
}

fn validate_message(message: &str) -> Result<(), ValidationError> {
    required_within(message, 5000, "Message is required", "Message cannot exceed 5000 characters")
}

fn required_within(
    value: &str,
    max: usize,
    missing: &'static str,
    too_long: &'static str,
) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(new_validation_error("required", missing));
    }
    if trimmed.chars().count() > max {
        return Err(new_validation_error("too_long", too_long));
    }
    Ok(())
}

fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

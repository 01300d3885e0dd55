use std::borrow::Cow;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::entities::image::ImageDescriptor;

// ───── Constants ──────────────────────────────────────────────────────
const MAX_TITLE_LENGTH: usize = 100;
const MIN_DESCRIPTION_LENGTH: u64 = 10;

static URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^https?://(www\.)?[-a-zA-Z0-9@:%._+~#=]{1,256}\.[a-zA-Z0-9()]{1,6}\b([-a-zA-Z0-9()@:%_+.~#?&/=]*)$",
    )
    .expect("project URL pattern is valid")
});

// ───── Database Models ───────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<Json<ImageDescriptor>>,
    pub technologies: Vec<String>,
    pub github_url: String,
    pub live_url: String,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<ImageDescriptor>,
    pub technologies: Vec<String>,
    pub github_url: String,
    pub live_url: String,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            title: row.title,
            description: row.description,
            image: row.image.map(|Json(image)| image),
            technologies: row.technologies,
            github_url: row.github_url,
            live_url: row.live_url,
            featured: row.featured,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A validated project ready to be written. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectInsert {
    pub title: String,
    pub description: String,
    pub image: Option<ImageDescriptor>,
    pub technologies: Vec<String>,
    pub github_url: String,
    pub live_url: String,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update: `None` leaves the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<ImageDescriptor>,
    pub technologies: Option<Vec<String>>,
    pub github_url: Option<String>,
    pub live_url: Option<String>,
    pub featured: Option<bool>,
    /// Taken from the application clock, like `created_at` on insert.
    pub updated_at: DateTime<Utc>,
}

// ───── Input & Validation Requests ──────────────────────────────────

/// Technologies arrive either as a JSON array or as one comma-separated string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Technologies {
    List(Vec<String>),
    Csv(String),
}

impl Technologies {
    pub fn into_list(self) -> Vec<String> {
        let raw = match self {
            Technologies::List(items) => items,
            Technologies::Csv(text) => {
                let trimmed = text.trim();
                // Multipart clients sometimes send a JSON-encoded array as text
                match serde_json::from_str::<Vec<String>>(trimmed) {
                    Ok(items) if trimmed.starts_with('[') => items,
                    _ => trimmed.split(',').map(str::to_string).collect(),
                }
            }
        };

        raw.into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// `featured` as a real boolean or as the text form a multipart field carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeaturedFlag {
    Bool(bool),
    Text(String),
}

impl FeaturedFlag {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FeaturedFlag::Bool(b) => Some(*b),
            FeaturedFlag::Text(text) => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
        }
    }
}

/// Project fields as supplied by a client. Every field is optional here;
/// creation additionally requires title and description.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectFields {
    #[validate(custom(function = "validate_title"))]
    pub title: Option<String>,

    #[validate(length(
        min = MIN_DESCRIPTION_LENGTH,
        message = "Description must be at least 10 characters long"
    ))]
    pub description: Option<String>,

    pub technologies: Option<Technologies>,

    #[validate(custom(function = "validate_project_url"))]
    pub github_url: Option<String>,

    #[validate(custom(function = "validate_project_url"))]
    pub live_url: Option<String>,

    #[validate(custom(function = "validate_featured"))]
    pub featured: Option<FeaturedFlag>,
}

impl ProjectFields {
    /// Trims the free-text fields so validation and storage see the same values.
    pub fn normalized(self) -> Self {
        fn trim(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string())
        }

        ProjectFields {
            title: trim(self.title),
            description: trim(self.description),
            technologies: self.technologies,
            github_url: trim(self.github_url),
            live_url: trim(self.live_url),
            featured: self.featured,
        }
    }

    /// Validates for creation: every supplied field plus the required ones.
    /// All problems are reported together.
    pub fn validate_for_create(&self) -> Result<(), ValidationErrors> {
        let mut errors = match self.validate() {
            Ok(()) => ValidationErrors::new(),
            Err(errors) => errors,
        };

        if self.title.is_none() {
            errors.add("title", new_validation_error("required", "Title is required"));
        }
        if self.description.is_none() {
            errors.add("description", new_validation_error("required", "Description is required"));
        }

        if errors.field_errors().is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn into_insert(self, image: Option<ImageDescriptor>) -> ProjectInsert {
        let now = Utc::now();

        ProjectInsert {
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            image,
            technologies: self.technologies.map(Technologies::into_list).unwrap_or_default(),
            github_url: self.github_url.unwrap_or_default(),
            live_url: self.live_url.unwrap_or_default(),
            featured: self.featured.as_ref().and_then(FeaturedFlag::as_bool).unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn into_patch(self, image: Option<ImageDescriptor>) -> ProjectPatch {
        ProjectPatch {
            title: self.title,
            description: self.description,
            image,
            technologies: self.technologies.map(Technologies::into_list),
            github_url: self.github_url,
            live_url: self.live_url,
            featured: self.featured.as_ref().and_then(FeaturedFlag::as_bool),
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProjectQuery {
    pub q: Option<String>,
}

// ───── API Response Models ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ProjectMutationResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<Project>,
}

impl ProjectMutationResponse {
    pub fn with_project(message: &str, project: Project) -> Self {
        ProjectMutationResponse {
            success: true,
            message: message.to_string(),
            project: Some(project),
        }
    }

    pub fn message(message: &str) -> Self {
        ProjectMutationResponse {
            success: true,
            message: message.to_string(),
            project: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub success: bool,
    pub count: usize,
    pub data: Vec<Project>,
}

impl From<Vec<Project>> for ProjectListResponse {
    fn from(data: Vec<Project>) -> Self {
        ProjectListResponse {
            success: true,
            count: data.len(),
            data,
        }
    }
}

// ───── Validation Helpers ───────────────────────────────────────────

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(new_validation_error("required", "Title is required"));
    }
    if trimmed.chars().count() > MAX_TITLE_LENGTH {
        return Err(new_validation_error("title_length", "Title cannot exceed 100 characters"));
    }
    Ok(())
}

/// Empty means "no link"; anything else must look like an http(s) URL.
pub fn validate_project_url(url: &str) -> Result<(), ValidationError> {
    let trimmed = url.trim();
    if trimmed.is_empty() || URL_RE.is_match(trimmed) {
        Ok(())
    } else {
        Err(new_validation_error("invalid_url", "Please enter a valid URL"))
    }
}

pub fn validate_featured(flag: &FeaturedFlag) -> Result<(), ValidationError> {
    match flag.as_bool() {
        Some(_) => Ok(()),
        None => Err(new_validation_error("invalid_boolean", "Featured must be true or false")),
    }
}

fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_fields() -> ProjectFields {
        ProjectFields {
            title: Some("Portfolio API".into()),
            description: Some("A backend for a personal portfolio".into()),
            technologies: Some(Technologies::List(vec!["Rust".into(), "Postgres".into()])),
            github_url: Some("https://github.com/someone/portfolio".into()),
            live_url: Some(String::new()),
            featured: Some(FeaturedFlag::Bool(true)),
        }
    }

    fn error_fields(errors: &ValidationErrors) -> Vec<String> {
        let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        fields
    }

    #[test]
    fn valid_fields_pass_create_validation() {
        assert!(valid_fields().validate_for_create().is_ok());
    }

    #[test]
    fn create_reports_all_field_errors_together() {
        let fields = ProjectFields {
            title: Some("   ".into()),
            description: Some("short".into()),
            github_url: Some("not a url".into()),
            featured: Some(FeaturedFlag::Text("maybe".into())),
            ..ProjectFields::default()
        }
        .normalized();

        let errors = fields.validate_for_create().unwrap_err();

        assert_eq!(
            error_fields(&errors),
            vec!["description", "featured", "github_url", "title"]
        );
    }

    #[test]
    fn rejected_featured_text_is_echoed_in_the_error() {
        let fields = ProjectFields {
            featured: Some(FeaturedFlag::Text("maybe".into())),
            ..ProjectFields::default()
        };

        let errors = fields.validate().unwrap_err();
        let field_errors = errors.field_errors();
        let error = &field_errors["featured"][0];

        assert_eq!(error.code, "invalid_boolean");
        assert_eq!(error.params["value"], serde_json::json!("maybe"));
    }

    #[test]
    fn missing_required_fields_are_reported_on_create() {
        let errors = ProjectFields::default().validate_for_create().unwrap_err();
        assert_eq!(error_fields(&errors), vec!["description", "title"]);
    }

    #[test]
    fn partial_fields_pass_plain_validation() {
        let fields = ProjectFields {
            featured: Some(FeaturedFlag::Bool(true)),
            ..ProjectFields::default()
        };
        assert!(fields.validate().is_ok());
    }

    #[test]
    fn title_length_is_counted_in_characters() {
        assert!(validate_title(&"é".repeat(100)).is_ok());
        assert!(validate_title(&"a".repeat(101)).is_err());
    }

    #[test]
    fn technologies_accept_csv_and_drop_empty_entries() {
        let techs = Technologies::Csv(" Rust, ,actix-web,  sqlx ,".into()).into_list();
        assert_eq!(techs, vec!["Rust", "actix-web", "sqlx"]);
    }

    #[test]
    fn technologies_accept_json_array_text() {
        let techs = Technologies::Csv(r#"["Rust", " Docker "]"#.into()).into_list();
        assert_eq!(techs, vec!["Rust", "Docker"]);
    }

    #[test]
    fn featured_text_forms_are_understood() {
        assert_eq!(FeaturedFlag::Text("1".into()).as_bool(), Some(true));
        assert_eq!(FeaturedFlag::Text("FALSE".into()).as_bool(), Some(false));
        assert_eq!(FeaturedFlag::Text("yes".into()).as_bool(), None);
    }

    #[test]
    fn empty_urls_are_allowed() {
        assert!(validate_project_url("").is_ok());
        assert!(validate_project_url("https://example.com/path?x=1").is_ok());
        assert!(validate_project_url("ftp://example.com").is_err());
    }

    #[test]
    fn patch_carries_only_supplied_fields() {
        let fields = ProjectFields {
            featured: Some(FeaturedFlag::Text("true".into())),
            ..ProjectFields::default()
        };

        let patch = fields.into_patch(None);

        assert_eq!(
            patch,
            ProjectPatch {
                featured: Some(true),
                updated_at: patch.updated_at,
                ..ProjectPatch::default()
            }
        );
    }

    #[test]
    fn patch_is_stamped_with_the_application_clock() {
        let before = Utc::now();
        let patch = ProjectFields::default().into_patch(None);
        let after = Utc::now();

        assert!(before <= patch.updated_at && patch.updated_at <= after);
    }

    #[test]
    fn insert_defaults_optional_fields() {
        let fields = ProjectFields {
            title: Some("Title".into()),
            description: Some("Long enough description".into()),
            ..ProjectFields::default()
        };

        let insert = fields.into_insert(None);

        assert!(insert.technologies.is_empty());
        assert!(!insert.featured);
        assert_eq!(insert.github_url, "");
        assert_eq!(insert.created_at, insert.updated_at);
    }

    #[test]
    fn project_serializes_in_camel_case() {
        let now = Utc::now();
        let project = Project {
            id: Uuid::new_v4(),
            title: "t".into(),
            description: "d".into(),
            image: None,
            technologies: vec![],
            github_url: String::new(),
            live_url: String::new(),
            featured: false,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&project).unwrap();
        assert!(json.get("githubUrl").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("github_url").is_none());
    }
}

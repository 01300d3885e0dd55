use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;

pub static START_TIME: Lazy<DateTime<Utc>> = Lazy::new(Utc::now);

pub const FEATURED_PROJECTS_LIMIT: i64 = 6;
pub const DASHBOARD_RECENT_LIMIT: i64 = 5;

pub const CONTACT_PAGE_DEFAULT: i64 = 10;
pub const CONTACT_PAGE_MAX: i64 = 100;
/// Highest `page` accepted by the inbox listing; larger values are clamped.
pub const CONTACT_PAGE_CEILING: i64 = 1_000_000;

/// MIME types accepted for project images, checked against the sniffed bytes.
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];

pub const HEALTH_CACHE_TTL: Duration = Duration::from_secs(5);
pub const LIMITER_EVICTION_INTERVAL: Duration = Duration::from_secs(10 * 60);

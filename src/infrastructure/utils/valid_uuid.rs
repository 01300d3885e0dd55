use uuid::Uuid;

use crate::errors::AppError;

/// Parses a path identifier. A malformed id cannot name an existing record,
/// so it is reported as not found for `entity`.
pub fn valid_uuid(id: &str, entity: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::NotFound(format!("{} not found", entity)))
}

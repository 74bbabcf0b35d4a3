use sqlx::PgPool;

use crate::app_error::AppError;

const MAX_JSON_LOG_LEN: usize = 200;

/// Parse JSON value to target type, logging warning on failure.
///
/// Handles NULL gracefully (returns default without logging).
/// Only logs warnings for actual parse failures (type mismatches, corruption).
///
/// # Arguments
/// * `json` - The JSON value to parse (may be Value::Null for SQL NULL)
/// * `field_name` - Name of the field being parsed (for logging)
/// * `entity_type` - Type of entity (e.g., "domain")
/// * `entity_id` - ID of the entity (for log filtering)
pub fn parse_json_with_fallback<T: serde::de::DeserializeOwned + Default>(
    json: &serde_json::Value,
    field_name: &str,
    entity_type: &str,
    entity_id: &str,
) -> T {
    // SQL NULL becomes Value::Null - treat as valid empty state, no warning
    if json.is_null() {
        return T::default();
    }

    serde_json::from_value(json.clone()).unwrap_or_else(|err| {
        // Truncate raw JSON to prevent log bloat from large blobs
        let raw_str = json.to_string();
        let truncated = if raw_str.len() > MAX_JSON_LOG_LEN {
            let head: String = raw_str.chars().take(MAX_JSON_LOG_LEN).collect();
            format!("{head}...")
        } else {
            raw_str
        };

        tracing::warn!(
            field = field_name,
            entity_type = entity_type,
            entity_id = entity_id,
            raw_json = %truncated,
            error = %err,
            "Failed to parse JSON field, using default value"
        );
        T::default()
    })
}

pub mod domain;

/// Unique index backing per-organization, case-folded host uniqueness.
pub const DOMAIN_HOST_UNIQUE_CONSTRAINT: &str = "domains_org_host_key";

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    if db_err.constraint() == Some(DOMAIN_HOST_UNIQUE_CONSTRAINT) {
                        AppError::DuplicateHost(
                            "host already registered for this organization".into(),
                        )
                    } else {
                        AppError::InvalidInput("A record with this value already exists".into())
                    }
                } else if db_err.is_foreign_key_violation() {
                    AppError::InvalidInput("Referenced record not found".into())
                } else if db_err.is_check_violation() {
                    AppError::InvalidInput("Value violates a table constraint".into())
                } else {
                    // Log the actual error for debugging, but don't expose details
                    tracing::error!(error = ?err, "Database error");
                    AppError::Database("Database operation failed".into())
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}

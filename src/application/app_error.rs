use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Host is already registered for this organization: {0}")]
    DuplicateHost(String),

    #[error("Invalid host: {0}")]
    InvalidHost(String),

    #[error("Not found")]
    NotFound,

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Redirect status code must be one of 301, 302, 307, 308 (got {0})")]
    InvalidStatusCode(u16),

    #[error("Redirect would create a cycle")]
    RedirectCycle,

    #[error("Hosting provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Redirect chain starting at {0} is corrupt")]
    CorruptChain(Uuid),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable taxonomy name, used in bulk import row reports.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "Database",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::DuplicateHost(_) => "DuplicateHost",
            AppError::InvalidHost(_) => "InvalidHost",
            AppError::NotFound => "NotFound",
            AppError::InvalidOperation(_) => "InvalidOperation",
            AppError::InvalidStatusCode(_) => "InvalidStatusCode",
            AppError::RedirectCycle => "RedirectCycle",
            AppError::ProviderUnavailable(_) => "ProviderUnavailable",
            AppError::CorruptChain(_) => "CorruptChain",
            AppError::Internal(_) => "Internal",
        }
    }

    /// Only a provider outage is worth retrying with the same request.
    pub fn is_retriable(&self) -> bool {
        matches!(self, AppError::ProviderUnavailable(_))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::InvalidInput(_) => ErrorCode::InvalidInput,
            AppError::DuplicateHost(_) => ErrorCode::DuplicateHost,
            AppError::InvalidHost(_) => ErrorCode::InvalidHost,
            AppError::NotFound => ErrorCode::NotFound,
            AppError::InvalidOperation(_) | AppError::InvalidStatusCode(_) => {
                ErrorCode::InvalidOperation
            }
            AppError::RedirectCycle => ErrorCode::RedirectCycle,
            AppError::ProviderUnavailable(_) => ErrorCode::ProviderUnavailable,
            AppError::CorruptChain(_) | AppError::Internal(_) => ErrorCode::InternalError,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DatabaseError,
    InvalidInput,
    DuplicateHost,
    InvalidHost,
    NotFound,
    InvalidOperation,
    RedirectCycle,
    ProviderUnavailable,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InvalidInput => "INVALID_INPUT",
            ErrorCode::DuplicateHost => "DUPLICATE_HOST",
            ErrorCode::InvalidHost => "INVALID_HOST",
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::InvalidOperation => "INVALID_OPERATION",
            ErrorCode::RedirectCycle => "REDIRECT_CYCLE",
            ErrorCode::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

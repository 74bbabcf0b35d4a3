use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_error::AppError;

// ============================================================================
// Port Types
// ============================================================================

/// Routing facts the edge provider needs to serve one hostname.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingSnapshot {
    pub host: String,
    pub is_primary: bool,
    pub is_active: bool,
    pub redirect_to_host: Option<String>,
    pub redirect_status_code: Option<u16>,
}

/// State returned by the provider after a routing sync.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderRoutingState {
    pub state: serde_json::Value,
    pub synced_at: DateTime<Utc>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("provider call timed out")]
    Timeout,

    #[error("provider request failed: {0}")]
    Transport(String),

    #[error("provider rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("provider returned an unreadable response: {0}")]
    MalformedResponse(String),
}

impl From<ProviderError> for AppError {
    fn from(err: ProviderError) -> Self {
        AppError::ProviderUnavailable(err.to_string())
    }
}

// ============================================================================
// Port
// ============================================================================

/// The edge-hosting platform that serves verified domains.
#[async_trait]
pub trait HostingProvider: Send + Sync {
    /// Does `record_name` currently resolve to `record_value`?
    async fn check_challenge(
        &self,
        record_name: &str,
        record_value: &str,
    ) -> Result<bool, ProviderError>;

    async fn sync_routing(
        &self,
        snapshot: &RoutingSnapshot,
    ) -> Result<ProviderRoutingState, ProviderError>;
}

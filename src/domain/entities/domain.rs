use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::app_error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    Pending,
    Verified,
    Failed,
}

impl DomainStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainStatus::Pending => "pending",
            DomainStatus::Verified => "verified",
            DomainStatus::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "pending" => DomainStatus::Pending,
            "verified" => DomainStatus::Verified,
            "failed" => DomainStatus::Failed,
            _ => DomainStatus::Pending,
        }
    }

    /// Whether a verification check may still move this domain forward.
    pub fn is_verifiable(&self) -> bool {
        matches!(self, DomainStatus::Pending | DomainStatus::Failed)
    }
}

/// How a hostname is attached to the platform.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DomainType {
    /// A label under the platform's own zone, trusted on creation.
    Subdomain,
    /// A tenant-owned hostname that must pass a DNS challenge.
    #[default]
    CustomDomain,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum VerificationType {
    #[serde(rename = "TXT")]
    #[strum(serialize = "TXT")]
    Txt,
    #[serde(rename = "CNAME")]
    #[strum(serialize = "CNAME")]
    Cname,
    #[serde(rename = "none")]
    #[strum(serialize = "none")]
    None,
}

/// HTTP status codes a redirect edge may carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum RedirectStatusCode {
    #[default]
    MovedPermanently,
    Found,
    TemporaryRedirect,
    PermanentRedirect,
}

impl RedirectStatusCode {
    pub fn as_u16(&self) -> u16 {
        match self {
            RedirectStatusCode::MovedPermanently => 301,
            RedirectStatusCode::Found => 302,
            RedirectStatusCode::TemporaryRedirect => 307,
            RedirectStatusCode::PermanentRedirect => 308,
        }
    }
}

impl TryFrom<u16> for RedirectStatusCode {
    type Error = AppError;

    fn try_from(code: u16) -> Result<Self, Self::Error> {
        match code {
            301 => Ok(RedirectStatusCode::MovedPermanently),
            302 => Ok(RedirectStatusCode::Found),
            307 => Ok(RedirectStatusCode::TemporaryRedirect),
            308 => Ok(RedirectStatusCode::PermanentRedirect),
            other => Err(AppError::InvalidStatusCode(other)),
        }
    }
}

impl From<RedirectStatusCode> for u16 {
    fn from(code: RedirectStatusCode) -> Self {
        code.as_u16()
    }
}

impl std::fmt::Display for RedirectStatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_u16())
    }
}

/// Provider-owned routing state, stored exactly as the provider returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSyncState {
    pub state: serde_json::Value,
    pub synced_at: NaiveDateTime,
}

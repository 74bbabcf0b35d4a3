use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::helpers::challenge::{
    ChallengeMaterial, challenge_record_name, generate_challenge,
};
use crate::application::helpers::host_parsing::{
    ensure_host_matches_type, fits_dns_name_limit, normalize_host,
};
use crate::domain::entities::domain::{
    DomainStatus, DomainType, ExternalSyncState, RedirectStatusCode, VerificationType,
};

/// Tenant-scoped storage for domains.
///
/// Every method takes the owning organization explicitly; a row of another
/// organization is indistinguishable from a missing one. Implementations must
/// enforce `(organization_id, lower(host))` uniqueness in storage and run the
/// multi-row writes (`set_primary`, `set_redirect`, `delete`) atomically with
/// the tenant's domain set locked.
#[async_trait]
pub trait DomainRepo: Send + Sync {
    async fn create(&self, new_domain: NewDomain) -> AppResult<DomainProfile>;
    async fn get_by_id(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<Option<DomainProfile>>;
    async fn list_by_organization(&self, organization_id: Uuid) -> AppResult<Vec<DomainProfile>>;
    async fn update_metadata(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        metadata: serde_json::Value,
    ) -> AppResult<DomainProfile>;
    async fn set_active(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        active: bool,
    ) -> AppResult<DomainProfile>;
    /// Clear `is_primary` on every domain of the organization and set it on
    /// `domain_id`, in one transaction.
    async fn set_primary(&self, organization_id: Uuid, domain_id: Uuid)
    -> AppResult<DomainProfile>;
    /// Point `domain_id` at another domain (or clear the redirect). The cycle
    /// check runs against the locked tenant graph inside the same transaction.
    async fn set_redirect(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        redirect: Option<RedirectTarget>,
    ) -> AppResult<DomainProfile>;
    /// Atomically bump the attempt counter and move the domain to pending, but
    /// only while its status is still `observed`. A row whose status changed
    /// meanwhile is returned unchanged.
    async fn record_verification_attempt(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        observed: DomainStatus,
    ) -> AppResult<DomainProfile>;
    /// Pending/failed -> verified. Already verified rows are returned unchanged.
    async fn mark_verified(&self, organization_id: Uuid, domain_id: Uuid)
    -> AppResult<DomainProfile>;
    async fn mark_failed(&self, organization_id: Uuid, domain_id: Uuid) -> AppResult<DomainProfile>;
    async fn save_sync_state(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        state: ExternalSyncState,
    ) -> AppResult<DomainProfile>;
    /// Null out inbound redirects and remove the row, in one transaction.
    async fn delete(&self, organization_id: Uuid, domain_id: Uuid) -> AppResult<()>;
}

#[derive(Clone)]
pub struct DomainUseCases {
    repo: Arc<dyn DomainRepo>,
    platform_name: String,
    platform_domain: String,
}

impl DomainUseCases {
    pub fn new(repo: Arc<dyn DomainRepo>, platform_name: String, platform_domain: String) -> Self {
        Self {
            repo,
            platform_name,
            platform_domain,
        }
    }

    #[instrument(skip(self))]
    pub async fn add_domain(
        &self,
        organization_id: Uuid,
        host: &str,
        domain_type: DomainType,
    ) -> AppResult<DomainProfile> {
        let host = normalize_host(host)?;
        ensure_host_matches_type(&host, domain_type, &self.platform_domain)?;

        let new_domain = match domain_type {
            // Platform subdomains are ours; no challenge to prove.
            DomainType::Subdomain => NewDomain {
                organization_id,
                host,
                domain_type,
                status: DomainStatus::Verified,
                verification_type: VerificationType::None,
                challenge: None,
                verified_at: Some(chrono::Utc::now().naive_utc()),
            },
            DomainType::CustomDomain => {
                if !fits_dns_name_limit(&challenge_record_name(&self.platform_name, &host)) {
                    return Err(AppError::InvalidHost(format!(
                        "{host} is too long to carry a challenge record"
                    )));
                }
                let challenge = generate_challenge(&self.platform_name, &host);
                NewDomain {
                    organization_id,
                    host,
                    domain_type,
                    status: DomainStatus::Pending,
                    verification_type: challenge.verification_type,
                    challenge: Some(challenge),
                    verified_at: None,
                }
            }
        };

        let domain = self.repo.create(new_domain).await?;
        info!(
            organization_id = %organization_id,
            domain_id = %domain.id,
            host = %domain.host,
            status = domain.status.as_str(),
            "Domain added"
        );
        Ok(domain)
    }

    #[instrument(skip(self))]
    pub async fn list_domains(&self, organization_id: Uuid) -> AppResult<Vec<DomainProfile>> {
        self.repo.list_by_organization(organization_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_domain(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<DomainProfile> {
        self.repo
            .get_by_id(organization_id, domain_id)
            .await?
            .ok_or(AppError::NotFound)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_domain(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        patch: DomainPatch,
    ) -> AppResult<DomainProfile> {
        let domain = self.get_domain(organization_id, domain_id).await?;

        let Some(metadata) = patch.metadata else {
            return Ok(domain);
        };
        if !metadata.is_object() {
            return Err(AppError::InvalidInput("metadata must be a JSON object".into()));
        }

        self.repo
            .update_metadata(organization_id, domain_id, metadata)
            .await
    }

    #[instrument(skip(self))]
    pub async fn toggle_active(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        active: bool,
    ) -> AppResult<DomainProfile> {
        let domain = self.repo.set_active(organization_id, domain_id, active).await?;
        info!(domain_id = %domain_id, active, "Domain activity changed");
        Ok(domain)
    }

    #[instrument(skip(self))]
    pub async fn set_primary(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<DomainProfile> {
        let domain = self.repo.set_primary(organization_id, domain_id).await?;
        info!(
            organization_id = %organization_id,
            domain_id = %domain_id,
            host = %domain.host,
            "Primary domain changed"
        );
        Ok(domain)
    }

    #[instrument(skip(self))]
    pub async fn delete_domain(&self, organization_id: Uuid, domain_id: Uuid) -> AppResult<()> {
        self.repo.delete(organization_id, domain_id).await?;
        info!(organization_id = %organization_id, domain_id = %domain_id, "Domain deleted");
        Ok(())
    }
}

// ============================================================================
// Profile Types
// ============================================================================

#[derive(Debug, Clone)]
pub struct DomainProfile {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub host: String,
    pub domain_type: DomainType,
    pub status: DomainStatus,
    pub is_primary: bool,
    pub is_active: bool,
    pub verification_type: VerificationType,
    pub verification_token: Option<String>,
    pub verification_record: Option<String>,
    pub verification_value: Option<String>,
    pub verified_at: Option<NaiveDateTime>,
    pub verification_attempts: i32,
    pub last_verification_at: Option<NaiveDateTime>,
    pub external_sync_state: Option<ExternalSyncState>,
    pub redirect_to: Option<Uuid>,
    pub redirect_status_code: Option<RedirectStatusCode>,
    pub metadata: serde_json::Value,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl DomainProfile {
    /// The record a tenant must publish; only pending custom domains have one.
    pub fn challenge_instructions(&self) -> Option<ChallengeInstructions> {
        if self.domain_type != DomainType::CustomDomain || self.status == DomainStatus::Verified {
            return None;
        }
        Some(ChallengeInstructions {
            record_type: self.verification_type,
            record_name: self.verification_record.clone()?,
            record_value: self.verification_value.clone()?,
        })
    }
}

/// Row to insert; the use case decides status and challenge up front.
#[derive(Debug, Clone)]
pub struct NewDomain {
    pub organization_id: Uuid,
    pub host: String,
    pub domain_type: DomainType,
    pub status: DomainStatus,
    pub verification_type: VerificationType,
    pub challenge: Option<ChallengeMaterial>,
    pub verified_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default)]
pub struct DomainPatch {
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedirectTarget {
    pub target_id: Uuid,
    pub status_code: RedirectStatusCode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChallengeInstructions {
    pub record_type: VerificationType,
    pub record_name: String,
    pub record_value: String,
}

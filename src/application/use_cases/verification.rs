use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::ports::hosting_provider::{HostingProvider, ProviderError};
use crate::application::use_cases::domain::{DomainProfile, DomainRepo};
use crate::domain::entities::domain::{DomainStatus, DomainType};

/// Drives custom domains from pending to verified.
///
/// The attempt counter is telemetry only: the engine never moves a domain to
/// failed on its own, that is an explicit administrator action
/// (`mark_failed`). A provider timeout or outage leaves the row untouched.
#[derive(Clone)]
pub struct VerificationUseCases {
    repo: Arc<dyn DomainRepo>,
    provider: Arc<dyn HostingProvider>,
    provider_timeout: Duration,
    attempt_hint: u32,
}

impl VerificationUseCases {
    pub fn new(
        repo: Arc<dyn DomainRepo>,
        provider: Arc<dyn HostingProvider>,
        provider_timeout: Duration,
        attempt_hint: u32,
    ) -> Self {
        Self {
            repo,
            provider,
            provider_timeout,
            attempt_hint,
        }
    }

    #[instrument(skip(self))]
    pub async fn verify(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<VerificationOutcome> {
        let domain = self
            .repo
            .get_by_id(organization_id, domain_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if !domain.status.is_verifiable() {
            return Ok(self.outcome(domain));
        }
        if domain.domain_type == DomainType::Subdomain {
            return Err(AppError::InvalidOperation(
                "Subdomains are verified on creation and cannot be re-verified".into(),
            ));
        }

        let (Some(record_name), Some(record_value)) = (
            domain.verification_record.as_deref(),
            domain.verification_value.as_deref(),
        ) else {
            return Err(AppError::Internal(format!(
                "custom domain {domain_id} has no challenge record"
            )));
        };

        let confirmed = match tokio::time::timeout(
            self.provider_timeout,
            self.provider.check_challenge(record_name, record_value),
        )
        .await
        {
            Ok(Ok(confirmed)) => confirmed,
            Ok(Err(err)) => {
                warn!(domain_id = %domain_id, host = %domain.host, error = %err, "Challenge check failed");
                return Err(err.into());
            }
            Err(_) => {
                warn!(domain_id = %domain_id, host = %domain.host, "Challenge check timed out");
                return Err(ProviderError::Timeout.into());
            }
        };

        let domain = if confirmed {
            let verified = self.repo.mark_verified(organization_id, domain_id).await?;
            info!(
                domain_id = %domain_id,
                host = %verified.host,
                attempts = verified.verification_attempts,
                "Domain verified"
            );
            verified
        } else {
            let pending = self
                .repo
                .record_verification_attempt(organization_id, domain_id, domain.status)
                .await?;
            debug!(
                domain_id = %domain_id,
                host = %pending.host,
                attempts = pending.verification_attempts,
                "Challenge record not found yet"
            );
            pending
        };

        Ok(self.outcome(domain))
    }

    /// Administrator decision to give up on a pending domain.
    #[instrument(skip(self))]
    pub async fn mark_failed(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<DomainProfile> {
        let domain = self
            .repo
            .get_by_id(organization_id, domain_id)
            .await?
            .ok_or(AppError::NotFound)?;

        match (domain.domain_type, domain.status) {
            (DomainType::Subdomain, _) => Err(AppError::InvalidOperation(
                "Subdomains cannot fail verification".into(),
            )),
            (_, DomainStatus::Verified) => Err(AppError::InvalidOperation(
                "Verified domains cannot be marked as failed".into(),
            )),
            (_, DomainStatus::Failed) => Ok(domain),
            (_, DomainStatus::Pending) => {
                let failed = self.repo.mark_failed(organization_id, domain_id).await?;
                info!(domain_id = %domain_id, host = %failed.host, "Domain marked as failed");
                Ok(failed)
            }
        }
    }

    fn outcome(&self, domain: DomainProfile) -> VerificationOutcome {
        let attempts = u32::try_from(domain.verification_attempts).unwrap_or(0);
        VerificationOutcome {
            verified: domain.status == DomainStatus::Verified,
            attempts,
            attempt_hint: self.attempt_hint,
            progress: format!("{} of {}", attempts, self.attempt_hint),
            domain,
        }
    }
}

#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub domain: DomainProfile,
    pub verified: bool,
    pub attempts: u32,
    /// Advisory cap shown to the user; never enforced.
    pub attempt_hint: u32,
    pub progress: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationProgress {
    pub verified: bool,
    pub attempts: u32,
    pub attempt_hint: u32,
    pub progress: String,
}

impl From<&VerificationOutcome> for VerificationProgress {
    fn from(outcome: &VerificationOutcome) -> Self {
        Self {
            verified: outcome.verified,
            attempts: outcome.attempts,
            attempt_hint: outcome.attempt_hint,
            progress: outcome.progress.clone(),
        }
    }
}

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::app_error::{AppError, AppResult};
use crate::application::helpers::redirect_graph::RedirectGraph;
use crate::application::ports::hosting_provider::{HostingProvider, ProviderError, RoutingSnapshot};
use crate::application::use_cases::domain::{DomainProfile, DomainRepo, RedirectTarget};
use crate::domain::entities::domain::{DomainStatus, ExternalSyncState, RedirectStatusCode};

/// Primary-domain and redirect-chain management, plus pushing the resulting
/// routing state to the hosting provider.
#[derive(Clone)]
pub struct RoutingUseCases {
    repo: Arc<dyn DomainRepo>,
    provider: Arc<dyn HostingProvider>,
    provider_timeout: Duration,
}

impl RoutingUseCases {
    pub fn new(
        repo: Arc<dyn DomainRepo>,
        provider: Arc<dyn HostingProvider>,
        provider_timeout: Duration,
    ) -> Self {
        Self {
            repo,
            provider,
            provider_timeout,
        }
    }

    /// Point `domain_id` at `target_id` with the given status code, or clear
    /// its redirect when `target_id` is `None`.
    #[instrument(skip(self))]
    pub async fn set_redirect(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        target_id: Option<Uuid>,
        status_code: Option<u16>,
    ) -> AppResult<DomainProfile> {
        let redirect = match target_id {
            Some(target_id) => {
                if target_id == domain_id {
                    return Err(AppError::RedirectCycle);
                }
                let status_code = match status_code {
                    Some(code) => RedirectStatusCode::try_from(code)?,
                    None => RedirectStatusCode::default(),
                };
                Some(RedirectTarget {
                    target_id,
                    status_code,
                })
            }
            None => None,
        };

        let domain = self
            .repo
            .set_redirect(organization_id, domain_id, redirect)
            .await?;

        match redirect {
            Some(r) => info!(
                domain_id = %domain_id,
                target_id = %r.target_id,
                status_code = r.status_code.as_u16(),
                "Redirect set"
            ),
            None => info!(domain_id = %domain_id, "Redirect cleared"),
        }
        Ok(domain)
    }

    /// Domains from `domain_id` following `redirect_to` to the end of the chain.
    #[instrument(skip(self))]
    pub async fn resolve_chain(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<Vec<DomainProfile>> {
        let domains = self.repo.list_by_organization(organization_id).await?;
        let graph = RedirectGraph::from_edges(domains.iter().map(|d| (d.id, d.redirect_to)));

        let chain = graph.chain_from(domain_id).inspect_err(|e| {
            if let AppError::CorruptChain(start) = e {
                error!(
                    organization_id = %organization_id,
                    start = %start,
                    "Redirect chain loops; write-side cycle check was bypassed"
                );
            }
        })?;

        let mut by_id: HashMap<Uuid, DomainProfile> =
            domains.into_iter().map(|d| (d.id, d)).collect();
        chain
            .into_iter()
            .map(|id| by_id.remove(&id).ok_or(AppError::CorruptChain(domain_id)))
            .collect()
    }

    /// Push the domain's routing snapshot to the provider and store the
    /// returned state verbatim. Only verified domains are routable.
    #[instrument(skip(self))]
    pub async fn sync_routing(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<DomainProfile> {
        let domain = self
            .repo
            .get_by_id(organization_id, domain_id)
            .await?
            .ok_or(AppError::NotFound)?;

        if domain.status != DomainStatus::Verified {
            return Err(AppError::InvalidOperation(
                "Only verified domains can be synced to the hosting provider".into(),
            ));
        }

        let redirect_to_host = match domain.redirect_to {
            Some(target_id) => Some(
                self.repo
                    .get_by_id(organization_id, target_id)
                    .await?
                    .ok_or(AppError::CorruptChain(domain_id))?
                    .host,
            ),
            None => None,
        };

        let snapshot = RoutingSnapshot {
            host: domain.host.clone(),
            is_primary: domain.is_primary,
            is_active: domain.is_active,
            redirect_to_host,
            redirect_status_code: domain.redirect_status_code.map(|c| c.as_u16()),
        };

        let routing_state = match tokio::time::timeout(
            self.provider_timeout,
            self.provider.sync_routing(&snapshot),
        )
        .await
        {
            Ok(Ok(state)) => state,
            Ok(Err(err)) => {
                warn!(domain_id = %domain_id, host = %domain.host, error = %err, "Routing sync failed");
                return Err(err.into());
            }
            Err(_) => {
                warn!(domain_id = %domain_id, host = %domain.host, "Routing sync timed out");
                return Err(ProviderError::Timeout.into());
            }
        };

        let synced = self
            .repo
            .save_sync_state(
                organization_id,
                domain_id,
                ExternalSyncState {
                    state: routing_state.state,
                    synced_at: routing_state.synced_at.naive_utc(),
                },
            )
            .await?;
        info!(domain_id = %domain_id, host = %synced.host, "Routing synced");
        Ok(synced)
    }
}

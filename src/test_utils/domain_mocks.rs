//! In-memory implementations of the domain repository and hosting provider.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::helpers::redirect_graph::RedirectGraph,
    application::ports::hosting_provider::{
        HostingProvider, ProviderError, ProviderRoutingState, RoutingSnapshot,
    },
    application::use_cases::domain::{DomainProfile, DomainRepo, NewDomain, RedirectTarget},
    domain::entities::domain::{DomainStatus, ExternalSyncState},
};

/// In-memory implementation of DomainRepo for testing.
///
/// A single mutex guards the whole table, so every multi-row write is atomic
/// the same way the Postgres transactions are.
#[derive(Default)]
pub struct InMemoryDomainRepo {
    pub domains: Mutex<HashMap<Uuid, DomainProfile>>,
}

impl InMemoryDomainRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the repo with initial domains for testing.
    pub fn with_domains(domains: Vec<DomainProfile>) -> Self {
        let map: HashMap<Uuid, DomainProfile> = domains.into_iter().map(|d| (d.id, d)).collect();
        Self {
            domains: Mutex::new(map),
        }
    }

    /// Get all domains (for test assertions).
    pub fn get_all(&self) -> Vec<DomainProfile> {
        self.domains.lock().unwrap().values().cloned().collect()
    }

    /// Get one domain regardless of tenant (for test assertions).
    pub fn get(&self, domain_id: Uuid) -> Option<DomainProfile> {
        self.domains.lock().unwrap().get(&domain_id).cloned()
    }

    pub fn primary_count(&self, organization_id: Uuid) -> usize {
        self.domains
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.organization_id == organization_id && d.is_primary)
            .count()
    }

    fn update<F>(&self, organization_id: Uuid, domain_id: Uuid, f: F) -> AppResult<DomainProfile>
    where
        F: FnOnce(&mut DomainProfile),
    {
        let mut domains = self.domains.lock().unwrap();
        let domain = domains
            .get_mut(&domain_id)
            .filter(|d| d.organization_id == organization_id)
            .ok_or(AppError::NotFound)?;

        f(domain);
        domain.updated_at = Some(Utc::now().naive_utc());

        Ok(domain.clone())
    }
}

#[async_trait]
impl DomainRepo for InMemoryDomainRepo {
    async fn create(&self, new_domain: NewDomain) -> AppResult<DomainProfile> {
        let mut domains = self.domains.lock().unwrap();

        // Mirrors the (organization_id, lower(host)) unique index
        if domains.values().any(|d| {
            d.organization_id == new_domain.organization_id
                && d.host.eq_ignore_ascii_case(&new_domain.host)
        }) {
            return Err(AppError::DuplicateHost(new_domain.host));
        }

        let now = Utc::now().naive_utc();
        let challenge = new_domain.challenge;
        let profile = DomainProfile {
            id: Uuid::new_v4(),
            organization_id: new_domain.organization_id,
            host: new_domain.host,
            domain_type: new_domain.domain_type,
            status: new_domain.status,
            is_primary: false,
            is_active: true,
            verification_type: new_domain.verification_type,
            verification_token: challenge.as_ref().map(|c| c.token.clone()),
            verification_record: challenge.as_ref().map(|c| c.record_name.clone()),
            verification_value: challenge.as_ref().map(|c| c.record_value.clone()),
            verified_at: new_domain.verified_at,
            verification_attempts: 0,
            last_verification_at: None,
            external_sync_state: None,
            redirect_to: None,
            redirect_status_code: None,
            metadata: serde_json::json!({}),
            created_at: Some(now),
            updated_at: Some(now),
        };

        domains.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn get_by_id(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<Option<DomainProfile>> {
        Ok(self
            .domains
            .lock()
            .unwrap()
            .get(&domain_id)
            .filter(|d| d.organization_id == organization_id)
            .cloned())
    }

    async fn list_by_organization(&self, organization_id: Uuid) -> AppResult<Vec<DomainProfile>> {
        let mut domains: Vec<DomainProfile> = self
            .domains
            .lock()
            .unwrap()
            .values()
            .filter(|d| d.organization_id == organization_id)
            .cloned()
            .collect();
        domains.sort_by(|a, b| a.host.cmp(&b.host));
        Ok(domains)
    }

    async fn update_metadata(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        metadata: serde_json::Value,
    ) -> AppResult<DomainProfile> {
        self.update(organization_id, domain_id, |d| d.metadata = metadata)
    }

    async fn set_active(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        active: bool,
    ) -> AppResult<DomainProfile> {
        self.update(organization_id, domain_id, |d| d.is_active = active)
    }

    async fn set_primary(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<DomainProfile> {
        let mut domains = self.domains.lock().unwrap();
        let in_tenant = domains
            .get(&domain_id)
            .is_some_and(|d| d.organization_id == organization_id);
        if !in_tenant {
            return Err(AppError::NotFound);
        }

        let now = Utc::now().naive_utc();
        for domain in domains
            .values_mut()
            .filter(|d| d.organization_id == organization_id)
        {
            let primary = domain.id == domain_id;
            if domain.is_primary != primary {
                domain.is_primary = primary;
                domain.updated_at = Some(now);
            }
        }

        domains.get(&domain_id).cloned().ok_or(AppError::NotFound)
    }

    async fn set_redirect(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        redirect: Option<RedirectTarget>,
    ) -> AppResult<DomainProfile> {
        let mut domains = self.domains.lock().unwrap();

        if let Some(target) = redirect {
            let graph = RedirectGraph::from_edges(
                domains
                    .values()
                    .filter(|d| d.organization_id == organization_id)
                    .map(|d| (d.id, d.redirect_to)),
            );
            graph.ensure_redirect_allowed(domain_id, target.target_id)?;
        }

        let domain = domains
            .get_mut(&domain_id)
            .filter(|d| d.organization_id == organization_id)
            .ok_or(AppError::NotFound)?;
        domain.redirect_to = redirect.map(|r| r.target_id);
        domain.redirect_status_code = redirect.map(|r| r.status_code);
        domain.updated_at = Some(Utc::now().naive_utc());

        Ok(domain.clone())
    }

    async fn record_verification_attempt(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        observed: DomainStatus,
    ) -> AppResult<DomainProfile> {
        self.update(organization_id, domain_id, |d| {
            if observed == DomainStatus::Verified || d.status != observed {
                return;
            }
            d.verification_attempts += 1;
            d.last_verification_at = Some(Utc::now().naive_utc());
            d.status = DomainStatus::Pending;
        })
    }

    async fn mark_verified(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<DomainProfile> {
        self.update(organization_id, domain_id, |d| {
            if d.status == DomainStatus::Verified {
                return;
            }
            let now = Utc::now().naive_utc();
            d.status = DomainStatus::Verified;
            d.verified_at = Some(now);
            d.last_verification_at = Some(now);
        })
    }

    async fn mark_failed(&self, organization_id: Uuid, domain_id: Uuid) -> AppResult<DomainProfile> {
        self.update(organization_id, domain_id, |d| {
            if d.status == DomainStatus::Pending {
                d.status = DomainStatus::Failed;
            }
        })
    }

    async fn save_sync_state(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        state: ExternalSyncState,
    ) -> AppResult<DomainProfile> {
        self.update(organization_id, domain_id, |d| {
            d.external_sync_state = Some(state)
        })
    }

    async fn delete(&self, organization_id: Uuid, domain_id: Uuid) -> AppResult<()> {
        let mut domains = self.domains.lock().unwrap();
        let in_tenant = domains
            .get(&domain_id)
            .is_some_and(|d| d.organization_id == organization_id);
        if !in_tenant {
            return Err(AppError::NotFound);
        }

        for domain in domains.values_mut().filter(|d| {
            d.organization_id == organization_id && d.redirect_to == Some(domain_id)
        }) {
            domain.redirect_to = None;
            domain.redirect_status_code = None;
        }
        domains.remove(&domain_id);
        Ok(())
    }
}

// ============================================================================
// Hosting provider mock
// ============================================================================

/// Scripted hosting provider with call counters.
pub struct MockHostingProvider {
    confirmed: AtomicBool,
    failure: Mutex<Option<ProviderError>>,
    delay: Option<Duration>,
    check_calls: AtomicUsize,
    sync_calls: AtomicUsize,
    last_checked_record: Mutex<Option<String>>,
    last_snapshot: Mutex<Option<RoutingSnapshot>>,
}

impl MockHostingProvider {
    fn new(confirmed: bool, failure: Option<ProviderError>) -> Self {
        Self {
            confirmed: AtomicBool::new(confirmed),
            failure: Mutex::new(failure),
            delay: None,
            check_calls: AtomicUsize::new(0),
            sync_calls: AtomicUsize::new(0),
            last_checked_record: Mutex::new(None),
            last_snapshot: Mutex::new(None),
        }
    }

    /// Every challenge check succeeds.
    pub fn confirmed() -> Self {
        Self::new(true, None)
    }

    /// The challenge record is never found.
    pub fn unconfirmed() -> Self {
        Self::new(false, None)
    }

    /// Every call fails with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self::new(false, Some(error))
    }

    /// Sleep before answering (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Simulate DNS propagation finishing (or being reverted).
    pub fn set_confirmed(&self, confirmed: bool) {
        self.confirmed.store(confirmed, Ordering::SeqCst);
    }

    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    pub fn last_checked_record(&self) -> Option<String> {
        self.last_checked_record.lock().unwrap().clone()
    }

    pub fn last_snapshot(&self) -> Option<RoutingSnapshot> {
        self.last_snapshot.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn scripted_failure(&self) -> Option<ProviderError> {
        self.failure.lock().unwrap().clone()
    }
}

#[async_trait]
impl HostingProvider for MockHostingProvider {
    async fn check_challenge(
        &self,
        record_name: &str,
        _record_value: &str,
    ) -> Result<bool, ProviderError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_checked_record.lock().unwrap() = Some(record_name.to_string());
        self.pause().await;

        if let Some(err) = self.scripted_failure() {
            return Err(err);
        }
        Ok(self.confirmed.load(Ordering::SeqCst))
    }

    async fn sync_routing(
        &self,
        snapshot: &RoutingSnapshot,
    ) -> Result<ProviderRoutingState, ProviderError> {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_snapshot.lock().unwrap() = Some(snapshot.clone());
        self.pause().await;

        if let Some(err) = self.scripted_failure() {
            return Err(err);
        }
        Ok(ProviderRoutingState {
            state: serde_json::json!({
                "host": snapshot.host,
                "route_id": format!("route_{}", snapshot.host.replace('.', "_")),
                "active": snapshot.is_active,
            }),
            synced_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::domain::{DomainType, VerificationType};
    use crate::test_utils::create_test_domain;

    fn new_domain(organization_id: Uuid, host: &str) -> NewDomain {
        NewDomain {
            organization_id,
            host: host.to_string(),
            domain_type: DomainType::CustomDomain,
            status: DomainStatus::Pending,
            verification_type: VerificationType::Txt,
            challenge: None,
            verified_at: None,
        }
    }

    #[tokio::test]
    async fn test_create_domain() {
        let repo = InMemoryDomainRepo::new();
        let org = Uuid::new_v4();

        let domain = repo.create(new_domain(org, "test.com")).await.unwrap();

        assert_eq!(domain.host, "test.com");
        assert_eq!(domain.organization_id, org);
        assert_eq!(domain.status, DomainStatus::Pending);
        assert!(domain.is_active);
        assert!(!domain.is_primary);
    }

    #[tokio::test]
    async fn test_duplicate_domain_fails() {
        let repo = InMemoryDomainRepo::new();
        let org = Uuid::new_v4();

        repo.create(new_domain(org, "test.com")).await.unwrap();
        let result = repo.create(new_domain(org, "TEST.com")).await;

        assert!(matches!(result, Err(AppError::DuplicateHost(_))));
    }

    #[tokio::test]
    async fn test_get_by_id_is_tenant_scoped() {
        let domain = create_test_domain(|d| {
            d.host = "test.com".to_string();
        });
        let repo = InMemoryDomainRepo::with_domains(vec![domain.clone()]);

        let found = repo
            .get_by_id(domain.organization_id, domain.id)
            .await
            .unwrap();
        assert_eq!(found.unwrap().host, "test.com");

        let hidden = repo.get_by_id(Uuid::new_v4(), domain.id).await.unwrap();
        assert!(hidden.is_none());
    }

    #[tokio::test]
    async fn test_record_attempt_ignores_verified_rows() {
        let domain = create_test_domain(|d| {
            d.status = DomainStatus::Verified;
            d.verification_attempts = 1;
        });
        let repo = InMemoryDomainRepo::with_domains(vec![domain.clone()]);

        let updated = repo
            .record_verification_attempt(domain.organization_id, domain.id, DomainStatus::Pending)
            .await
            .unwrap();
        assert_eq!(updated.verification_attempts, 1);
        assert_eq!(updated.status, DomainStatus::Verified);
    }

    #[tokio::test]
    async fn test_record_attempt_requires_observed_status() {
        let domain = create_test_domain(|d| {
            d.status = DomainStatus::Failed;
            d.verified_at = None;
        });
        let repo = InMemoryDomainRepo::with_domains(vec![domain.clone()]);

        let stale = repo
            .record_verification_attempt(domain.organization_id, domain.id, DomainStatus::Pending)
            .await
            .unwrap();
        assert_eq!(stale.status, DomainStatus::Failed);
        assert_eq!(stale.verification_attempts, 0);

        let retried = repo
            .record_verification_attempt(domain.organization_id, domain.id, DomainStatus::Failed)
            .await
            .unwrap();
        assert_eq!(retried.status, DomainStatus::Pending);
        assert_eq!(retried.verification_attempts, 1);
    }

    #[tokio::test]
    async fn test_mock_provider_counts_calls() {
        let provider = MockHostingProvider::unconfirmed();
        assert!(!provider.check_challenge("_p.a.com", "v").await.unwrap());
        provider.set_confirmed(true);
        assert!(provider.check_challenge("_p.a.com", "v").await.unwrap());
        assert_eq!(provider.check_calls(), 2);
        assert_eq!(provider.last_checked_record().as_deref(), Some("_p.a.com"));
    }
}

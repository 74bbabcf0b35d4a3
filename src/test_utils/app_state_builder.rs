//! Test app state builder for HTTP-level integration testing.
//!
//! This module provides `TestAppStateBuilder` which creates a minimal `AppState`
//! with in-memory mocks for testing HTTP endpoints.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        domain::{DomainProfile, DomainUseCases},
        domain_import::DomainImportUseCases,
        routing::RoutingUseCases,
        verification::VerificationUseCases,
    },
    infra::config::AppConfig,
    test_utils::{InMemoryDomainRepo, MockHostingProvider},
};

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let domain = create_test_domain(|d| d.host = "example.com".to_string());
/// let provider = Arc::new(MockHostingProvider::unconfirmed());
///
/// let app_state = TestAppStateBuilder::new()
///     .with_domain(domain)
///     .with_provider(provider.clone())
///     .build();
/// ```
pub struct TestAppStateBuilder {
    domains: Vec<DomainProfile>,
    provider: Option<Arc<MockHostingProvider>>,
    platform_name: String,
    platform_domain: String,
    attempt_hint: u32,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            domains: vec![],
            provider: None,
            platform_name: "platform".to_string(),
            platform_domain: "platform.app".to_string(),
            attempt_hint: 10,
        }
    }

    /// Add a domain to the test state.
    pub fn with_domain(mut self, domain: DomainProfile) -> Self {
        self.domains.push(domain);
        self
    }

    /// Use a specific provider mock (keep a clone of the Arc for assertions).
    pub fn with_provider(mut self, provider: Arc<MockHostingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Build the AppState and also hand back the repo for direct assertions.
    pub fn build_with_repo(self) -> (AppState, Arc<InMemoryDomainRepo>) {
        let repo = Arc::new(InMemoryDomainRepo::with_domains(self.domains.clone()));
        let app_state = self.build_on(repo.clone());
        (app_state, repo)
    }

    /// Build the AppState with all configured mocks.
    pub fn build(self) -> AppState {
        let repo = Arc::new(InMemoryDomainRepo::with_domains(self.domains.clone()));
        self.build_on(repo)
    }

    fn build_on(self, domain_repo: Arc<InMemoryDomainRepo>) -> AppState {
        let provider = self
            .provider
            .unwrap_or_else(|| Arc::new(MockHostingProvider::confirmed()));
        let provider_timeout = Duration::from_millis(500);

        let domain_use_cases = Arc::new(DomainUseCases::new(
            domain_repo.clone(),
            self.platform_name.clone(),
            self.platform_domain.clone(),
        ));

        let verification_use_cases = Arc::new(VerificationUseCases::new(
            domain_repo.clone(),
            provider.clone(),
            provider_timeout,
            self.attempt_hint,
        ));

        let routing_use_cases = Arc::new(RoutingUseCases::new(
            domain_repo,
            provider,
            provider_timeout,
        ));

        let import_use_cases = Arc::new(DomainImportUseCases::new(domain_use_cases.clone()));

        // Create minimal config for testing
        let config = Arc::new(AppConfig {
            bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            database_url: String::new(),
            run_migrations: false,
            platform_name: self.platform_name,
            platform_domain: self.platform_domain,
            hosting_provider_url: Url::parse("http://provider.test").unwrap(),
            hosting_provider_token: SecretString::new("test_provider_token".into()),
            hosting_provider_timeout: provider_timeout,
            verification_attempt_hint: self.attempt_hint,
        });

        AppState {
            config,
            domain_use_cases,
            verification_use_cases,
            routing_use_cases,
            import_use_cases,
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

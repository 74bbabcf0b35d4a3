use crate::{
    adapters::{hosting::HttpHostingProvider, http::app_state::AppState},
    application::ports::hosting_provider::HostingProvider,
    infra::{config::AppConfig, postgres_persistence},
    use_cases::{
        domain::{DomainRepo, DomainUseCases},
        domain_import::DomainImportUseCases,
        routing::RoutingUseCases,
        verification::VerificationUseCases,
    },
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env();

    let postgres_arc =
        Arc::new(postgres_persistence(&config.database_url, config.run_migrations).await?);
    let domain_repo_arc = postgres_arc.clone() as Arc<dyn DomainRepo>;

    let provider = Arc::new(HttpHostingProvider::new(
        config.hosting_provider_url.clone(),
        config.hosting_provider_token.clone(),
        config.hosting_provider_timeout,
    )?) as Arc<dyn HostingProvider>;

    let domain_use_cases = Arc::new(DomainUseCases::new(
        domain_repo_arc.clone(),
        config.platform_name.clone(),
        config.platform_domain.clone(),
    ));

    let verification_use_cases = VerificationUseCases::new(
        domain_repo_arc.clone(),
        provider.clone(),
        config.hosting_provider_timeout,
        config.verification_attempt_hint,
    );

    let routing_use_cases = RoutingUseCases::new(
        domain_repo_arc,
        provider,
        config.hosting_provider_timeout,
    );

    let import_use_cases = DomainImportUseCases::new(domain_use_cases.clone());

    Ok(AppState {
        config: Arc::new(config),
        domain_use_cases,
        verification_use_cases: Arc::new(verification_use_cases),
        routing_use_cases: Arc::new(routing_use_cases),
        import_use_cases: Arc::new(import_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tenant_domains=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false) // don’t show target (module path)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let json_layer = File::create("app.log").ok().map(|file| {
        fmt::layer()
            .json()
            .with_writer(file)
            .with_current_span(true)
            .with_span_list(true)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}

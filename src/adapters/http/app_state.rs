use std::sync::Arc;

use crate::{
    infra::config::AppConfig,
    use_cases::{
        domain::DomainUseCases, domain_import::DomainImportUseCases, routing::RoutingUseCases,
        verification::VerificationUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub domain_use_cases: Arc<DomainUseCases>,
    pub verification_use_cases: Arc<VerificationUseCases>,
    pub routing_use_cases: Arc<RoutingUseCases>,
    pub import_use_cases: Arc<DomainImportUseCases>,
}

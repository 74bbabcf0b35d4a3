use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::application::use_cases::domain::DomainUseCases;
use crate::domain::entities::domain::DomainType;

/// One input row of a bulk import.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRow {
    pub host: String,
    #[serde(default)]
    pub domain_type: Option<DomainType>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ImportRowOutcome {
    Created { host: String, domain_id: Uuid },
    Failed { host: String, error: String },
}

/// Per-row results, index-aligned with the input.
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    #[serde(rename = "success")]
    pub success_count: usize,
    #[serde(rename = "failed")]
    pub failure_count: usize,
    /// `"row N: Kind"` with 1-based row numbers.
    pub errors: Vec<String>,
    /// Same order as the input; failed rows carry the host as submitted.
    pub rows: Vec<ImportRowOutcome>,
}

/// Applies `add_domain` row by row. A failing row never aborts the batch and
/// rows created before it stay created.
#[derive(Clone)]
pub struct DomainImportUseCases {
    domains: Arc<DomainUseCases>,
}

impl DomainImportUseCases {
    pub fn new(domains: Arc<DomainUseCases>) -> Self {
        Self { domains }
    }

    #[instrument(skip(self, rows), fields(row_count = rows.len()))]
    pub async fn import_batch(&self, organization_id: Uuid, rows: Vec<ImportRow>) -> ImportReport {
        let mut report = ImportReport {
            success_count: 0,
            failure_count: 0,
            errors: Vec::new(),
            rows: Vec::with_capacity(rows.len()),
        };

        for (index, row) in rows.into_iter().enumerate() {
            let domain_type = row.domain_type.unwrap_or_default();
            match self
                .domains
                .add_domain(organization_id, &row.host, domain_type)
                .await
            {
                Ok(domain) => {
                    report.success_count += 1;
                    report.rows.push(ImportRowOutcome::Created {
                        host: domain.host,
                        domain_id: domain.id,
                    });
                }
                Err(err) => {
                    warn!(row = index + 1, host = %row.host, error = %err, "Import row failed");
                    report.failure_count += 1;
                    report.errors.push(format!("row {}: {}", index + 1, err.kind()));
                    report.rows.push(ImportRowOutcome::Failed {
                        host: row.host,
                        error: err.kind().to_string(),
                    });
                }
            }
        }

        info!(
            organization_id = %organization_id,
            created = report.success_count,
            failed = report.failure_count,
            "Domain import finished"
        );
        report
    }
}

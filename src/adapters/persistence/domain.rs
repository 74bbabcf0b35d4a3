use std::str::FromStr;

use async_trait::async_trait;
use sqlx::{Postgres, Row, Transaction};
use uuid::Uuid;

use crate::{
    adapters::persistence::{
        DOMAIN_HOST_UNIQUE_CONSTRAINT, PostgresPersistence, parse_json_with_fallback,
    },
    app_error::{AppError, AppResult},
    application::helpers::redirect_graph::RedirectGraph,
    domain::entities::domain::{
        DomainStatus, DomainType, ExternalSyncState, RedirectStatusCode, VerificationType,
    },
    use_cases::domain::{DomainProfile, DomainRepo, NewDomain, RedirectTarget},
};

const DOMAIN_COLUMNS: &str = "id, organization_id, host, domain_type, status, is_primary, is_active, \
     verification_type, verification_token, verification_record, verification_value, verified_at, \
     verification_attempts, last_verification_at, external_sync_state, redirect_to, \
     redirect_status_code, metadata, created_at, updated_at";

fn row_to_profile(row: sqlx::postgres::PgRow) -> DomainProfile {
    let id: Uuid = row.get("id");
    let entity_id = id.to_string();

    let metadata_json: serde_json::Value = row.get("metadata");
    let metadata: serde_json::Map<String, serde_json::Value> =
        parse_json_with_fallback(&metadata_json, "metadata", "domain", &entity_id);
    let sync_json: Option<serde_json::Value> = row.get("external_sync_state");
    let external_sync_state: Option<ExternalSyncState> = parse_json_with_fallback(
        &sync_json.unwrap_or_default(),
        "external_sync_state",
        "domain",
        &entity_id,
    );

    let redirect_status_code: Option<i16> = row.get("redirect_status_code");
    let redirect_status_code = redirect_status_code.and_then(|code| {
        u16::try_from(code)
            .ok()
            .and_then(|code| RedirectStatusCode::try_from(code).ok())
    });

    DomainProfile {
        id,
        organization_id: row.get("organization_id"),
        host: row.get("host"),
        domain_type: DomainType::from_str(row.get("domain_type")).unwrap_or_default(),
        status: DomainStatus::from_str(row.get("status")),
        is_primary: row.get("is_primary"),
        is_active: row.get("is_active"),
        verification_type: VerificationType::from_str(row.get("verification_type"))
            .unwrap_or(VerificationType::None),
        verification_token: row.get("verification_token"),
        verification_record: row.get("verification_record"),
        verification_value: row.get("verification_value"),
        verified_at: row.get("verified_at"),
        verification_attempts: row.get("verification_attempts"),
        last_verification_at: row.get("last_verification_at"),
        external_sync_state,
        redirect_to: row.get("redirect_to"),
        redirect_status_code,
        metadata: serde_json::Value::Object(metadata),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Lock every domain row of the organization for the rest of the transaction
/// and return the redirect edges as they stand under the lock.
async fn lock_tenant_domains(
    tx: &mut Transaction<'_, Postgres>,
    organization_id: Uuid,
) -> AppResult<Vec<(Uuid, Option<Uuid>)>> {
    let rows = sqlx::query(
        "SELECT id, redirect_to FROM domains WHERE organization_id = $1 ORDER BY id FOR UPDATE",
    )
    .bind(organization_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(AppError::from)?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get("id"), row.get("redirect_to")))
        .collect())
}

impl PostgresPersistence {
    async fn fetch_domain(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<DomainProfile> {
        self.get_by_id(organization_id, domain_id)
            .await?
            .ok_or(AppError::NotFound)
    }
}

#[async_trait]
impl DomainRepo for PostgresPersistence {
    async fn create(&self, new_domain: NewDomain) -> AppResult<DomainProfile> {
        let id = Uuid::new_v4();
        let challenge = new_domain.challenge.as_ref();
        let row = sqlx::query(&format!(
            r#"
                INSERT INTO domains (
                    id, organization_id, host, domain_type, status, verification_type,
                    verification_token, verification_record, verification_value, verified_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING {DOMAIN_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(new_domain.organization_id)
        .bind(&new_domain.host)
        .bind(new_domain.domain_type.as_ref())
        .bind(new_domain.status.as_str())
        .bind(new_domain.verification_type.as_ref())
        .bind(challenge.map(|c| c.token.as_str()))
        .bind(challenge.map(|c| c.record_name.as_str()))
        .bind(challenge.map(|c| c.record_value.as_str()))
        .bind(new_domain.verified_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db_err)
                if db_err.constraint() == Some(DOMAIN_HOST_UNIQUE_CONSTRAINT) =>
            {
                AppError::DuplicateHost(new_domain.host.clone())
            }
            _ => AppError::from(err),
        })?;
        Ok(row_to_profile(row))
    }

    async fn get_by_id(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<Option<DomainProfile>> {
        let row = sqlx::query(&format!(
            "SELECT {DOMAIN_COLUMNS} FROM domains WHERE organization_id = $1 AND id = $2"
        ))
        .bind(organization_id)
        .bind(domain_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_profile))
    }

    async fn list_by_organization(&self, organization_id: Uuid) -> AppResult<Vec<DomainProfile>> {
        let rows = sqlx::query(&format!(
            "SELECT {DOMAIN_COLUMNS} FROM domains WHERE organization_id = $1 ORDER BY host ASC"
        ))
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_profile).collect())
    }

    async fn update_metadata(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        metadata: serde_json::Value,
    ) -> AppResult<DomainProfile> {
        let row = sqlx::query(&format!(
            r#"
                UPDATE domains
                SET metadata = $3, updated_at = CURRENT_TIMESTAMP
                WHERE organization_id = $1 AND id = $2
                RETURNING {DOMAIN_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(domain_id)
        .bind(metadata)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        row.map(row_to_profile).ok_or(AppError::NotFound)
    }

    async fn set_active(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        active: bool,
    ) -> AppResult<DomainProfile> {
        let row = sqlx::query(&format!(
            r#"
                UPDATE domains
                SET is_active = $3, updated_at = CURRENT_TIMESTAMP
                WHERE organization_id = $1 AND id = $2
                RETURNING {DOMAIN_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(domain_id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        row.map(row_to_profile).ok_or(AppError::NotFound)
    }

    async fn set_primary(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<DomainProfile> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        lock_tenant_domains(&mut tx, organization_id).await?;

        sqlx::query(
            r#"
                UPDATE domains
                SET is_primary = false, updated_at = CURRENT_TIMESTAMP
                WHERE organization_id = $1 AND is_primary AND id <> $2
            "#,
        )
        .bind(organization_id)
        .bind(domain_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        let row = sqlx::query(&format!(
            r#"
                UPDATE domains
                SET is_primary = true, updated_at = CURRENT_TIMESTAMP
                WHERE organization_id = $1 AND id = $2
                RETURNING {DOMAIN_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(domain_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(row_to_profile(row))
    }

    async fn set_redirect(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        redirect: Option<RedirectTarget>,
    ) -> AppResult<DomainProfile> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        let edges = lock_tenant_domains(&mut tx, organization_id).await?;

        if let Some(target) = redirect {
            RedirectGraph::from_edges(edges).ensure_redirect_allowed(domain_id, target.target_id)?;
        }

        let row = sqlx::query(&format!(
            r#"
                UPDATE domains
                SET redirect_to = $3, redirect_status_code = $4, updated_at = CURRENT_TIMESTAMP
                WHERE organization_id = $1 AND id = $2
                RETURNING {DOMAIN_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(domain_id)
        .bind(redirect.map(|r| r.target_id))
        .bind(redirect.map(|r| r.status_code.as_u16() as i16))
        .fetch_optional(&mut *tx)
        .await
        .map_err(AppError::from)?
        .ok_or(AppError::NotFound)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(row_to_profile(row))
    }

    async fn record_verification_attempt(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        observed: DomainStatus,
    ) -> AppResult<DomainProfile> {
        if observed == DomainStatus::Verified {
            return self.fetch_domain(organization_id, domain_id).await;
        }

        let row = sqlx::query(&format!(
            r#"
                UPDATE domains
                SET verification_attempts = verification_attempts + 1,
                    last_verification_at = CURRENT_TIMESTAMP,
                    status = 'pending',
                    updated_at = CURRENT_TIMESTAMP
                WHERE organization_id = $1 AND id = $2 AND status = $3
                RETURNING {DOMAIN_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(domain_id)
        .bind(observed.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        match row {
            Some(row) => Ok(row_to_profile(row)),
            // Status moved on (verified or failed) since the check started.
            None => self.fetch_domain(organization_id, domain_id).await,
        }
    }

    async fn mark_verified(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
    ) -> AppResult<DomainProfile> {
        let row = sqlx::query(&format!(
            r#"
                UPDATE domains
                SET status = 'verified',
                    verified_at = CURRENT_TIMESTAMP,
                    last_verification_at = CURRENT_TIMESTAMP,
                    updated_at = CURRENT_TIMESTAMP
                WHERE organization_id = $1 AND id = $2 AND status <> 'verified'
                RETURNING {DOMAIN_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(domain_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        match row {
            Some(row) => Ok(row_to_profile(row)),
            None => self.fetch_domain(organization_id, domain_id).await,
        }
    }

    async fn mark_failed(&self, organization_id: Uuid, domain_id: Uuid) -> AppResult<DomainProfile> {
        let row = sqlx::query(&format!(
            r#"
                UPDATE domains
                SET status = 'failed', updated_at = CURRENT_TIMESTAMP
                WHERE organization_id = $1 AND id = $2 AND status = 'pending'
                RETURNING {DOMAIN_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(domain_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        match row {
            Some(row) => Ok(row_to_profile(row)),
            None => self.fetch_domain(organization_id, domain_id).await,
        }
    }

    async fn save_sync_state(
        &self,
        organization_id: Uuid,
        domain_id: Uuid,
        state: ExternalSyncState,
    ) -> AppResult<DomainProfile> {
        let state_json = serde_json::to_value(&state)
            .map_err(|e| AppError::Internal(format!("Failed to encode sync state: {e}")))?;

        let row = sqlx::query(&format!(
            r#"
                UPDATE domains
                SET external_sync_state = $3, updated_at = CURRENT_TIMESTAMP
                WHERE organization_id = $1 AND id = $2
                RETURNING {DOMAIN_COLUMNS}
            "#
        ))
        .bind(organization_id)
        .bind(domain_id)
        .bind(state_json)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        row.map(row_to_profile).ok_or(AppError::NotFound)
    }

    async fn delete(&self, organization_id: Uuid, domain_id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;
        lock_tenant_domains(&mut tx, organization_id).await?;

        sqlx::query(
            r#"
                UPDATE domains
                SET redirect_to = NULL, redirect_status_code = NULL, updated_at = CURRENT_TIMESTAMP
                WHERE organization_id = $1 AND redirect_to = $2
            "#,
        )
        .bind(organization_id)
        .bind(domain_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from)?;

        let result = sqlx::query("DELETE FROM domains WHERE organization_id = $1 AND id = $2")
            .bind(organization_id)
            .bind(domain_id)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }

        tx.commit().await.map_err(AppError::from)?;
        Ok(())
    }
}

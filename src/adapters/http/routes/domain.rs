use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    app_error::AppResult,
    application::use_cases::{
        domain::{ChallengeInstructions, DomainPatch, DomainProfile},
        domain_import::ImportRow,
        verification::VerificationProgress,
    },
    domain::entities::domain::{
        DomainStatus, DomainType, ExternalSyncState, RedirectStatusCode, VerificationType,
    },
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_domain).get(list_domains))
        .route("/import", post(import_domains))
        .route(
            "/{domain_id}",
            get(get_domain).patch(update_domain).delete(delete_domain),
        )
        .route("/{domain_id}/verify", post(verify_domain))
        .route("/{domain_id}/fail", post(mark_domain_failed))
        .route("/{domain_id}/primary", put(set_primary))
        .route("/{domain_id}/active", put(set_active))
        .route("/{domain_id}/redirect", put(set_redirect))
        .route("/{domain_id}/chain", get(get_redirect_chain))
        .route("/{domain_id}/sync", post(sync_domain))
}

// ============================================================================
// Payloads
// ============================================================================

#[derive(Deserialize)]
struct CreateDomainPayload {
    host: String,
    #[serde(default)]
    domain_type: Option<DomainType>,
}

#[derive(Deserialize)]
struct ImportPayload {
    rows: Vec<ImportRow>,
}

#[derive(Deserialize)]
struct UpdateDomainPayload {
    #[serde(default)]
    metadata: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct SetActivePayload {
    active: bool,
}

#[derive(Deserialize)]
struct SetRedirectPayload {
    target_id: Option<Uuid>,
    #[serde(default)]
    status_code: Option<u16>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Serialize)]
struct DomainResponse {
    id: Uuid,
    organization_id: Uuid,
    host: String,
    domain_type: DomainType,
    status: DomainStatus,
    is_primary: bool,
    is_active: bool,
    verification_type: VerificationType,
    /// DNS record the tenant still has to publish, if any.
    challenge: Option<ChallengeInstructions>,
    verified_at: Option<NaiveDateTime>,
    verification_attempts: i32,
    last_verification_at: Option<NaiveDateTime>,
    external_sync_state: Option<ExternalSyncState>,
    redirect_to: Option<Uuid>,
    redirect_status_code: Option<RedirectStatusCode>,
    metadata: serde_json::Value,
    created_at: Option<NaiveDateTime>,
    updated_at: Option<NaiveDateTime>,
}

impl From<DomainProfile> for DomainResponse {
    fn from(d: DomainProfile) -> Self {
        let challenge = d.challenge_instructions();
        Self {
            id: d.id,
            organization_id: d.organization_id,
            host: d.host,
            domain_type: d.domain_type,
            status: d.status,
            is_primary: d.is_primary,
            is_active: d.is_active,
            verification_type: d.verification_type,
            challenge,
            verified_at: d.verified_at,
            verification_attempts: d.verification_attempts,
            last_verification_at: d.last_verification_at,
            external_sync_state: d.external_sync_state,
            redirect_to: d.redirect_to,
            redirect_status_code: d.redirect_status_code,
            metadata: d.metadata,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Serialize)]
struct VerifyResponse {
    domain: DomainResponse,
    #[serde(flatten)]
    progress: VerificationProgress,
}

// ============================================================================
// Handlers
// ============================================================================

async fn create_domain(
    State(app_state): State<AppState>,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<CreateDomainPayload>,
) -> AppResult<impl IntoResponse> {
    let domain = app_state
        .domain_use_cases
        .add_domain(
            organization_id,
            &payload.host,
            payload.domain_type.unwrap_or_default(),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(DomainResponse::from(domain))))
}

async fn list_domains(
    State(app_state): State<AppState>,
    Path(organization_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let domains = app_state
        .domain_use_cases
        .list_domains(organization_id)
        .await?;

    let response: Vec<DomainResponse> = domains.into_iter().map(DomainResponse::from).collect();
    Ok(Json(response))
}

async fn import_domains(
    State(app_state): State<AppState>,
    Path(organization_id): Path<Uuid>,
    Json(payload): Json<ImportPayload>,
) -> impl IntoResponse {
    let report = app_state
        .import_use_cases
        .import_batch(organization_id, payload.rows)
        .await;

    Json(report)
}

async fn get_domain(
    State(app_state): State<AppState>,
    Path((organization_id, domain_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let domain = app_state
        .domain_use_cases
        .get_domain(organization_id, domain_id)
        .await?;

    Ok(Json(DomainResponse::from(domain)))
}

async fn update_domain(
    State(app_state): State<AppState>,
    Path((organization_id, domain_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateDomainPayload>,
) -> AppResult<impl IntoResponse> {
    let domain = app_state
        .domain_use_cases
        .update_domain(
            organization_id,
            domain_id,
            DomainPatch {
                metadata: payload.metadata,
            },
        )
        .await?;

    Ok(Json(DomainResponse::from(domain)))
}

async fn delete_domain(
    State(app_state): State<AppState>,
    Path((organization_id, domain_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    app_state
        .domain_use_cases
        .delete_domain(organization_id, domain_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn verify_domain(
    State(app_state): State<AppState>,
    Path((organization_id, domain_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let outcome = app_state
        .verification_use_cases
        .verify(organization_id, domain_id)
        .await?;

    let progress = VerificationProgress::from(&outcome);
    Ok(Json(VerifyResponse {
        domain: DomainResponse::from(outcome.domain),
        progress,
    }))
}

async fn mark_domain_failed(
    State(app_state): State<AppState>,
    Path((organization_id, domain_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let domain = app_state
        .verification_use_cases
        .mark_failed(organization_id, domain_id)
        .await?;

    Ok(Json(DomainResponse::from(domain)))
}

async fn set_primary(
    State(app_state): State<AppState>,
    Path((organization_id, domain_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let domain = app_state
        .domain_use_cases
        .set_primary(organization_id, domain_id)
        .await?;

    Ok(Json(DomainResponse::from(domain)))
}

async fn set_active(
    State(app_state): State<AppState>,
    Path((organization_id, domain_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetActivePayload>,
) -> AppResult<impl IntoResponse> {
    let domain = app_state
        .domain_use_cases
        .toggle_active(organization_id, domain_id, payload.active)
        .await?;

    Ok(Json(DomainResponse::from(domain)))
}

async fn set_redirect(
    State(app_state): State<AppState>,
    Path((organization_id, domain_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetRedirectPayload>,
) -> AppResult<impl IntoResponse> {
    let domain = app_state
        .routing_use_cases
        .set_redirect(
            organization_id,
            domain_id,
            payload.target_id,
            payload.status_code,
        )
        .await?;

    Ok(Json(DomainResponse::from(domain)))
}

async fn get_redirect_chain(
    State(app_state): State<AppState>,
    Path((organization_id, domain_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let chain = app_state
        .routing_use_cases
        .resolve_chain(organization_id, domain_id)
        .await?;

    let response: Vec<DomainResponse> = chain.into_iter().map(DomainResponse::from).collect();
    Ok(Json(response))
}

async fn sync_domain(
    State(app_state): State<AppState>,
    Path((organization_id, domain_id)): Path<(Uuid, Uuid)>,
) -> AppResult<impl IntoResponse> {
    let domain = app_state
        .routing_use_cases
        .sync_routing(organization_id, domain_id)
        .await?;

    Ok(Json(DomainResponse::from(domain)))
}

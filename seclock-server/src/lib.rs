//! HTTP API of the Second Lock licensing service.

pub mod config;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use seclock_license::{
    CachedCycleResult, ComplianceVerdict, DecryptedGrant, EncryptedGrant, LicenseError,
    LicenseService,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// This service's own license identity, reported on `/license`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SelfReport {
    pub id: String,
    pub name: String,
}

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: LicenseService,
    pub identity: Arc<SelfReport>,
}

#[derive(Deserialize, Debug)]
pub struct AddLicenseRequest {
    #[serde(default)]
    pub license: String,
}

/// Error body: `{ "code": <status>, "message": <text> }`.
#[derive(Debug)]
pub enum ApiError {
    License(LicenseError),
    BadRequest(String),
}

impl From<LicenseError> for ApiError {
    fn from(err: LicenseError) -> Self {
        Self::License(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::License(err) => match err {
                LicenseError::Conflict => StatusCode::CONFLICT,
                LicenseError::NotFound(_) => StatusCode::NOT_FOUND,
                LicenseError::MissingKey
                | LicenseError::Decryption(_)
                | LicenseError::MalformedGrant(_) => StatusCode::BAD_REQUEST,
                LicenseError::Network(_) | LicenseError::PeerProbe { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::License(err) => err.to_string(),
            Self::BadRequest(msg) => msg.clone(),
        };
        if status.is_server_error() {
            error!("Request failed: {message}");
        }
        let body = json!({ "code": status.as_u16(), "message": message });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

async fn add_license(
    State(state): State<AppState>,
    payload: Result<Json<AddLicenseRequest>, JsonRejection>,
) -> ApiResult<EncryptedGrant> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let license = req.license.trim();
    if license.is_empty() {
        return Err(ApiError::BadRequest("license is required".to_string()));
    }
    Ok(Json(state.service.add_license(license).await?))
}

async fn load_license(State(state): State<AppState>) -> ApiResult<DecryptedGrant> {
    Ok(Json(state.service.load_license().await?))
}

async fn remove_license(State(state): State<AppState>) -> ApiResult<bool> {
    Ok(Json(state.service.remove_license().await?))
}

async fn check(State(state): State<AppState>) -> ApiResult<ComplianceVerdict> {
    Ok(Json(state.service.validate().await?))
}

async fn check_light(State(state): State<AppState>) -> Json<CachedCycleResult> {
    Json(state.service.read_cached_state().await)
}

async fn public_key(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    let key = state
        .service
        .load_public_key()
        .await?
        .ok_or_else(|| ApiError::BadRequest("public key has not been generated".to_string()))?;
    Ok(Json(json!({ "publickey": key })))
}

async fn private_key(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    let key = state
        .service
        .load_private_key()
        .await?
        .ok_or_else(|| ApiError::BadRequest("private key has not been generated".to_string()))?;
    Ok(Json(json!({ "privatekey": key })))
}

async fn checksum(State(state): State<AppState>) -> ApiResult<serde_json::Value> {
    let checksum = state.service.checksum().await?;
    Ok(Json(json!({ "checksum": checksum })))
}

async fn self_report(State(state): State<AppState>) -> Json<SelfReport> {
    Json((*state.identity).clone())
}

/// Build the HTTP API router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/licensing",
            get(load_license).post(add_license).delete(remove_license),
        )
        .route("/licensing/check", get(check))
        .route("/licensing/check/light", get(check_light))
        .route("/licensing/publickey", get(public_key))
        .route("/licensing/load/checksum", get(checksum))
        .route("/licensing/load/privatekey", get(private_key))
        .route("/license", get(self_report))
        .with_state(state)
}

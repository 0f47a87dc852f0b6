use axum::{
	Json, Router,
	extract::{
		Query, State,
		rejection::{JsonRejection, QueryRejection},
	},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::state::AppState;
use cmeq_service::{
	AskRequest, AskResponse, CatalogSearchRequest, Error as ServiceError, VectorSearchRequest,
};
use cmeq_storage::models::{CatalogMatch, ChunkHit};

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/cme/ask", post(ask))
		.route("/v1/cme/search", get(catalog_search))
		.route("/v1/vector/search", post(vector_search))
		.with_state(state)
}

async fn health() -> Json<Value> {
	Json(json!({ "status": "ok", "service": "cmeq" }))
}

async fn ask(
	State(state): State<AppState>,
	payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ApiError> {
	let Json(payload) = payload?;
	let response = state.service.ask(payload).await.map_err(|err| {
		tracing::error!(error = %err, "Ask request failed.");

		ApiError::from_service(err, "Error while processing CME question: ")
	})?;

	Ok(Json(response))
}

async fn vector_search(
	State(state): State<AppState>,
	payload: Result<Json<VectorSearchRequest>, JsonRejection>,
) -> Result<Json<Vec<ChunkHit>>, ApiError> {
	let Json(payload) = payload?;
	let hits = state.service.vector_search(payload).await?;

	Ok(Json(hits))
}

async fn catalog_search(
	State(state): State<AppState>,
	params: Result<Query<CatalogSearchRequest>, QueryRejection>,
) -> Result<Json<Vec<CatalogMatch>>, ApiError> {
	let Query(params) = params?;
	let matches = state.service.catalog_search(params).await?;

	Ok(Json(matches))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}

	fn from_service(err: ServiceError, prefix: &str) -> Self {
		let (status, code) = match &err {
			ServiceError::InvalidRequest { .. } => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
			ServiceError::Retrieval { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "RETRIEVAL_FAILED"),
			ServiceError::Provider { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "PROVIDER_ERROR"),
			ServiceError::Storage { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
		};

		Self::new(status, code, format!("{prefix}{err}"))
	}
}
impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		Self::from_service(err, "")
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
	}
}
impl From<QueryRejection> for ApiError {
	fn from(rejection: QueryRejection) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", rejection.body_text())
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}

use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use chrono::SecondsFormat;
use serde::Deserialize;
use serde_json::{json, Value};
use serm::{Monitor, MonitorError, NewUser};
use std::sync::Arc;

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub telegram_id: String,
}

#[derive(Debug, Deserialize)]
pub struct KeywordsRequest {
    #[serde(default)]
    pub telegram_id: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub telegram_id: String,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub generate_pdf: bool,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(MonitorError::validation(rejection.body_text()))
    }
}

pub fn router(monitor: Arc<Monitor>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/register", post(register))
        .route("/api/check-user", post(check_user))
        .route(
            "/api/check-keywords",
            post(add_keywords).get(list_keywords).delete(remove_keywords),
        )
        .route("/api/search", post(search))
        .route("/api/result", get(list_keywords))
        .route("/api/user-data", get(user_data))
        .route("/api/user", delete(delete_user))
        .layer(Extension(monitor))
}

pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

#[tracing::instrument(skip_all)]
pub async fn register(
    Extension(monitor): Extension<Arc<Monitor>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(user) = payload?;
    let user = monitor.register(user).await?;
    Ok((StatusCode::CREATED, Json(json!({"status": "ok", "user": user}))))
}

#[tracing::instrument(skip_all)]
pub async fn check_user(
    Extension(monitor): Extension<Arc<Monitor>>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let Json(req) = payload?;
    let response = match monitor.find_user(&req.telegram_id).await? {
        Some(user) => Json(json!({"user": "authorized", "details": user})).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({"user": "unauthorized"}))).into_response(),
    };
    Ok(response)
}

#[tracing::instrument(skip_all)]
pub async fn add_keywords(
    Extension(monitor): Extension<Arc<Monitor>>,
    payload: Result<Json<KeywordsRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(req) = payload?;
    let added = monitor.add_keywords(&req.telegram_id, &req.keywords).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({"status": "ok", "keywords": added})),
    ))
}

#[tracing::instrument(skip_all)]
pub async fn list_keywords(
    Extension(monitor): Extension<Arc<Monitor>>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = payload?;
    let keywords = monitor.list_keywords(&req.telegram_id).await?;
    Ok(Json(json!({"keywords": keywords})))
}

#[tracing::instrument(skip_all)]
pub async fn remove_keywords(
    Extension(monitor): Extension<Arc<Monitor>>,
    payload: Result<Json<KeywordsRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = payload?;
    let removed = monitor
        .remove_keywords(&req.telegram_id, &req.keywords)
        .await?;
    Ok(Json(json!({"status": "ok", "removed": removed})))
}

#[tracing::instrument(skip_all)]
pub async fn search(
    Extension(monitor): Extension<Arc<Monitor>>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = payload?;
    let keywords = req.keywords.unwrap_or_default();
    let outcome = monitor
        .search(&req.telegram_id, &keywords, req.generate_pdf)
        .await?;

    let mut body = json!({
        "status": "ok",
        "results": outcome.results,
        "generated_at": outcome.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
    });
    if let Some(report) = outcome.report {
        body["pdf_report"] = Value::String(report);
    }
    Ok(Json(body))
}

#[tracing::instrument(skip_all)]
pub async fn user_data(
    Extension(monitor): Extension<Arc<Monitor>>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = payload?;
    let user = monitor.get_user(&req.telegram_id).await?;
    Ok(Json(json!({"user": user})))
}

#[tracing::instrument(skip_all)]
pub async fn delete_user(
    Extension(monitor): Extension<Arc<Monitor>>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(req) = payload?;
    monitor.delete_user(&req.telegram_id).await?;
    Ok(Json(json!({"status": "ok"})))
}

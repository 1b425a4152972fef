use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{post, MethodRouter},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use super::aggregate::ScoreResult;
use super::calculator::CalculationResult;
use super::formulas::FormulaOutcome;
use super::input::InputError;
use super::repository::DocumentStore;
use super::service::{FormulaRequest, ScoringService, ScoringServiceError};
use crate::error::AppError;

/// Router exposing the scoring endpoints. `/scoreHospital` is kept as an alias
/// of `/score` for existing callers.
pub fn scoring_router<S>(service: Arc<ScoringService<S>>) -> Router
where
    S: DocumentStore + 'static,
{
    Router::new()
        .route("/score", post_only(post(score_handler::<S>)))
        .route("/scoreHospital", post_only(post(score_handler::<S>)))
        .route("/calculate", post_only(post(calculate_handler::<S>)))
        .route(
            "/formulas/evaluate",
            post_only(post(evaluate_formulas_handler::<S>)),
        )
        .with_state(service)
}

/// Adds the permissive CORS headers to every response the router produces.
pub fn with_cors(router: Router) -> Router {
    router.layer(middleware::map_response(apply_cors_headers))
}

fn post_only<S>(route: MethodRouter<S>) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.options(preflight_handler).fallback(method_not_allowed)
}

pub(crate) async fn apply_cors_headers(mut response: Response) -> Response {
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("POST, OPTIONS"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type"),
    );
    response
}

pub(crate) async fn preflight_handler() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub(crate) async fn method_not_allowed() -> Response {
    let payload = json!({ "error": "Method Not Allowed" });
    (StatusCode::METHOD_NOT_ALLOWED, Json(payload)).into_response()
}

pub(crate) async fn score_handler<S>(
    State(service): State<Arc<ScoringService<S>>>,
    body: Bytes,
) -> Result<Json<ScoreResult>, AppError>
where
    S: DocumentStore + 'static,
{
    let payload: serde_json::Value = decode(&body)?;
    let result = off_runtime(service, move |service| service.score(payload)).await?;
    Ok(Json(result))
}

pub(crate) async fn calculate_handler<S>(
    State(service): State<Arc<ScoringService<S>>>,
    body: Bytes,
) -> Result<Json<CalculationResult>, AppError>
where
    S: DocumentStore + 'static,
{
    let payload: serde_json::Value = decode(&body)?;
    let result = off_runtime(service, move |service| service.calculate(payload)).await?;
    Ok(Json(result))
}

pub(crate) async fn evaluate_formulas_handler<S>(
    State(service): State<Arc<ScoringService<S>>>,
    body: Bytes,
) -> Result<Json<FormulaOutcome>, AppError>
where
    S: DocumentStore + 'static,
{
    let request: FormulaRequest = decode(&body)?;
    let outcome = off_runtime(service, move |service| service.evaluate_formulas(request)).await?;
    Ok(Json(outcome))
}

/// Store reads may block, so service calls run on the blocking pool.
async fn off_runtime<S, T, F>(service: Arc<ScoringService<S>>, work: F) -> Result<T, AppError>
where
    S: DocumentStore + 'static,
    T: Send + 'static,
    F: FnOnce(&ScoringService<S>) -> Result<T, ScoringServiceError> + Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || work(&service)).await?;
    Ok(outcome?)
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|error| AppError::Input(InputError::InvalidJson(error)))
}

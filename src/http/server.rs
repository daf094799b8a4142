// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Phylodiff-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Phylodiff and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::Arc;

use axum::extract::{FromRequest, Request, State};
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde::de::DeserializeOwned;

use super::types::{DrawTreeParams, LoadTreesParams, NodeParams, RunActionParams, Scalar};
use crate::dispatch::Side;
use crate::error::{CoreError, ErrorKind};
use crate::model::{ActionId, NodeId, SessionId, TreeSource};
use crate::service::{CompareService, LoadRequest};

type AppState = Arc<CompareService>;

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "POST, GET, OPTIONS, PUT";
const ALLOW_HEADERS: &str = "Origin, X-Requested-With, Content-Type, Accept";

/// A failed request: status code plus a plain-text message for the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn resource_not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: message.into() }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match (err.kind(), &err) {
            (ErrorKind::Internal, _) => {
                tracing::error!(error = %err, "request failed");
                Self::internal_error(message)
            }
            (
                ErrorKind::Caller,
                CoreError::SessionNotFound(_)
                | CoreError::NodeNotFound { .. }
                | CoreError::ActionNotFound { .. },
            ) => Self::resource_not_found(message),
            (ErrorKind::Caller, _) => Self::invalid_params(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, self.message).into_response()
    }
}

/// Body extractor that takes JSON when the request says so and urlencoded form data otherwise.
#[derive(Debug, Clone)]
pub struct FormOrJson<T>(pub T);

impl<T, S> FromRequest<S> for FormOrJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.trim_start().starts_with("application/json"));
        if is_json {
            Json::<T>::from_request(req, state)
                .await
                .map(|Json(value)| Self(value))
                .map_err(|rejection| ApiError::invalid_params(rejection.body_text()))
        } else {
            Form::<T>::from_request(req, state)
                .await
                .map(|Form(value)| Self(value))
                .map_err(|rejection| ApiError::invalid_params(rejection.body_text()))
        }
    }
}

pub fn router(service: Arc<CompareService>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/load_trees", post(load_trees))
        .route("/draw_tree", post(draw_tree))
        .route("/get_actions", post(get_actions))
        .route("/run_action", post(run_action))
        .route("/get_dist", post(get_dist))
        .layer(middleware::from_fn(cors))
        .with_state(service)
}

fn apply_cors_headers(headers: &mut HeaderMap) {
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static(ALLOW_ORIGIN));
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS));
}

async fn cors(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        let mut response = StatusCode::OK.into_response();
        apply_cors_headers(response.headers_mut());
        return response;
    }
    let mut response = next.run(request).await;
    apply_cors_headers(response.headers_mut());
    response
}

/// Runs a core call on the blocking pool; sessions are guarded by std mutexes.
async fn blocking<F>(work: F) -> Result<Html<String>, ApiError>
where
    F: FnOnce() -> Result<String, CoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::internal_error(format!("request worker failed: {err}")))?
        .map(Html)
        .map_err(ApiError::from)
}

fn session_id(raw: &Scalar) -> Result<SessionId, ApiError> {
    SessionId::new(raw.as_str().trim())
        .map_err(|err| ApiError::invalid_params(format!("invalid tree id: {err}")))
}

fn node_id(raw: &Scalar) -> Result<NodeId, ApiError> {
    raw.as_str().trim().parse::<NodeId>().map_err(|err| ApiError::invalid_params(err.to_string()))
}

fn load_request(
    treeid: Option<Scalar>,
    newick: Option<String>,
    alignment: Option<String>,
    missing: &'static str,
) -> Result<LoadRequest, ApiError> {
    let newick = newick.filter(|text| !text.trim().is_empty());
    let (Some(treeid), Some(newick)) = (treeid, newick) else {
        return Err(ApiError::invalid_params(missing));
    };
    let session_id = SessionId::new(treeid.0.trim()).map_err(|_| ApiError::invalid_params(missing))?;
    let source = match alignment.filter(|text| !text.trim().is_empty()) {
        Some(alignment) => TreeSource::new(newick).with_alignment(alignment),
        None => TreeSource::new(newick),
    };
    Ok(LoadRequest { session_id, source })
}

async fn status() -> &'static str {
    "alive"
}

async fn load_trees(
    State(service): State<AppState>,
    FormOrJson(params): FormOrJson<LoadTreesParams>,
) -> Result<Html<String>, ApiError> {
    let left = load_request(params.treeid1, params.newick1, params.alg1, "No source tree provided")?;
    let right = load_request(params.treeid2, params.newick2, params.alg2, "No target tree provided")?;
    blocking(move || service.load_pair(&left, &right, None).map(|_| String::new())).await
}

async fn draw_tree(
    State(service): State<AppState>,
    FormOrJson(params): FormOrJson<DrawTreeParams>,
) -> Result<Html<String>, ApiError> {
    let session_id = session_id(&params.treeid)?;
    blocking(move || service.draw(&session_id)).await
}

async fn get_actions(
    State(service): State<AppState>,
    FormOrJson(params): FormOrJson<NodeParams>,
) -> Result<Html<String>, ApiError> {
    let session_id = session_id(&params.treeid)?;
    let node_id = node_id(&params.nodeid)?;
    blocking(move || service.actions_menu(&session_id, node_id)).await
}

async fn run_action(
    State(service): State<AppState>,
    FormOrJson(params): FormOrJson<RunActionParams>,
) -> Result<Html<String>, ApiError> {
    let session_id = session_id(&params.treeid)?;
    let node_id = node_id(&params.nodeid)?;
    let action_id = ActionId::new(params.aindex.trim())
        .map_err(|err| ApiError::invalid_params(format!("invalid action id: {err}")))?;
    // Anything but `source` or `target`, including no side at all, runs the action unbound.
    let side = params.side.as_deref().unwrap_or_default().parse().unwrap_or(Side::Unbound);
    blocking(move || service.run_action(&session_id, node_id, &action_id, side)).await
}

async fn get_dist(
    State(service): State<AppState>,
    FormOrJson(params): FormOrJson<NodeParams>,
) -> Result<Html<String>, ApiError> {
    let session_id = session_id(&params.treeid)?;
    let node_id = node_id(&params.nodeid)?;
    blocking(move || service.distance(&session_id, node_id)).await
}

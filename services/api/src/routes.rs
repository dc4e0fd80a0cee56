use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use maverick_mindset::onboarding::{
    onboarding_router, FileStorage, IdentityProvider, OnboardingRepository, OnboardingService,
    TextGenerator,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_onboarding_routes<R, G, F>(
    service: Arc<OnboardingService<R, G, F>>,
    identity: Arc<dyn IdentityProvider>,
) -> Router
where
    R: OnboardingRepository + 'static,
    G: TextGenerator + 'static,
    F: FileStorage + 'static,
{
    onboarding_router(service, identity)
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

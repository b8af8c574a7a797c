//! HTTP routes over the shared, read-only [`Context`].

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json};
use axum::routing::get;
use serde::Serialize;
use shoplens_rf::{HoldoutEvaluation, RankedFeature};
use tracing::debug;

use crate::context::Context;
use crate::pages;

/// Handler state: the pipeline results, shared across requests.
pub type AppState = Arc<Context>;

#[derive(Serialize)]
struct EvaluationBody<'a> {
    accuracy_percent: String,
    n_train: usize,
    n_holdout: usize,
    evaluation: &'a HoldoutEvaluation,
    feature_importances: &'a [RankedFeature],
}

/// Build the dashboard router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/home", get(home_handler))
        .route("/performance", get(performance_handler))
        .route("/api/evaluation", get(evaluation_handler))
        .route("/healthz", get(healthz_handler))
        .with_state(state)
}

async fn dashboard_handler(State(ctx): State<AppState>) -> Html<String> {
    debug!(route = "/", "rendering dashboard");
    Html(pages::dashboard(&ctx))
}

async fn home_handler() -> Html<String> {
    debug!(route = "/home", "rendering home");
    Html(pages::home())
}

async fn performance_handler(State(ctx): State<AppState>) -> Html<String> {
    debug!(route = "/performance", "rendering model performance");
    Html(pages::performance(&ctx))
}

async fn evaluation_handler(State(ctx): State<AppState>) -> impl IntoResponse {
    debug!(route = "/api/evaluation", "serving evaluation");
    let body = EvaluationBody {
        accuracy_percent: ctx.evaluation.accuracy_percent(),
        n_train: ctx.partition.train.len(),
        n_holdout: ctx.partition.holdout.len(),
        evaluation: &ctx.evaluation,
        feature_importances: &ctx.importances,
    };
    match serde_json::to_value(&body) {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

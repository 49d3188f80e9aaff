use std::time::Duration;

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::database::models::{Income, Ledger, Spending, Users};
use crate::handlers::{docs, health, resource, Resource};
use crate::state::AppState;

/// Build the full router over `state`
pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        .route("/health", get(health::health))
        .merge(resource_routes::<Users>("/users"))
        .merge(resource_routes::<Ledger<Spending>>("/spending"))
        .merge(resource_routes::<Ledger<Income>>("/income"))
        .merge(docs_routes())
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.request_timeout_secs)))
        .layer(TraceLayer::new_for_http());

    if config.security.enable_cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Collection and item routes for one resource
fn resource_routes<R: Resource>(base: &str) -> Router<AppState> {
    Router::new()
        .route(base, get(resource::list::<R>).post(resource::create::<R>))
        .route(
            &format!("{}/:id", base),
            get(resource::get_one::<R>)
                .put(resource::update::<R>)
                .delete(resource::delete::<R>),
        )
}

fn docs_routes() -> Router<AppState> {
    Router::new()
        .route("/openapi.yaml", get(docs::openapi_yaml))
        .route("/api/openapi.yaml", get(docs::openapi_yaml))
        .route("/api/openapi.json", get(docs::openapi_json))
        .route("/docs", get(docs::swagger_ui))
        .route("/swagger", get(docs::swagger_ui))
        .route("/api/docs", get(docs::swagger_ui))
}

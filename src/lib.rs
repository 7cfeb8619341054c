use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod audit;
pub mod config;
pub mod store;
pub mod types;

use audit::{ConsoleInterceptor, PatternSet, PolicyTable, TracingLeakListener};
use config::Config;
use store::HeaderCache;

pub struct AppState {
    pub config: Config,
    pub policy: Arc<PolicyTable>,
    pub header_cache: HeaderCache,
    /// Live console observation, independent of audit runs
    pub console: ConsoleInterceptor,
}

impl AppState {
    pub fn new(config: Config, policy: PolicyTable) -> Self {
        let console = ConsoleInterceptor::new(PatternSet::builtin());
        console.register(Arc::new(TracingLeakListener));

        Self {
            config,
            policy: Arc::new(policy),
            header_cache: HeaderCache::new(),
            console,
        }
    }
}

pub fn build_router(state: Arc<AppState>) -> Router {
    // Protected routes (require API key if configured)
    let protected_routes = Router::new()
        .nest("/audit", api::routes::audit_routes())
        .nest("/tabs", api::routes::tab_routes())
        .merge(api::routes::console_routes())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            api::middleware::require_api_key,
        ));

    Router::new()
        .route("/health", get(api::handlers::health))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

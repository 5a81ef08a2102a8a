//! Application route configuration.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    activity_routes, auth_routes, dashboard_routes, document_routes, health,
    notification_routes, project_routes, root, session_routes, skill_public_routes,
    skill_routes, user_routes, work_log_routes,
};
use super::middleware::{auth_middleware, rate_limit_auth_middleware, rate_limit_middleware};
use super::openapi::ApiDoc;
use super::AppState;

/// JWT plus the general rate limit (checked first).
fn protected(routes: Router<AppState>, state: &AppState) -> Router<AppState> {
    routes
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
}

/// Browser access from the configured frontend origin only.
fn cors(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
    match HeaderValue::from_str(frontend_url) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(frontend_url, "FRONTEND_URL is not a valid origin, CORS disabled");
            layer
        }
    }
}

/// Create the application router with all routes configured
pub fn create_router(state: AppState) -> Router {
    let auth = Router::new()
        .merge(auth_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_auth_middleware,
        )))
        .merge(protected(session_routes(), &state));

    let skills = Router::new()
        .merge(skill_public_routes().route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        )))
        .merge(protected(skill_routes(), &state));

    let documents = protected(document_routes(), &state)
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    Router::new()
        // Health check endpoints (no rate limiting)
        .route("/", get(root))
        .route("/health", get(health))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/auth", auth)
        .nest("/users", protected(user_routes(), &state))
        .nest("/projects", protected(project_routes(), &state))
        .nest("/activity", protected(activity_routes(), &state))
        .nest("/activities", protected(activity_routes(), &state))
        .nest("/worklog", protected(work_log_routes(), &state))
        .nest("/skill", skills)
        .nest("/document", documents)
        .nest("/notification", protected(notification_routes(), &state))
        .nest("/dashboard", protected(dashboard_routes(), &state))
        // Global middleware
        .layer(cors(&state.config.frontend_url))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub mod error;
pub mod extractors;
pub mod routes;
pub mod state;

use axum::{
    Router,
    http::HeaderValue,
    routing::{delete, get, post},
};
use state::AppState;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.app.cors_origins);

    // Invitation workflow
    let invitation_routes = Router::new()
        .route("/", post(routes::invitation::send))
        .route("/sent", get(routes::invitation::list_sent))
        .route("/received", get(routes::invitation::list_received))
        .route("/request-again", post(routes::invitation::request_again))
        .route("/{invitation_id}", delete(routes::invitation::revoke))
        .route("/{invitation_id}/respond", post(routes::invitation::respond))
        .route(
            "/{invitation_id}/accepted",
            delete(routes::invitation::remove_accepted),
        );

    // Accounts reachable by the requester
    let account_routes = Router::new()
        .route("/", get(routes::account::list))
        .route("/delegate", get(routes::account::delegates))
        .route("/{owner_id}/access", get(routes::account::access))
        .route("/{owner_id}/leave", post(routes::account::leave));

    // Account-scoped resources (`?account_id=` selects the account)
    let transaction_routes = Router::new().route(
        "/",
        get(routes::transaction::list)
            .post(routes::transaction::create)
            .delete(routes::transaction::delete_all),
    );

    // Compose API
    let api = Router::new()
        .route("/me", get(routes::user::me))
        .nest("/invitation", invitation_routes)
        .nest("/account", account_routes)
        .nest("/transaction", transaction_routes);

    // Health check
    let health = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api)
        .merge(health)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if allowed.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(AllowOrigin::list(allowed))
    }
}

async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

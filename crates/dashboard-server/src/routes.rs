//! Router

use axum::{
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{
    assistant_handler, convert_currency, create_sync_code, current_session, get_insights,
    get_settings, health_check, list_sync_codes, list_transactions, login, logout, market_analysis,
    market_gauge, market_snapshot, market_stream_handler, place_order, portfolio_handler,
    portfolio_health, query_handler, redeem_sync_code, refresh_insights, reset_settings,
    revoke_all_sync_codes, revoke_sync_code, signup, update_setting, username_suggestions,
};
use crate::state::AppState;

/// Route table, logged at startup
pub const ENDPOINTS: &[(&str, &str, &str)] = &[
    ("GET", "/health", "Health check"),
    ("GET", "/api/market", "Market snapshot"),
    ("GET", "/api/market/analysis", "Market narrative and risks"),
    ("GET", "/api/market/gauge", "Market health gauge"),
    ("GET", "/api/market/stream", "WebSocket market ticks"),
    ("POST", "/api/query", "Natural-language coin filter"),
    ("POST", "/api/assistant", "Market assistant"),
    ("POST", "/api/portfolio/health", "Score holdings"),
    ("GET", "/api/portfolio", "Positions of the session user"),
    ("POST", "/api/orders", "Place an order"),
    ("GET", "/api/transactions", "Trade history"),
    ("POST", "/api/auth/signup", "Create account"),
    ("POST", "/api/auth/login", "Log in"),
    ("POST", "/api/auth/logout", "Log out"),
    ("GET", "/api/auth/session", "Current session"),
    ("GET", "/api/auth/suggestions", "Username suggestions"),
    ("POST", "/api/sync-codes", "Create device sync code"),
    ("GET", "/api/sync-codes", "Active sync codes"),
    ("DELETE", "/api/sync-codes", "Revoke all sync codes"),
    ("POST", "/api/sync-codes/redeem", "Redeem sync code"),
    ("DELETE", "/api/sync-codes/{code}", "Revoke one sync code"),
    ("GET", "/api/settings", "Load settings"),
    ("PATCH", "/api/settings", "Change one setting"),
    ("POST", "/api/settings/reset", "Restore default settings"),
    ("GET", "/api/insights", "Daily insight"),
    ("POST", "/api/insights/refresh", "Regenerate insight"),
    ("GET", "/api/currency/convert", "Convert a USD amount"),
];

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Market
        .route("/api/market", get(market_snapshot))
        .route("/api/market/analysis", get(market_analysis))
        .route("/api/market/gauge", get(market_gauge))
        .route("/api/market/stream", get(market_stream_handler))
        .route("/api/query", post(query_handler))
        .route("/api/assistant", post(assistant_handler))
        // Portfolio & trading
        .route("/api/portfolio", get(portfolio_handler))
        .route("/api/portfolio/health", post(portfolio_health))
        .route("/api/orders", post(place_order))
        .route("/api/transactions", get(list_transactions))
        // Accounts
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/session", get(current_session))
        .route("/api/auth/suggestions", get(username_suggestions))
        .route(
            "/api/sync-codes",
            post(create_sync_code)
                .get(list_sync_codes)
                .delete(revoke_all_sync_codes),
        )
        .route("/api/sync-codes/redeem", post(redeem_sync_code))
        .route("/api/sync-codes/{code}", delete(revoke_sync_code))
        // Preferences
        .route("/api/settings", get(get_settings).patch(update_setting))
        .route("/api/settings/reset", post(reset_settings))
        .route("/api/insights", get(get_insights))
        .route("/api/insights/refresh", post(refresh_insights))
        .route("/api/currency/convert", get(convert_currency))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

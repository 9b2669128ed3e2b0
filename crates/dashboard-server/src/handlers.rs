//! HTTP/WebSocket Handlers

use std::collections::BTreeMap;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::Response,
    Json,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use dashboard_accounts::{
    run_blocking, AccountError, ActiveCode, InsightSnapshot, OrderRequest, Portfolio, Position,
    SessionUser, SettingUpdate, Settings, Transaction,
};
use dashboard_core::currency::{format_compact, format_currency};
use dashboard_core::market::GaugeReading;
use dashboard_core::{
    analyze_market, health, respond, run_query, AssetRecord, Currency, DashboardError,
    HealthReport, HoldingRecord, MarketFeed, MarketReport, QueryOutcome,
};

use crate::state::{AppState, MarketTick};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    /// Alternative usernames when signup collides
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(status: StatusCode, error: impl Into<String>, code: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
            suggestions: Vec::new(),
        }),
    )
}

fn account_error(err: AccountError) -> ApiError {
    let status = match &err {
        AccountError::UsernameTaken { .. } => StatusCode::CONFLICT,
        AccountError::InvalidCredentials | AccountError::NotLoggedIn => StatusCode::UNAUTHORIZED,
        AccountError::InvalidInput(_)
        | AccountError::InvalidQuantity
        | AccountError::InvalidLimitPrice
        | AccountError::InsufficientBalance { .. } => StatusCode::BAD_REQUEST,
        AccountError::SyncCodeInvalid | AccountError::AssetNotFound(_) => StatusCode::NOT_FOUND,
        AccountError::SyncCodeExpired => StatusCode::GONE,
        AccountError::Payment(_) => StatusCode::BAD_GATEWAY,
        AccountError::Hashing(_)
        | AccountError::Storage(_)
        | AccountError::Io(_)
        | AccountError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        tracing::error!(error = %err, retryable = err.is_retryable(), "request failed");
    }

    let suggestions = match &err {
        AccountError::UsernameTaken { suggestions } => suggestions.clone(),
        _ => Vec::new(),
    };

    (
        status,
        Json(ErrorResponse {
            error: err.user_message(),
            code: err.code().into(),
            suggestions,
        }),
    )
}

fn feed_error(err: DashboardError) -> ApiError {
    tracing::error!("Market feed error: {}", err);
    api_error(
        StatusCode::SERVICE_UNAVAILABLE,
        "Market data is unavailable right now.",
        "FEED_UNAVAILABLE",
    )
}

async fn snapshot(state: &AppState) -> Result<Vec<AssetRecord>, ApiError> {
    state.market.snapshot().await.map_err(feed_error)
}

fn require_user(state: &AppState) -> Result<SessionUser, ApiError> {
    state
        .auth
        .session_user()
        .map_err(account_error)?
        .ok_or_else(|| account_error(AccountError::NotLoggedIn))
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub feed: String,
    pub feed_healthy: bool,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub reply: String,
}

#[derive(Debug, Deserialize)]
pub struct PortfolioHealthRequest {
    pub holdings: Vec<HoldingRecord>,
}

#[derive(Debug, Serialize)]
pub struct PortfolioResponse {
    pub username: String,
    pub total_value: Decimal,
    pub positions: Vec<Position>,
}

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: Option<SessionUser>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub base: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateSyncCodeRequest {
    #[serde(default)]
    pub profile_photo: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncCodeResponse {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedeemResponse {
    pub user: SessionUser,
    pub profile_photo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub amount: Decimal,
    #[serde(default)]
    pub to: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub amount_usd: Decimal,
    pub currency: Currency,
    pub rate: Decimal,
    pub value: Decimal,
    pub formatted: String,
    pub compact: String,
}

// ============================================================================
// Market
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        feed: state.market.name().into(),
        feed_healthy: state.market.health_check().await,
    })
}

pub async fn market_snapshot(State(state): State<AppState>) -> ApiResult<Vec<AssetRecord>> {
    Ok(Json(snapshot(&state).await?))
}

pub async fn market_analysis(State(state): State<AppState>) -> ApiResult<MarketReport> {
    let assets = snapshot(&state).await?;
    Ok(Json(analyze_market(&assets)))
}

pub async fn market_gauge(State(state): State<AppState>) -> Json<GaugeReading> {
    Json(state.gauge.lock().await.reading())
}

/// Live market stream: one JSON [`MarketTick`] per tick
pub async fn market_stream_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_stream(socket, state))
}

async fn handle_stream(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut ticks = state.ticks.subscribe();

    // Current state first so a client never waits a whole period
    if let Ok(assets) = state.market.snapshot().await {
        let gauge = state.gauge.lock().await.reading();
        if !send_json(&mut sender, &MarketTick { assets, gauge }).await {
            return;
        }
    }

    loop {
        tokio::select! {
            tick = ticks.recv() => match tick {
                Ok(tick) => {
                    if !send_json(&mut sender, &tick).await {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "stream client lagging");
                }
                Err(RecvError::Closed) => break,
            },
            msg = receiver.next() => match msg {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::error!("WebSocket error: {}", e);
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }
}

async fn send_json(sender: &mut SplitSink<WebSocket, Message>, value: &impl Serialize) -> bool {
    match serde_json::to_string(value) {
        Ok(text) => sender.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to encode tick: {}", e);
            false
        }
    }
}

// ============================================================================
// Query, assistant, health score
// ============================================================================

/// Natural-language filter over the current snapshot
pub async fn query_handler(
    State(state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> ApiResult<QueryOutcome> {
    let assets = snapshot(&state).await?;
    let outcome = run_query(&payload.query, &assets);
    tracing::info!(intent = outcome.intent.as_str(), matched = outcome.assets.len(), "query");
    Ok(Json(outcome))
}

pub async fn assistant_handler(
    State(state): State<AppState>,
    Json(payload): Json<AssistantRequest>,
) -> ApiResult<AssistantResponse> {
    let assets = snapshot(&state).await?;
    if !state.ai_thinking.is_zero() {
        tokio::time::sleep(state.ai_thinking).await;
    }
    Ok(Json(AssistantResponse {
        reply: respond(&payload.message, &assets),
    }))
}

/// Score an explicit set of holdings against the snapshot
pub async fn portfolio_health(
    State(state): State<AppState>,
    Json(payload): Json<PortfolioHealthRequest>,
) -> ApiResult<HealthReport> {
    let assets = snapshot(&state).await?;
    Ok(Json(health::score(&payload.holdings, &assets)))
}

// ============================================================================
// Trading
// ============================================================================

pub async fn portfolio_handler(State(state): State<AppState>) -> ApiResult<PortfolioResponse> {
    let user = require_user(&state)?;
    let assets = snapshot(&state).await?;
    let transactions = state.ledger.list(&user.username).map_err(account_error)?;
    let portfolio = Portfolio::from_transactions(&transactions);

    Ok(Json(PortfolioResponse {
        total_value: portfolio.total_value(&assets),
        positions: portfolio.detailed(&assets),
        username: user.username,
    }))
}

pub async fn place_order(
    State(state): State<AppState>,
    Json(payload): Json<OrderRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let user = state.auth.session_user().map_err(account_error)?;
    let assets = snapshot(&state).await?;
    let rates = state.rates.read().await.clone();

    let tx = state
        .orders
        .place_order(user.as_ref(), &payload, &assets, &rates)
        .await
        .map_err(account_error)?;

    Ok((StatusCode::CREATED, Json(tx)))
}

pub async fn list_transactions(State(state): State<AppState>) -> ApiResult<Vec<Transaction>> {
    let user = require_user(&state)?;
    Ok(Json(state.ledger.list(&user.username).map_err(account_error)?))
}

// ============================================================================
// Auth
// ============================================================================

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<(StatusCode, Json<SessionUser>), ApiError> {
    let auth = state.auth.clone();
    let user = run_blocking(move || auth.signup(&payload.username, &payload.password))
        .await
        .map_err(account_error)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> ApiResult<SessionUser> {
    let auth = state.auth.clone();
    let user = run_blocking(move || auth.login(&payload.username, &payload.password))
        .await
        .map_err(account_error)?;
    Ok(Json(user))
}

pub async fn logout(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let auth = state.auth.clone();
    run_blocking(move || auth.logout()).await.map_err(account_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_session(State(state): State<AppState>) -> ApiResult<SessionResponse> {
    let user = state.auth.session_user().map_err(account_error)?;
    Ok(Json(SessionResponse { user }))
}

pub async fn username_suggestions(
    State(state): State<AppState>,
    Query(params): Query<SuggestionQuery>,
) -> ApiResult<Vec<String>> {
    let base = params.base.trim();
    if base.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "base is required", "INVALID_INPUT"));
    }
    Ok(Json(state.auth.suggest_usernames(base).map_err(account_error)?))
}

// ============================================================================
// Sync codes
// ============================================================================

pub async fn create_sync_code(
    State(state): State<AppState>,
    Json(payload): Json<CreateSyncCodeRequest>,
) -> Result<(StatusCode, Json<SyncCodeResponse>), ApiError> {
    let user = require_user(&state)?;
    let sync_codes = state.sync_codes.clone();
    let code = run_blocking(move || sync_codes.create(&user.username, payload.profile_photo))
        .await
        .map_err(account_error)?;
    Ok((StatusCode::CREATED, Json(SyncCodeResponse { code })))
}

pub async fn list_sync_codes(
    State(state): State<AppState>,
) -> ApiResult<BTreeMap<String, ActiveCode>> {
    Ok(Json(state.sync_codes.active().map_err(account_error)?))
}

pub async fn revoke_all_sync_codes(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    let sync_codes = state.sync_codes.clone();
    run_blocking(move || sync_codes.revoke_all()).await.map_err(account_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn revoke_sync_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<StatusCode, ApiError> {
    let sync_codes = state.sync_codes.clone();
    let revoked = run_blocking(move || sync_codes.revoke(&code))
        .await
        .map_err(account_error)?;
    if revoked {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(account_error(AccountError::SyncCodeInvalid))
    }
}

/// Redeem a code from another device and log in as its owner
pub async fn redeem_sync_code(
    State(state): State<AppState>,
    Json(payload): Json<RedeemRequest>,
) -> ApiResult<RedeemResponse> {
    let sync_codes = state.sync_codes.clone();
    let auth = state.auth.clone();
    let response = run_blocking(move || {
        let redeemed = sync_codes.redeem(&payload.code)?;
        let user = auth.resume_session(&redeemed.username)?;
        Ok(RedeemResponse {
            user,
            profile_photo: redeemed.profile_photo,
        })
    })
    .await
    .map_err(account_error)?;

    Ok(Json(response))
}

// ============================================================================
// Settings & insights
// ============================================================================

pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Settings> {
    Ok(Json(state.settings.load().map_err(account_error)?))
}

pub async fn update_setting(
    State(state): State<AppState>,
    Json(update): Json<SettingUpdate>,
) -> ApiResult<Settings> {
    let settings = state.settings.clone();
    let updated = run_blocking(move || settings.update(update))
        .await
        .map_err(account_error)?;
    Ok(Json(updated))
}

pub async fn reset_settings(State(state): State<AppState>) -> ApiResult<Settings> {
    let settings = state.settings.clone();
    let defaults = run_blocking(move || settings.reset())
        .await
        .map_err(account_error)?;
    Ok(Json(defaults))
}

pub async fn get_insights(State(state): State<AppState>) -> ApiResult<InsightSnapshot> {
    let insights = state.insights.clone();
    let snapshot = run_blocking(move || insights.current())
        .await
        .map_err(account_error)?;
    Ok(Json(snapshot))
}

pub async fn refresh_insights(State(state): State<AppState>) -> ApiResult<InsightSnapshot> {
    let insights = state.insights.clone();
    let snapshot = run_blocking(move || insights.refresh())
        .await
        .map_err(account_error)?;
    Ok(Json(snapshot))
}

// ============================================================================
// Currency
// ============================================================================

pub async fn convert_currency(
    State(state): State<AppState>,
    Query(params): Query<ConvertQuery>,
) -> ApiResult<ConvertResponse> {
    let currency = match params.to.as_deref() {
        Some(code) => code.parse::<Currency>().map_err(|e| {
            api_error(StatusCode::BAD_REQUEST, e.to_string(), "UNSUPPORTED_CURRENCY")
        })?,
        None => Currency::default(),
    };

    let rates = state.rates.read().await;
    let value = rates.convert(params.amount, currency).map_err(|e| {
        api_error(StatusCode::BAD_REQUEST, e.to_string(), "INVALID_INPUT")
    })?;

    Ok(Json(ConvertResponse {
        amount_usd: params.amount,
        currency,
        rate: rates.rate(currency),
        value,
        formatted: format_currency(value, currency, 2),
        compact: format_compact(value, currency),
    }))
}

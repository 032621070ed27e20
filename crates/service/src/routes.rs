//! HTTP surface.
//!
//! Thin JSON endpoints over the core components. Validation failures come
//! back synchronously as 400s with a descriptive message; no partial state
//! mutation happens on those paths.

use axum::Router;
use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use chrono::Utc;
use raceticker_config::AppConfig;
use raceticker_feed::utc_timestamp;
use raceticker_format::DisplayPayload;
use serde_json::{Value, json};

use crate::context::AppContext;

/// Error returned to HTTP callers.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl ToString) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

/// Build the application router.
pub fn router(context: AppContext) -> Router {
    Router::new()
        .route("/api/clock", get(clock_status))
        .route("/api/clock/start", post(clock_start))
        .route("/api/clock/pause", post(clock_pause))
        .route("/api/clock/reset", post(clock_reset))
        .route("/api/payload", get(payload))
        .route("/api/loop_complete", post(loop_complete))
        .route("/api/config", get(get_config).post(patch_config))
        .route("/api/race/select", post(race_select))
        .route("/api/mode", post(mode_set))
        .route("/api/freeze", post(freeze_set))
        .route("/status", get(status))
        .with_state(context)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn clock_summary(context: &AppContext) -> Value {
    json!({
        "state": context.clock.state(),
        "elapsed_seconds": round2(context.clock.elapsed_seconds()),
        "elapsed_display": context.clock.elapsed_display(),
    })
}

async fn clock_status(State(context): State<AppContext>) -> Json<Value> {
    Json(clock_summary(&context))
}

async fn clock_start(State(context): State<AppContext>) -> Json<Value> {
    context.clock.start();
    Json(json!({ "ok": true }))
}

async fn clock_pause(State(context): State<AppContext>) -> Json<Value> {
    context.clock.pause();
    Json(json!({ "ok": true }))
}

async fn clock_reset(State(context): State<AppContext>) -> Json<Value> {
    context.clock.reset();
    Json(json!({ "ok": true }))
}

/// Current active display payload, polled by the display client.
async fn payload(State(context): State<AppContext>) -> Json<DisplayPayload> {
    Json((*context.display.active_payload()).clone())
}

/// The display client finished a scroll pass: promote pending if present.
async fn loop_complete(State(context): State<AppContext>) -> Json<Value> {
    let swapped = context.display.swap_pending_to_active();
    let version = context.display.active_payload().version;
    Json(json!({ "swapped": swapped, "version": version }))
}

async fn status(State(context): State<AppContext>) -> Json<Value> {
    let report = context.fetch.report();
    Json(json!({
        "current_time_utc": utc_timestamp(Utc::now()),
        "uptime_seconds": round2(context.started_at.elapsed().as_secs_f64()),
        "config_loaded": true,
        "clock": clock_summary(&context),
        "last_fetch_time": report.last_fetch_time,
        "last_hash": report.last_hash,
        "hash_changed": report.hash_changed,
        "last_error": report.last_error,
        "last_successful_parse_time": report.last_successful_parse_time,
        "race_state_summary": report.race_state_summary,
        "using_last_known_good": report.using_last_known_good,
    }))
}

async fn get_config(State(context): State<AppContext>) -> Json<AppConfig> {
    Json(context.config.snapshot())
}

/// Apply a partial config patch. A patch touching presentation sections
/// refreshes the active payload immediately; nothing is currently scrolling
/// that could tear, and the operator expects the change live.
async fn patch_config(
    State(context): State<AppContext>,
    Json(patch): Json<Value>,
) -> Result<Json<AppConfig>, ApiError> {
    let config = context
        .config
        .apply_patch(&patch)
        .map_err(ApiError::bad_request)?;

    let touches_presentation = ["ticker", "display", "race_time"]
        .iter()
        .any(|section| patch.get(section).is_some());
    if touches_presentation {
        let race_state = context.fetch.race_state();
        let race_time = context.clock.elapsed_display();
        context
            .display
            .refresh_from_config(&config, race_state.as_ref(), &race_time, false);
    }
    Ok(Json(config))
}

/// Switch the active race profile. Unknown ids are rejected.
async fn race_select(
    State(context): State<AppContext>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let race_id = body
        .get("race_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("race_id required (string)"))?;

    if !context.config.snapshot().races.profiles.contains_key(race_id) {
        return Err(ApiError::bad_request(format!(
            "unknown race_id '{race_id}'"
        )));
    }

    context
        .config
        .apply_patch(&json!({ "races": { "active_race_id": race_id } }))
        .map_err(ApiError::bad_request)?;
    Ok(Json(json!({ "ok": true })))
}

async fn mode_set(
    State(context): State<AppContext>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let source = body.get("source").and_then(Value::as_str);
    if !matches!(source, Some("live") | Some("simulate")) {
        return Err(ApiError::bad_request("source must be 'live' or 'simulate'"));
    }
    context
        .config
        .apply_patch(&json!({ "mode": { "source": source } }))
        .map_err(ApiError::bad_request)?;
    Ok(Json(json!({ "ok": true })))
}

async fn freeze_set(
    State(context): State<AppContext>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    let freeze = body
        .get("freeze")
        .and_then(Value::as_bool)
        .ok_or_else(|| ApiError::bad_request("freeze must be boolean"))?;
    context
        .config
        .apply_patch(&json!({ "mode": { "freeze_updates": freeze } }))
        .map_err(ApiError::bad_request)?;
    Ok(Json(json!({ "ok": true })))
}

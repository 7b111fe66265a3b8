//! The Fleet HTTP surface: the only inter-layer interface external
//! collaborators bind to (`spec.md` §6).
//!
//! Grounded on `src/rest_api.rs`'s `Router`/`Json`/`StatusCode` idiom and
//! on `original_source/internal/fleet/server.go`'s handler set and
//! `payloadSummary` cosmetic parsing.

use std::sync::Arc;
use std::sync::Mutex;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FleetError;
use crate::ids::AreaId;
use crate::model::{AreaSummary, WorkOrder};

use super::{FleetService, WorkOrderDraft};

const MAX_RECENT_ORDERS: usize = 100;

/// A summary of a submitted work order, retained for `GET /work_orders`.
#[derive(Debug, Clone, Serialize)]
struct RecentWorkOrderEntry {
    id: String,
    area_id: String,
    priority: i64,
    payload_summary: String,
    created_at: String,
}

/// Shared server state: the Fleet service plus a bounded ring of recently
/// submitted work orders for display.
struct AppState {
    fleet: Arc<FleetService>,
    recent: Mutex<Vec<RecentWorkOrderEntry>>,
}

/// Builds the Fleet's `axum::Router`, wiring every endpoint in
/// `spec.md` §6.
#[must_use]
pub fn router(fleet: Arc<FleetService>) -> Router {
    let state = Arc::new(AppState {
        fleet,
        recent: Mutex::new(Vec::new()),
    });

    Router::new()
        .route("/health", get(health))
        .route("/work_orders", get(list_work_orders).post(create_work_order))
        .route("/firmware/simulate", post(simulate_firmware))
        .route("/state", get(get_state))
        .route("/state/areas", get(get_state_areas))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    layer: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", layer: "fleet" })
}

#[derive(Deserialize)]
struct CreateWorkOrderRequest {
    area_id: String,
    #[serde(default)]
    priority: i64,
    #[serde(default)]
    payload: String,
    deadline: Option<String>,
}

#[derive(Serialize)]
struct CreateWorkOrderResponse {
    id: String,
    area_id: String,
    created_at: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn bad_request(message: impl Into<String>) -> axum::response::Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: message.into() })).into_response()
}

fn error_response(err: &FleetError) -> axum::response::Response {
    let status = if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(ErrorResponse { error: err.to_string() })).into_response()
}

async fn create_work_order(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateWorkOrderRequest>,
) -> axum::response::Response {
    if req.area_id.is_empty() {
        return bad_request("area_id required");
    }
    let area_id = match AreaId::try_new(req.area_id) {
        Ok(id) => id,
        Err(err) => return bad_request(format!("invalid area_id: {err}")),
    };
    let payload: Value = if req.payload.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&req.payload).unwrap_or(Value::String(req.payload))
    };
    let deadline: Option<DateTime<Utc>> = match req.deadline {
        None => None,
        Some(raw) => match DateTime::parse_from_rfc3339(&raw) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(err) => return bad_request(format!("invalid deadline: {err}")),
        },
    };

    let draft = WorkOrderDraft {
        area_id,
        priority: req.priority,
        payload,
        deadline,
    };
    match state.fleet.submit_work_order(draft).await {
        Ok(order) => {
            add_recent(&state, &order);
            (
                StatusCode::CREATED,
                Json(CreateWorkOrderResponse {
                    id: order.id.to_string(),
                    area_id: order.area_id.to_string(),
                    created_at: order.created_at.to_rfc3339(),
                }),
            )
                .into_response()
        }
        Err(err) => error_response(&err),
    }
}

fn add_recent(state: &AppState, order: &WorkOrder) {
    let entry = RecentWorkOrderEntry {
        id: order.id.to_string(),
        area_id: order.area_id.to_string(),
        priority: order.priority,
        payload_summary: payload_summary(&order.payload),
        created_at: order.created_at.to_rfc3339(),
    };
    let mut recent = state.recent.lock().expect("recent orders lock poisoned");
    recent.push(entry);
    if recent.len() > MAX_RECENT_ORDERS {
        let overflow = recent.len() - MAX_RECENT_ORDERS;
        recent.drain(0..overflow);
    }
}

/// A short human-readable description of a work order's payload, for the
/// `GET /work_orders` listing. Mirrors `server.go::payloadSummary`'s
/// discriminators: firmware updates, CMMS maintenance, WMS pick/putaway/
/// move tasks, and a generic SKU fallback.
fn payload_summary(payload: &Value) -> String {
    let Some(obj) = payload.as_object() else {
        return match payload {
            Value::Null => "\u{2014}".to_string(),
            other => other.to_string(),
        };
    };
    let kind = obj.get("type").and_then(Value::as_str);

    if kind == Some("firmware_update") {
        return match obj.get("version").and_then(Value::as_str) {
            Some(version) if !version.is_empty() => format!("firmware {version}"),
            _ => "firmware update".to_string(),
        };
    }
    if kind == Some("maintenance") {
        if let Some(version) = obj.get("target_firmware_version").and_then(Value::as_str) {
            if !version.is_empty() {
                return format!("firmware {version}");
            }
        }
        let cmms_id = obj.get("cmms_work_order_id").and_then(Value::as_str);
        let equipment = obj.get("equipment_name").and_then(Value::as_str);
        return match (cmms_id, equipment) {
            (Some(cmms_id), Some(equipment)) if !cmms_id.is_empty() && !equipment.is_empty() => {
                format!("maintenance {cmms_id} ({equipment})")
            }
            (Some(cmms_id), _) if !cmms_id.is_empty() => format!("maintenance {cmms_id}"),
            _ => "maintenance".to_string(),
        };
    }
    if matches!(kind, Some("pick") | Some("putaway") | Some("move")) {
        let kind = kind.unwrap_or_default();
        let sku = obj.get("sku").and_then(Value::as_str);
        let qty = obj.get("quantity").and_then(Value::as_f64);
        let from = obj.get("from_location_id").and_then(Value::as_str).unwrap_or_default();
        let to = obj.get("to_location_id").and_then(Value::as_str).unwrap_or_default();
        return match (sku, qty) {
            (Some(sku), Some(qty)) if !sku.is_empty() && qty > 0.0 => {
                format!("{kind} {sku} \u{d7} {qty:.0} ({from} \u{2192} {to})")
            }
            _ => kind.to_string(),
        };
    }
    if let Some(sku) = obj.get("sku").and_then(Value::as_str) {
        let qty = obj.get("quantity").and_then(Value::as_f64).unwrap_or(0.0);
        return if qty > 0.0 { format!("{sku} \u{d7} {qty:.0}") } else { sku.to_string() };
    }
    payload.to_string()
}

async fn list_work_orders(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut list = state.recent.lock().expect("recent orders lock poisoned").clone();
    list.reverse();
    Json(serde_json::json!({ "work_orders": list }))
}

#[derive(Deserialize, Default)]
struct FirmwareSimulateRequest {
    #[serde(default)]
    seed_busy: u32,
}

async fn simulate_firmware(
    State(state): State<Arc<AppState>>,
    body: Option<Json<FirmwareSimulateRequest>>,
) -> axum::response::Response {
    let seed_busy = body.map(|Json(req)| req.seed_busy).unwrap_or_default();
    match state.fleet.trigger_firmware_campaign(seed_busy).await {
        Ok(outcome) => {
            add_recent(&state, &outcome.order);
            let mut resp = serde_json::json!({
                "ok": true,
                "message": outcome.message,
                "order_id": outcome.order.id.to_string(),
                "target": outcome.target,
                "campaign_id": outcome.campaign.id.to_string(),
                "campaign_status": outcome.campaign.status,
            });
            if seed_busy > 0 {
                resp["seed_busy"] = serde_json::json!(seed_busy);
            }
            (StatusCode::CREATED, Json(resp)).into_response()
        }
        Err(err) => error_response(&err),
    }
}

async fn get_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let areas: Vec<AreaSummary> = state.fleet.get_all_areas();
    let total = state.fleet.total_robots();
    Json(serde_json::json!({ "areas": areas, "total_robots": total }))
}

async fn get_state_areas(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let areas: Vec<AreaSummary> = state.fleet.get_all_areas();
    Json(serde_json::json!({ "areas": areas }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_summary_handles_firmware_update() {
        let payload = serde_json::json!({"type": "firmware_update", "version": "2.0.0"});
        assert_eq!(payload_summary(&payload), "firmware 2.0.0");
    }

    #[test]
    fn payload_summary_handles_pick_with_quantities() {
        let payload = serde_json::json!({
            "type": "pick", "sku": "SCOOTER-001", "quantity": 1000.0,
            "from_location_id": "A1", "to_location_id": "B2",
        });
        assert_eq!(payload_summary(&payload), "pick SCOOTER-001 \u{d7} 1000 (A1 \u{2192} B2)");
    }

    #[test]
    fn payload_summary_handles_generic_sku() {
        let payload = serde_json::json!({"sku": "WIDGET", "quantity": 5.0});
        assert_eq!(payload_summary(&payload), "WIDGET \u{d7} 5");
    }

    #[test]
    fn payload_summary_falls_back_for_empty_payload() {
        assert_eq!(payload_summary(&Value::Null), "\u{2014}");
    }
}

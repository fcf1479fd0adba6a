use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tracing::info;

use runout_watch::PinLevel;

use crate::AppState;

/// Liveness probe.
pub async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "alive" }))
}

/// Sensor status: "-1" disabled, "0" filament out, "1" filament present.
pub async fn status_handler(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, StatusCode> {
    let status = state
        .watch
        .status()
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(Json(serde_json::json!({ "status": status.as_str() })))
}

/// Session events forwarded from the host runtime's event bus.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostEvent {
    PrintStarted,
    PrintStopped,
    LayerChange,
}

#[derive(Debug, Deserialize)]
pub struct EventBody {
    pub event: HostEvent,
}

pub async fn event_handler(
    State(state): State<AppState>,
    Json(body): Json<EventBody>,
) -> Result<StatusCode, StatusCode> {
    let result = match body.event {
        HostEvent::PrintStarted => state.watch.print_started().await,
        HostEvent::PrintStopped => state.watch.print_stopped().await,
        HostEvent::LayerChange => state.watch.layer_change().await,
    };
    result.map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct SensorBody {
    /// 0 = filament out, 1 = filament present.
    pub level: u8,
}

/// Drive the simulated sensor, for exercising the daemon without hardware.
pub async fn sensor_handler(
    State(state): State<AppState>,
    Json(body): Json<SensorBody>,
) -> Result<StatusCode, StatusCode> {
    let level = match body.level {
        0 => PinLevel::Low,
        1 => PinLevel::High,
        _ => return Err(StatusCode::UNPROCESSABLE_ENTITY),
    };
    info!(level = body.level, "simulated sensor level set");
    state.sensor.set_level(level);
    Ok(StatusCode::NO_CONTENT)
}

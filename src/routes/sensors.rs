//! Sensor and pump routes
//!
//! - GET  /api/moisture, /api/plant-watering/moisture
//! - GET  /api/gas, /api/temperature, /api/humidity, /api/flame
//! - POST /api/water         `{"state": "on" | "off"}`
//! - POST /api/pump-control  `{"action": "on" | "off"}`
//!
//! Readings come back as `{"<sensor>": <value>}` with the value exactly as
//! the IoT cloud reported it.

use bytes::Bytes;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::routes::response::{
    error_response, json_response, parse_json_body, BodyError, BoxBody,
};
use crate::server::AppState;
use crate::services::{PumpState, Sensor};
use crate::types::HubError;

/// Which body field carries the pump state
#[derive(Debug, Clone, Copy)]
pub enum PumpField {
    /// `/api/water`
    State,
    /// `/api/pump-control`
    Action,
}

#[derive(Debug, Deserialize)]
struct PumpRequest {
    state: Option<String>,
    action: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PumpResponse {
    pub message: String,
    pub state: String,
}

/// GET a single sensor reading
pub async fn handle_sensor(sensor: Sensor, state: Arc<AppState>) -> Response<BoxBody> {
    match state.gateway.read(sensor).await {
        Ok(reading) => {
            let mut body = serde_json::Map::new();
            body.insert(sensor.key().to_string(), reading.value().clone());
            json_response(StatusCode::OK, &body)
        }
        Err(e) => error_response(&format!("Error fetching {}", sensor.key()), e),
    }
}

/// POST a pump state change
pub async fn handle_pump<B>(
    req: Request<B>,
    state: Arc<AppState>,
    field: PumpField,
) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BodyError>,
{
    let body: PumpRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response("Pump request rejected", e),
    };

    let (raw, name) = match field {
        PumpField::State => (body.state, "state"),
        PumpField::Action => (body.action, "action"),
    };

    let pump_state = match raw
        .ok_or_else(|| HubError::BadRequest(format!("Missing required field: {}", name)))
        .and_then(|raw| PumpState::parse(&raw))
    {
        Ok(s) => s,
        Err(e) => return error_response("Pump request rejected", e),
    };

    match state.gateway.set_pump(pump_state).await {
        Ok(ack) => {
            info!(state = pump_state.as_str(), ack = %ack, "Water pump state updated");
            json_response(
                StatusCode::OK,
                &PumpResponse {
                    message: "Water pump state updated".into(),
                    state: pump_state.as_str().into(),
                },
            )
        }
        Err(e) => error_response("Error updating water pump state", e),
    }
}

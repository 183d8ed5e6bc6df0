//! Liveness probe (/health, /healthz)
//!
//! Always 200 while the process is serving. The body reports which store and
//! IoT provider are wired in; it does not call either of them.

use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::routes::response::{json_response, BoxBody};
use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub healthy: bool,
    pub version: String,
    pub commit: String,
    pub built_at: String,
    /// Seconds since the server started
    pub uptime: u64,
    pub timestamp: String,
    /// `mongodb` or `memory`
    pub store: String,
    /// `blynk` or `thingspeak`
    pub provider: String,
    pub password_policy: String,
    pub mode: String,
}

fn build_health_response(state: &AppState) -> HealthResponse {
    HealthResponse {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: env!("GIT_COMMIT_SHORT").to_string(),
        built_at: env!("BUILD_TIMESTAMP").to_string(),
        uptime: state.started_at.elapsed().as_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        store: state.credentials.store_kind().to_string(),
        provider: state.gateway.provider_name().to_string(),
        password_policy: format!("{:?}", state.args.password_policy).to_lowercase(),
        mode: if state.args.dev_mode {
            "development".to_string()
        } else {
            "production".to_string()
        },
    }
}

pub fn health_check(state: Arc<AppState>) -> Response<BoxBody> {
    json_response(StatusCode::OK, &build_health_response(&state))
}

//! Response helpers shared by every route
//!
//! All bodies are JSON. Errors use one shape: `{"error": "...", "code": "..."}`.

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::types::HubError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Largest request body accepted, in bytes
pub const MAX_BODY_BYTES: usize = 10 * 1024;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .body(full_body(json))
        .unwrap()
}

/// Turn a domain error into the JSON error contract
///
/// Server-side failures are logged with their details; the client only sees
/// the public message.
pub fn error_response(context: &str, err: HubError) -> Response<BoxBody> {
    let status = err.status_code();
    if status.is_server_error() {
        error!("{}: {}", context, err);
    } else {
        warn!("{}: {}", context, err);
    }

    json_response(
        status,
        &ErrorResponse {
            error: err.public_message(),
            code: Some(err.code().to_string()),
        },
    )
}

pub fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type")
        .header("Access-Control-Max-Age", "86400")
        .body(full_body(Bytes::new()))
        .unwrap()
}

pub fn not_found(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &ErrorResponse {
            error: format!("No route for {}", path),
            code: Some("ROUTE_NOT_FOUND".into()),
        },
    )
}

pub fn method_not_allowed() -> Response<BoxBody> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorResponse {
            error: "Method not allowed".into(),
            code: None,
        },
    )
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Error type of request bodies the router accepts
pub type BodyError = Box<dyn std::error::Error + Send + Sync>;

/// Read and decode a JSON request body
///
/// Reading stops once more than `MAX_BODY_BYTES` have arrived.
pub async fn parse_json_body<T, B>(req: Request<B>) -> Result<T, HubError>
where
    T: for<'de> Deserialize<'de>,
    B: Body<Data = Bytes>,
    B::Error: Into<BodyError>,
{
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                HubError::BadRequest("Request body too large".into())
            } else {
                HubError::BadRequest(format!("Failed to read body: {}", e))
            }
        })?;

    let bytes = body.to_bytes();
    serde_json::from_slice(&bytes).map_err(|e| HubError::BadRequest(format!("Invalid JSON: {}", e)))
}

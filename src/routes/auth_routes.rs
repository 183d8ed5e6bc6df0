//! HTTP routes for authentication
//!
//! - POST /login    - check email and password, return the stored user
//! - POST /register - create a user
//!
//! No token or session is issued; every other route is unauthenticated.

use bytes::Bytes;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::schemas::UserView;
use crate::routes::response::{
    error_response, json_response, parse_json_body, BodyError, BoxBody,
};
use crate::server::AppState;
use crate::types::HubError;

// =============================================================================
// Request/Response Types
// =============================================================================

/// Body of `/login` and `/register`
#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl CredentialsRequest {
    fn require_fields(&self) -> Result<(), HubError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(HubError::BadRequest(
                "Missing required fields: email, password".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub message: String,
    pub user: UserView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user: UserView,
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /login
///
/// 404 for an unknown email, 401 for a wrong password.
pub async fn handle_login<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BodyError>,
{
    let body: CredentialsRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response("Login rejected", e),
    };

    if let Err(e) = body.require_fields() {
        return error_response("Login rejected", e);
    }

    match state.credentials.login(&body.email, &body.password).await {
        Ok(user) => json_response(
            StatusCode::OK,
            &LoginResponse {
                message: "Success".into(),
                user: user.view(),
            },
        ),
        Err(e) => error_response("Error logging in", e),
    }
}

/// POST /register
///
/// A second registration with the same email fails with 500 and code
/// `DUPLICATE_EMAIL`.
pub async fn handle_register<B>(req: Request<B>, state: Arc<AppState>) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BodyError>,
{
    let body: CredentialsRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return error_response("Registration rejected", e),
    };

    if let Err(e) = body.require_fields() {
        return error_response("Registration rejected", e);
    }

    match state.credentials.register(&body.email, &body.password).await {
        Ok(user) => json_response(StatusCode::OK, &RegisterResponse { user: user.view() }),
        Err(e) => error_response("Error registering user", e),
    }
}

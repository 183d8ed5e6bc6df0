//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo; one spawned task per connection.

use bytes::Bytes;
use hyper::body::{Body, Incoming};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::auth::PasswordVerifier;
use crate::config::{Args, Provider};
use crate::db::UserStore;
use crate::routes::{self, BodyError, BoxBody, PumpField};
use crate::services::{
    build_http_client, BlynkProvider, CredentialService, Sensor, SensorGateway, SensorProvider,
    ThingSpeakProvider,
};
use crate::types::HubError;

/// Shared application state
///
/// Built once in `main` and handed to every request; nothing in it is
/// mutated after startup.
pub struct AppState {
    pub args: Args,
    /// Login and registration
    pub credentials: CredentialService,
    /// Sensor reads and pump writes
    pub gateway: SensorGateway,
    pub started_at: Instant,
}

impl AppState {
    /// Assemble state from an explicit store and provider
    pub fn new(args: Args, store: Arc<dyn UserStore>, provider: Arc<dyn SensorProvider>) -> Self {
        let verifier = PasswordVerifier::new(args.password_policy);

        Self {
            args,
            credentials: CredentialService::new(store, verifier),
            gateway: SensorGateway::new(provider),
            started_at: Instant::now(),
        }
    }

    /// Assemble state with the provider selected by configuration
    pub fn from_args(args: Args, store: Arc<dyn UserStore>) -> Result<Self, HubError> {
        let client = build_http_client(args.upstream_timeout_ms.map(Duration::from_millis))?;

        let provider: Arc<dyn SensorProvider> = match args.provider {
            Provider::Blynk => Arc::new(BlynkProvider::from_args(&args.blynk, client)?),
            Provider::ThingSpeak => {
                Arc::new(ThingSpeakProvider::from_args(&args.thingspeak, client)?)
            }
        };

        Ok(Self::new(args, store, provider))
    }
}

/// Start the HTTP server; returns after Ctrl+C or SIGTERM
pub async fn run(state: Arc<AppState>) -> Result<(), HubError> {
    let listen = state.args.listen();
    let listener = TcpListener::bind(listen).await?;

    info!("Server is running on http://{}", listen);

    if state.args.dev_mode {
        warn!("Development mode enabled");
    }

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            error!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => {
                info!("Server shutting down...");
                break;
            }
        }
    }

    Ok(())
}

async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, hyper::Error> {
    info!("[{}] {} {}", addr, req.method(), req.uri().path());
    Ok(route(state, req).await)
}

/// Paths served by the router, for 405 vs 404
const KNOWN_PATHS: &[&str] = &[
    "/health",
    "/healthz",
    "/login",
    "/register",
    "/api/moisture",
    "/api/plant-watering/moisture",
    "/api/water",
    "/api/pump-control",
    "/api/gas",
    "/api/temperature",
    "/api/humidity",
    "/api/flame",
];

/// Dispatch one request to its handler
pub async fn route<B>(state: Arc<AppState>, req: Request<B>) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BodyError>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match (method, path.as_str()) {
        // CORS preflight
        (Method::OPTIONS, _) => routes::cors_preflight(),

        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(state),

        // Credentials
        (Method::POST, "/login") => routes::handle_login(req, state).await,
        (Method::POST, "/register") => routes::handle_register(req, state).await,

        // Plant watering
        (Method::GET, "/api/moisture") | (Method::GET, "/api/plant-watering/moisture") => {
            routes::handle_sensor(Sensor::Moisture, state).await
        }
        (Method::POST, "/api/water") => routes::handle_pump(req, state, PumpField::State).await,
        (Method::POST, "/api/pump-control") => {
            routes::handle_pump(req, state, PumpField::Action).await
        }

        // Gas, temperature, humidity and flame monitoring
        (Method::GET, "/api/gas") => routes::handle_sensor(Sensor::Gas, state).await,
        (Method::GET, "/api/temperature") => {
            routes::handle_sensor(Sensor::Temperature, state).await
        }
        (Method::GET, "/api/humidity") => routes::handle_sensor(Sensor::Humidity, state).await,
        (Method::GET, "/api/flame") => routes::handle_sensor(Sensor::Flame, state).await,

        (_, p) if KNOWN_PATHS.contains(&p) => routes::method_not_allowed(),

        _ => routes::not_found(&path),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! homesense - home IoT dashboard backend

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use homesense::{
    config::Args,
    db::{MemoryUserStore, MongoClient, MongoUserStore, UserStore},
    server::{self, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("homesense={},info", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  homesense - home IoT dashboard");
    info!("======================================");
    info!("Listen: {}", args.listen());
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db: {})", args.mongo_uri, args.mongo_db);
    info!("Password policy: {:?}", args.password_policy);
    info!("IoT provider: {}", args.provider.as_str());
    if let Some(ms) = args.upstream_timeout_ms {
        info!("Upstream timeout: {}ms", ms);
    }
    info!("======================================");

    // Connect to MongoDB (in-memory fallback in dev mode)
    let store: Arc<dyn UserStore> = match connect_store(&args).await {
        Ok(store) => {
            info!("MongoDB connected successfully");
            Arc::new(store)
        }
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory users): {}", e);
                Arc::new(MemoryUserStore::new())
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    let state = AppState::from_args(args, store)?;
    info!("Sensor provider ready: {}", state.gateway.provider_name());

    server::run(Arc::new(state)).await?;

    info!("homesense stopped");
    Ok(())
}

async fn connect_store(args: &Args) -> homesense::Result<MongoUserStore> {
    let mongo = MongoClient::new(&args.mongo_uri, &args.mongo_db).await?;
    MongoUserStore::new(&mongo).await
}

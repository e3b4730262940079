use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use vidtube_api::auth::{AppState, AppStateInner};
use vidtube_api::media::MediaClient;
use vidtube_api::routes::router;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "dev-secret-change-me", "secret"];

struct Config {
    jwt_secret: String,
    db_path: PathBuf,
    addr: SocketAddr,
    media_url: Option<String>,
    media_api_key: Option<String>,
    token_ttl_days: i64,
}

impl Config {
    fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("VIDTUBE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("VIDTUBE_JWT_SECRET is unset or still a placeholder");
        }

        let db_path = std::env::var("VIDTUBE_DB_PATH").unwrap_or_else(|_| "vidtube.db".into());
        let host = std::env::var("VIDTUBE_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = std::env::var("VIDTUBE_PORT")
            .unwrap_or_else(|_| "8000".into())
            .parse()
            .context("VIDTUBE_PORT must be a port number")?;
        let token_ttl_days: i64 = std::env::var("VIDTUBE_TOKEN_TTL_DAYS")
            .ok()
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("VIDTUBE_TOKEN_TTL_DAYS must be a number of days")?
            .unwrap_or(30);

        Ok(Self {
            jwt_secret,
            db_path: db_path.into(),
            addr: format!("{}:{}", host, port).parse()?,
            media_url: std::env::var("VIDTUBE_MEDIA_URL").ok().filter(|v| !v.is_empty()),
            media_api_key: std::env::var("VIDTUBE_MEDIA_API_KEY").ok().filter(|v| !v.is_empty()),
            token_ttl_days,
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidtube_server=debug,vidtube_api=debug,vidtube_db=info,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    let db = vidtube_db::Database::open(&config.db_path)?;
    let media = MediaClient::new(config.media_url.as_deref(), config.media_api_key)?;
    if config.media_url.is_none() {
        warn!("VIDTUBE_MEDIA_URL not set, media objects will not be released on delete");
    }

    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: config.jwt_secret,
        token_ttl_days: config.token_ttl_days,
        media,
    });

    let app = router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("VidTube server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

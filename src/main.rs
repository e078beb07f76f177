mod config;
mod db;
mod error;
mod media;
mod presence;
mod routes;
mod state;
mod utils {
    pub mod clock;
    pub mod sweep;
}

use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use sqlx::SqlitePool;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, trace::TraceLayer};

use crate::config::{Config, MediaConfig};
use crate::media::{HostedMedia, LocalMedia, MediaStore};
use crate::presence::Presence;
use crate::state::PresenceStore;
use crate::utils::{clock::{SharedClock, SystemClock}, sweep};

const BODY_LIMIT: usize = 20 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().init();

    let cfg = Config::from_env()?;
    let clock: SharedClock = Arc::new(SystemClock);

    let pool = SqlitePool::connect(&cfg.database_url).await
        .with_context(|| format!("opening {}", cfg.database_url))?;
    db::init(&pool).await.context("creating schema")?;

    let media = match cfg.media {
        MediaConfig::Local { dir } => {
            tracing::info!(dir = %dir.display(), "storing uploads locally");
            MediaStore::Local(LocalMedia::new(dir))
        }
        MediaConfig::Hosted { upload_url, preset, api_key } => {
            tracing::info!(%upload_url, "storing uploads on media host");
            MediaStore::Hosted(HostedMedia::new(upload_url, preset, api_key)?)
        }
    };

    let store = PresenceStore::new();
    tokio::spawn(sweep::task(store.clone(), clock.clone()));  // 啟動清道夫

    let app = routes::app(Presence::new(store, clock.clone()), pool, media, clock)
        .fallback_service(ServeDir::new("static"))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await
        .with_context(|| format!("binding {}", cfg.bind_addr))?;
    tracing::info!(addr = %cfg.bind_addr, "listening");
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

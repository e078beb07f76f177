use axum::{Extension, Router};
use sqlx::SqlitePool;
use tower_http::services::ServeDir;

use crate::{media::MediaStore, presence::Presence, utils::clock::SharedClock};

pub mod photos;
pub mod presence;

pub fn router() -> Router {
    Router::new()
        .nest("/api", presence::router().merge(photos::router()))
}

/// API routes with their shared state attached. Local uploads are served
/// from wherever they were written.
pub fn app(presence: Presence, pool: SqlitePool, media: MediaStore, clock: SharedClock) -> Router {
    let routes = match &media {
        MediaStore::Local(local) => router().nest_service("/uploads", ServeDir::new(local.dir())),
        MediaStore::Hosted(_)    => router(),
    };
    routes
        .layer(Extension(presence))
        .layer(Extension(pool))
        .layer(Extension(media))
        .layer(Extension(clock))
}

use axum::{
    extract::{multipart::Multipart, Extension, Json, Path},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use bytes::{Bytes, BytesMut};
use futures_util::stream::StreamExt;
use serde_json::{json, Value};
use sqlx::SqlitePool;

use crate::{
    db::{self, Photo},
    error::{bad, required, AppResult},
    media::MediaStore,
    utils::clock::SharedClock,
};

pub fn router() -> Router {
    Router::new()
        .route("/photos",            post(upload_photo))
        .route("/photos/:room_name", get(list_photos))
}

/* 圖片欄位：內容 + MIME */
struct Image {
    data: Bytes,
    mime: String,
}

pub async fn upload_photo(
    Extension(media): Extension<MediaStore>,
    Extension(pool): Extension<SqlitePool>,
    Extension(clock): Extension<SharedClock>,
    mut mp: Multipart,
) -> AppResult<(StatusCode, Json<Photo>)> {
    let (mut room, mut user, mut image) = (None, None, None);

    while let Some(mut field) = mp.next_field().await.map_err(bad)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("roomName") => room = Some(field.text().await.map_err(bad)?),
            Some("username") => user = Some(field.text().await.map_err(bad)?),
            Some("image") => {
                let mime = field.content_type().map(str::to_owned)
                    .or_else(|| field.file_name()
                        .and_then(|f| mime_guess::from_path(f).first())
                        .map(|m| m.essence_str().to_owned()))
                    .unwrap_or_else(|| "application/octet-stream".into());

                let mut buf = BytesMut::new();
                while let Some(chunk) = field.next().await {
                    let chunk: Bytes = chunk.map_err(bad)?;
                    buf.extend_from_slice(&chunk);
                }
                image = Some(Image { data: buf.freeze(), mime });
            }
            _ => {}
        }
    }

    let room = required(room.as_deref(), "roomName")?;
    let user = required(user.as_deref(), "username")?;
    let image = image.filter(|i| !i.data.is_empty()).ok_or_else(|| bad("image is required"))?;
    if !image.mime.starts_with("image/") {
        return Err(bad(format!("unsupported file type {}", image.mime)));
    }

    let size = image.data.len();
    let stored = media.upload(image.data, &image.mime).await?;
    let photo = db::save_photo(&pool, &stored.url, &stored.public_id, room, user, clock.now_ms()).await?;
    tracing::info!(%room, %user, size, url = %photo.image_url, "photo uploaded");

    Ok((StatusCode::CREATED, Json(photo)))
}

async fn list_photos(
    Extension(pool): Extension<SqlitePool>,
    Path(room_name): Path<String>,
) -> AppResult<Json<Value>> {
    let photos = db::find_photos_by_room(&pool, &room_name).await?;
    Ok(Json(json!({ "roomName": room_name, "photos": photos })))
}

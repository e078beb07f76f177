use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::utils::clock::Millis;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    pub id:         String,
    pub image_url:  String,
    pub public_id:  String,
    pub room_name:  String,
    pub username:   String,
    pub created_at: Millis,
}

pub async fn init(pool: &SqlitePool) -> sqlx::Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS photos (
            id         TEXT PRIMARY KEY,
            image_url  TEXT NOT NULL,
            public_id  TEXT NOT NULL,
            room_name  TEXT NOT NULL,
            username   TEXT NOT NULL,
            created_at INTEGER NOT NULL
        )",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS photos_room_created ON photos (room_name, created_at)")
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn save_photo(
    pool: &SqlitePool,
    image_url: &str,
    public_id: &str,
    room_name: &str,
    username: &str,
    now: Millis,
) -> sqlx::Result<Photo> {
    let photo = Photo {
        id:         uuid::Uuid::new_v4().to_string(),
        image_url:  image_url.into(),
        public_id:  public_id.into(),
        room_name:  room_name.into(),
        username:   username.into(),
        created_at: now,
    };

    sqlx::query("INSERT INTO photos (id, image_url, public_id, room_name, username, created_at) VALUES (?,?,?,?,?,?)")
        .bind(&photo.id)
        .bind(&photo.image_url)
        .bind(&photo.public_id)
        .bind(&photo.room_name)
        .bind(&photo.username)
        .bind(photo.created_at)
        .execute(pool)
        .await?;

    Ok(photo)
}

/// Newest first.
pub async fn find_photos_by_room(pool: &SqlitePool, room_name: &str) -> sqlx::Result<Vec<Photo>> {
    sqlx::query_as(
        "SELECT id, image_url, public_id, room_name, username, created_at
           FROM photos WHERE room_name = ?
          ORDER BY created_at DESC, rowid DESC",
    )
    .bind(room_name)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
pub async fn memory_pool() -> SqlitePool {
    // one connection, otherwise every pooled connection gets its own empty database
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    init(&pool).await.unwrap();
    pool
}

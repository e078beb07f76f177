use axum::{
    extract::{rejection::JsonRejection, Extension, Json, Path},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{
    error::{bad, AppResult},
    presence::{Presence, RoomActivity},
};

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresenceInput {
    room_name: Option<String>,
    username:  Option<String>,
}

impl PresenceInput {
    /// A request without a JSON body carries no fields; a body that does not
    /// parse is a bad request like any other invalid input.
    fn from_body(body: Result<Json<Self>, JsonRejection>) -> AppResult<Self> {
        match body {
            Ok(Json(p)) => Ok(p),
            Err(JsonRejection::MissingJsonContentType(_)) => Ok(Self::default()),
            Err(e) => Err(bad(e.body_text())),
        }
    }

    fn parts(&self) -> (Option<&str>, Option<&str>) {
        (self.room_name.as_deref(), self.username.as_deref())
    }
}

pub fn router() -> Router {
    Router::new()
        .route("/rooms/join",              post(join))
        .route("/rooms/heartbeat",         post(heartbeat))
        .route("/rooms/leave",             post(leave))
        .route("/rooms/:room_name/active", get(list_active))
}

async fn join(
    Extension(presence): Extension<Presence>,
    body: Result<Json<PresenceInput>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let p = PresenceInput::from_body(body)?;
    let (room, user) = p.parts();
    let active = presence.join(room, user).await?;
    Ok(Json(json!({
        "message": format!("Joined room {}", room.unwrap_or_default()),
        "activeUsers": active,
    })))
}

async fn heartbeat(
    Extension(presence): Extension<Presence>,
    body: Result<Json<PresenceInput>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let p = PresenceInput::from_body(body)?;
    let (room, user) = p.parts();
    let active = presence.heartbeat(room, user).await?;
    Ok(Json(json!({ "activeUsers": active })))
}

async fn list_active(
    Extension(presence): Extension<Presence>,
    Path(room_name): Path<String>,
) -> Json<RoomActivity> {
    Json(presence.list_active(&room_name).await)
}

async fn leave(
    Extension(presence): Extension<Presence>,
    body: Result<Json<PresenceInput>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let p = PresenceInput::from_body(body)?;
    let (room, user) = p.parts();
    presence.leave(room, user).await?;
    Ok(Json(json!({ "message": "Left room" })))
}

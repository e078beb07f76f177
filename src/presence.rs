//! Join / heartbeat / list / leave over the presence store.

use serde::Serialize;

use crate::{
    error::{required, AppResult},
    state::{ActiveUser, PresenceStore},
    utils::clock::SharedClock,
};

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomActivity {
    pub room_name:         String,
    pub active_user_count: usize,
    pub users:             Vec<ActiveUser>,
}

#[derive(Clone)]
pub struct Presence {
    store: PresenceStore,
    clock: SharedClock,
}

impl Presence {
    pub fn new(store: PresenceStore, clock: SharedClock) -> Self {
        Self { store, clock }
    }

    pub async fn join(&self, room: Option<&str>, member: Option<&str>) -> AppResult<Vec<ActiveUser>> {
        let (room, member) = validate(room, member)?;
        self.store.upsert(room, member, self.clock.now_ms()).await;
        tracing::info!(%room, %member, "joined room");
        Ok(self.store.list(room).await)
    }

    /// Same as `join`: an unknown member is silently (re)created.
    pub async fn heartbeat(&self, room: Option<&str>, member: Option<&str>) -> AppResult<Vec<ActiveUser>> {
        let (room, member) = validate(room, member)?;
        self.store.upsert(room, member, self.clock.now_ms()).await;
        tracing::debug!(%room, %member, "heartbeat");
        Ok(self.store.list(room).await)
    }

    pub async fn list_active(&self, room: &str) -> RoomActivity {
        let users = self.store.list(room).await;
        RoomActivity {
            room_name:         room.to_owned(),
            active_user_count: users.len(),
            users,
        }
    }

    pub async fn leave(&self, room: Option<&str>, member: Option<&str>) -> AppResult<()> {
        let (room, member) = validate(room, member)?;
        if self.store.remove(room, member).await {
            tracing::info!(%room, %member, "left room");
        }
        Ok(())
    }
}

fn validate<'a>(room: Option<&'a str>, member: Option<&'a str>) -> AppResult<(&'a str, &'a str)> {
    Ok((required(room, "roomName")?, required(member, "username")?))
}

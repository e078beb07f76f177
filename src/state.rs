use std::{collections::HashMap, sync::Arc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::utils::clock::Millis;

/* ------------ 房間在線名單 ------------ */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Membership {
    pub joined_at: Millis,
    pub last_seen: Millis,
}

/// Request-scoped copy of a membership, as it goes out on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveUser {
    pub username:  String,
    pub joined_at: Millis,
    pub last_seen: Millis,
}

type Rooms = HashMap<String, HashMap<String, Membership>>;   // room -> member -> record

/// Process-wide presence registry. Clones share the same map; a room key
/// exists only while it holds at least one member.
#[derive(Clone, Default)]
pub struct PresenceStore {
    rooms: Arc<Mutex<Rooms>>,
}

impl PresenceStore {
    pub fn new() -> Self { Self::default() }

    pub async fn upsert(&self, room: &str, member: &str, now: Millis) {
        let mut rooms = self.rooms.lock().await;
        rooms.entry(room.to_owned())
            .or_default()
            .entry(member.to_owned())
            .and_modify(|m| m.last_seen = m.last_seen.max(now))
            .or_insert(Membership { joined_at: now, last_seen: now });
    }

    /// Returns whether the member was present.
    pub async fn remove(&self, room: &str, member: &str) -> bool {
        let mut rooms = self.rooms.lock().await;
        let Some(members) = rooms.get_mut(room) else { return false };
        let removed = members.remove(member).is_some();
        if members.is_empty() {
            rooms.remove(room);
        }
        removed
    }

    /// Members ordered by join time, then name.
    pub async fn list(&self, room: &str) -> Vec<ActiveUser> {
        let rooms = self.rooms.lock().await;
        let mut users: Vec<ActiveUser> = rooms.get(room)
            .map(|members| members.iter()
                .map(|(name, m)| ActiveUser {
                    username:  name.clone(),
                    joined_at: m.joined_at,
                    last_seen: m.last_seen,
                })
                .collect())
            .unwrap_or_default();
        users.sort_by(|a, b| a.joined_at.cmp(&b.joined_at).then_with(|| a.username.cmp(&b.username)));
        users
    }

    /// Evicts every member idle for longer than `timeout`, then drops empty rooms.
    pub async fn sweep(&self, now: Millis, timeout: Millis) {
        let mut rooms = self.rooms.lock().await;
        rooms.retain(|room, members| {
            members.retain(|name, m| {
                let fresh = now - m.last_seen <= timeout;
                if !fresh {
                    tracing::info!(%room, member = %name, last_seen = m.last_seen, "evicted stale member");
                }
                fresh
            });
            if members.is_empty() {
                tracing::debug!(%room, "room emptied by sweep");
            }
            !members.is_empty()
        });
    }

    #[cfg(test)]
    pub async fn has_room(&self, room: &str) -> bool {
        self.rooms.lock().await.contains_key(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn upsert_keeps_first_join_and_latest_seen() {
        let store = PresenceStore::new();
        store.upsert("lobby", "alice", 100).await;
        store.upsert("lobby", "alice", 250).await;
        store.upsert("lobby", "alice", 900).await;

        let users = store.list("lobby").await;
        assert_eq!(users, vec![ActiveUser { username: "alice".into(), joined_at: 100, last_seen: 900 }]);
    }

    #[tokio::test]
    async fn last_seen_never_moves_backwards() {
        let store = PresenceStore::new();
        store.upsert("lobby", "alice", 500).await;
        store.upsert("lobby", "alice", 200).await;

        let alice = &store.list("lobby").await[0];
        assert_eq!((alice.joined_at, alice.last_seen), (500, 500));
    }

    #[tokio::test]
    async fn member_names_are_case_sensitive() {
        let store = PresenceStore::new();
        store.upsert("lobby", "Alice", 1).await;
        store.upsert("lobby", "alice", 2).await;

        let names: Vec<_> = store.list("lobby").await.into_iter().map(|u| u.username).collect();
        assert_eq!(names, ["Alice", "alice"]);
    }

    #[tokio::test]
    async fn remove_drops_room_with_last_member() {
        let store = PresenceStore::new();
        store.upsert("lobby", "alice", 0).await;
        store.upsert("lobby", "bob", 0).await;

        assert!(store.remove("lobby", "alice").await);
        assert!(store.has_room("lobby").await);
        assert!(store.remove("lobby", "bob").await);
        assert!(!store.has_room("lobby").await);
    }

    #[tokio::test]
    async fn remove_unknown_is_noop() {
        let store = PresenceStore::new();
        assert!(!store.remove("nowhere", "alice").await);

        store.upsert("lobby", "alice", 0).await;
        assert!(!store.remove("lobby", "bob").await);
        assert_eq!(store.list("lobby").await.len(), 1);
    }

    #[tokio::test]
    async fn list_unknown_room_is_empty() {
        assert!(PresenceStore::new().list("ghost").await.is_empty());
    }

    #[tokio::test]
    async fn sweep_evicts_only_past_timeout() {
        let store = PresenceStore::new();
        let t = 10_000;
        store.upsert("lobby", "alice", t).await;

        store.sweep(t + 44_000, 45_000).await;
        assert_eq!(store.list("lobby").await.len(), 1);

        store.sweep(t + 45_000, 45_000).await;
        assert_eq!(store.list("lobby").await.len(), 1);

        store.sweep(t + 46_000, 45_000).await;
        assert!(store.list("lobby").await.is_empty());
        assert!(!store.has_room("lobby").await);
    }

    #[tokio::test]
    async fn sweep_keeps_fresh_members_and_their_room() {
        let store = PresenceStore::new();
        store.upsert("lobby", "alice", 0).await;
        store.upsert("lobby", "bob", 40_000).await;
        store.upsert("attic", "carol", 0).await;

        store.sweep(50_000, 45_000).await;

        let names: Vec<_> = store.list("lobby").await.into_iter().map(|u| u.username).collect();
        assert_eq!(names, ["bob"]);
        assert!(!store.has_room("attic").await);
    }

    #[tokio::test]
    async fn concurrent_joins_are_not_lost() {
        let store = PresenceStore::new();
        let handles: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.upsert("lobby", &format!("user{i}"), i).await })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(store.list("lobby").await.len(), 32);
    }
}

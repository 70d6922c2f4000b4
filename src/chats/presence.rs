//! In-memory registry of who is currently in which room.
//!
//! Keyed by user id, so a rejoin (reconnect after a network blip, or
//! switching rooms) replaces the prior entry instead of duplicating it.
//! Entries live only as long as the process; nothing here is persisted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub name: String,
    pub room_id: String,
    pub email: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct Presence {
    inner: Arc<Mutex<HashMap<String, Participant>>>,
}

impl Presence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert-or-replace by user id; returns the stored entry.
    pub fn join(&self, participant: Participant) -> Participant {
        let mut entries = self.inner.lock().unwrap();
        entries.insert(participant.user_id.clone(), participant.clone());
        participant
    }

    pub fn members_of(&self, room_id: &str) -> Vec<Participant> {
        let entries = self.inner.lock().unwrap();
        entries
            .values()
            .filter(|participant| participant.room_id == room_id)
            .cloned()
            .collect()
    }

    /// No-op when absent: disconnects can race explicit leaves.
    pub fn leave(&self, user_id: &str) {
        let mut entries = self.inner.lock().unwrap();
        entries.remove(user_id);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(user_id: &str, room_id: &str) -> Participant {
        Participant {
            name: format!("name-{user_id}"),
            room_id: room_id.to_owned(),
            email: format!("{user_id}@example.com"),
            user_id: user_id.to_owned(),
        }
    }

    #[test]
    fn rejoin_replaces_instead_of_duplicating() {
        let presence = Presence::new();
        presence.join(participant("u1", "r1"));
        presence.join(participant("u1", "r2"));

        assert_eq!(presence.len(), 1);
        assert!(presence.members_of("r1").is_empty());
        assert_eq!(presence.members_of("r2").len(), 1);
        assert_eq!(presence.members_of("r2")[0].room_id, "r2");
    }

    #[test]
    fn members_of_filters_by_room() {
        let presence = Presence::new();
        presence.join(participant("u1", "r1"));
        presence.join(participant("u2", "r1"));
        presence.join(participant("u3", "r2"));

        let mut members: Vec<String> = presence
            .members_of("r1")
            .into_iter()
            .map(|p| p.user_id)
            .collect();
        members.sort();
        assert_eq!(members, ["u1", "u2"]);
    }

    #[test]
    fn leave_removes_everywhere_and_tolerates_absence() {
        let presence = Presence::new();
        presence.join(participant("u1", "r1"));

        presence.leave("u1");
        presence.leave("u1");
        presence.leave("never-joined");

        assert!(presence.members_of("r1").is_empty());
        assert!(presence.is_empty());
    }
}

use dashmap::DashMap;
use palaver_core::{ConnId, RoomId};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// What the registry knows about one joined connection.
#[derive(Debug, Clone)]
struct Participant {
    identity: String,
    room: RoomId,
}

/// Membership table for the relay: connection id -> participant, room ->
/// member set. One owner for both maps so that `leave` removes every trace
/// of a connection deterministically.
///
/// No member cap is enforced here; the negotiation layer only ever talks
/// pairwise, but that is its property, not the registry's.
#[derive(Clone, Default)]
pub struct RoomRegistry {
    conns: Arc<DashMap<ConnId, Participant>>,
    rooms: Arc<DashMap<RoomId, HashSet<ConnId>>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a join. A connection re-joining under a new identity or room
    /// is first removed from its previous room.
    pub fn join(&self, conn_id: ConnId, identity: String, room: RoomId) {
        self.leave(&conn_id);

        info!("{} joins room '{}' as {:?}", conn_id, room, identity);
        self.conns.insert(
            conn_id.clone(),
            Participant {
                identity,
                room: room.clone(),
            },
        );
        self.rooms.entry(room).or_default().insert(conn_id);
    }

    /// Remove a connection from its room and from the table. Idempotent;
    /// called on every disconnect so entries never outlive the socket.
    pub fn leave(&self, conn_id: &ConnId) {
        let Some((_, participant)) = self.conns.remove(conn_id) else {
            return;
        };

        debug!(
            "{} ({}) leaves room '{}'",
            conn_id, participant.identity, participant.room
        );
        let empty = match self.rooms.get_mut(&participant.room) {
            Some(mut members) => {
                members.remove(conn_id);
                members.is_empty()
            }
            None => false,
        };
        if empty {
            self.rooms.remove(&participant.room);
        }
    }

    /// Room members other than `excluding`, for join fan-out.
    pub fn members(&self, room: &RoomId, excluding: &ConnId) -> Vec<ConnId> {
        self.rooms
            .get(room)
            .map(|members| {
                members
                    .iter()
                    .filter(|id| *id != excluding)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

}

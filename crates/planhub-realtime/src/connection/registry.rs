//! Connection registry: live connections grouped into per-user rooms.

use std::sync::Arc;

use dashmap::DashMap;

use planhub_core::types::id::{ConnectionId, UserId};

use super::handle::ConnectionHandle;

/// Result of [`ConnectionRegistry::join`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The handle entered the room.
    Joined,
    /// The handle was already in this room.
    AlreadyMember,
    /// The handle left another user's room and entered this one.
    Moved {
        /// The room it left.
        from: UserId,
    },
}

/// Thread-safe map of user rooms.
///
/// A handle is in at most one room. Membership of a given handle is only
/// changed by that handle's own connection task, so `join` and `leave`
/// never race for the same handle.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// User ID → handles authenticated as that user.
    rooms: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
    /// Connection ID → room it belongs to.
    membership: DashMap<ConnectionId, UserId>,
}

impl ConnectionRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Put `handle` into `user_id`'s room, moving it out of any other room.
    pub fn join(&self, user_id: UserId, handle: Arc<ConnectionHandle>) -> JoinOutcome {
        let previous = self.membership.insert(handle.id, user_id);

        let outcome = match previous {
            Some(prev) if prev == user_id => JoinOutcome::AlreadyMember,
            Some(prev) => {
                self.remove_from_room(prev, handle.id);
                JoinOutcome::Moved { from: prev }
            }
            None => JoinOutcome::Joined,
        };

        let mut room = self.rooms.entry(user_id).or_default();
        if !room.iter().any(|h| h.id == handle.id) {
            room.push(handle);
        }
        outcome
    }

    /// Remove a connection from whichever room holds it.
    ///
    /// Returns the user it was registered under, or `None` if it never
    /// authenticated or already left.
    pub fn leave(&self, conn_id: ConnectionId) -> Option<UserId> {
        let (_, user_id) = self.membership.remove(&conn_id)?;
        self.remove_from_room(user_id, conn_id);
        Some(user_id)
    }

    fn remove_from_room(&self, user_id: UserId, conn_id: ConnectionId) {
        if let Some(mut room) = self.rooms.get_mut(&user_id) {
            room.retain(|h| h.id != conn_id);
        }
        self.rooms.remove_if(&user_id, |_, room| room.is_empty());
    }

    /// Snapshot of the handles in a user's room.
    pub fn members_of(&self, user_id: UserId) -> Vec<Arc<ConnectionHandle>> {
        self.rooms
            .get(&user_id)
            .map(|room| room.value().clone())
            .unwrap_or_default()
    }

    /// The room a connection currently belongs to.
    pub fn room_of(&self, conn_id: ConnectionId) -> Option<UserId> {
        self.membership.get(&conn_id).map(|entry| *entry.value())
    }

    /// Snapshot of every registered handle across all rooms.
    pub fn all_members(&self) -> Vec<Arc<ConnectionHandle>> {
        self.rooms
            .iter()
            .flat_map(|room| room.value().clone())
            .collect()
    }

    /// Returns number of non-empty rooms (connected users).
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Returns number of authenticated connections.
    pub fn connection_count(&self) -> usize {
        self.membership.len()
    }

    /// Whether a user has at least one live connection.
    pub fn is_online(&self, user_id: UserId) -> bool {
        self.rooms.contains_key(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn handle() -> Arc<ConnectionHandle> {
        let (tx, _rx) = mpsc::channel(4);
        Arc::new(ConnectionHandle::new(tx, CancellationToken::new()))
    }

    fn in_any_room(registry: &ConnectionRegistry, h: &ConnectionHandle) -> bool {
        registry.all_members().iter().any(|m| m.id == h.id)
    }

    #[test]
    fn test_join_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let user = UserId::new();
        let h = handle();

        assert_eq!(registry.join(user, h.clone()), JoinOutcome::Joined);
        assert_eq!(registry.join(user, h.clone()), JoinOutcome::AlreadyMember);
        assert_eq!(registry.members_of(user).len(), 1);
        assert_eq!(registry.room_of(h.id), Some(user));
    }

    #[test]
    fn test_rejoin_moves_between_rooms() {
        let registry = ConnectionRegistry::new();
        let (a, b) = (UserId::new(), UserId::new());
        let h = handle();

        registry.join(a, h.clone());
        assert_eq!(registry.join(b, h.clone()), JoinOutcome::Moved { from: a });
        assert!(registry.members_of(a).is_empty());
        assert_eq!(registry.members_of(b).len(), 1);
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn test_leave_is_exhaustive() {
        let registry = ConnectionRegistry::new();
        let user = UserId::new();
        let (h1, h2) = (handle(), handle());

        for _ in 0..3 {
            registry.join(user, h1.clone());
        }
        registry.join(user, h2.clone());

        assert_eq!(registry.leave(h1.id), Some(user));
        assert!(!in_any_room(&registry, &h1));
        assert_eq!(registry.members_of(user).len(), 1);

        assert_eq!(registry.leave(h1.id), None);
        registry.leave(h2.id);
        assert!(!registry.is_online(user));
        assert_eq!(registry.room_count(), 0);
        assert_eq!(registry.connection_count(), 0);
    }

    #[test]
    fn test_leave_unknown_connection_is_noop() {
        let registry = ConnectionRegistry::new();
        let user = UserId::new();
        registry.join(user, handle());

        assert_eq!(registry.leave(ConnectionId::new()), None);
        assert_eq!(registry.connection_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_join_leave() {
        let registry = Arc::new(ConnectionRegistry::new());
        let user = UserId::new();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    let h = handle();
                    registry.join(user, h.clone());
                    if i % 2 == 0 {
                        registry.leave(h.id);
                    }
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(registry.members_of(user).len(), 16);
        assert_eq!(registry.connection_count(), 16);
    }
}

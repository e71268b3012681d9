use crate::models::identity::Identity;
use crate::net::output::OutputHandle;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

/// Live connections of one identity, keyed by peer address. Shared by
/// reference between the registry and whoever is iterating it.
pub type ConnectionSet = Arc<RwLock<HashMap<SocketAddr, OutputHandle>>>;

/// Process-wide map from identity to every connection currently logged in as it.
#[derive(Default)]
pub struct SessionRegistry {
    online: DashMap<Identity, ConnectionSet>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `conn` under `identity`. Joining twice with the same address
    /// replaces the handle.
    pub fn join(&self, identity: &Identity, conn: OutputHandle) {
        // The shard guard is held across the insert so a concurrent prune in
        // `leave` cannot drop the set we are adding to.
        let entry = self.online.entry(identity.clone()).or_default();
        entry.write().insert(conn.peer(), conn);
    }

    /// Removes `conn` from `identity`. Only the exact handle is removed: a
    /// newer connection that reuses the same peer address stays registered.
    /// No-op when it is not registered.
    pub fn leave(&self, identity: &Identity, conn: &OutputHandle) {
        if let Some(set) = self.online.get(identity) {
            let mut conns = set.write();
            if conns.get(&conn.peer()).is_some_and(|c| c.same_channel(conn)) {
                conns.remove(&conn.peer());
            }
        }
        self.online.remove_if(identity, |_, set| set.read().is_empty());
    }

    /// Point-in-time copy of the connections for `identity`.
    pub fn snapshot(&self, identity: &Identity) -> Vec<OutputHandle> {
        let Some(set) = self.online.get(identity).map(|s| Arc::clone(s.value())) else {
            return Vec::new();
        };
        let conns = set.read();
        conns.values().cloned().collect()
    }

    pub fn is_online(&self, identity: &Identity) -> bool {
        self.online.contains_key(identity)
    }

    pub fn connection_count(&self, identity: &Identity) -> usize {
        self.online.get(identity).map(|s| s.read().len()).unwrap_or(0)
    }
}

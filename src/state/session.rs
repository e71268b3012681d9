use crate::models::identity::Identity;
use std::net::SocketAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    /// Connected, no credentials accepted yet
    Unauthenticated,
    /// Logged in (or freshly registered) and joined to the session registry
    Authenticated,
    /// Terminal
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    WebSocket,
    /// Newline-delimited JSON over plain TCP
    Lines,
}

#[derive(Debug)]
pub struct Session {
    // When is the session started/created
    pub session_started: std::time::Instant,

    /// Protocol used by the client
    protocol: Protocol,
    /// Peer address, also the registry key of this connection
    peer: SocketAddr,
    /// Who we are (once authenticated)
    identity: Option<Identity>,
    /// Current connection state
    state: ConnState,
}

impl Session {
    pub fn new(protocol: Protocol, peer: SocketAddr) -> Self {
        Self {
            session_started: std::time::Instant::now(),
            protocol,
            peer,
            identity: None,
            state: ConnState::Unauthenticated,
        }
    }

    pub fn state(&self) -> ConnState {
        self.state
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == ConnState::Authenticated && self.identity.is_some()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Moves from `Unauthenticated` to `Authenticated`. Returns false (and
    /// changes nothing) from any other state.
    pub fn authenticate(&mut self, identity: Identity) -> bool {
        if self.state != ConnState::Unauthenticated {
            return false;
        }
        self.identity = Some(identity);
        self.state = ConnState::Authenticated;
        true
    }

    /// Enters the terminal state. Returns the identity the session was
    /// registered under, if any, so the caller can leave the registry.
    pub fn close(&mut self) -> Option<Identity> {
        let was_authenticated = self.state == ConnState::Authenticated;
        self.state = ConnState::Closed;
        if was_authenticated { self.identity.clone() } else { None }
    }
}

use crate::models::identity::Identity;
use crate::net::output::OutputHandle;
use crate::net::protocol::{Response, encode};
use crate::state::session_registry::SessionRegistry;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;

/// How long one connection may hold up a broadcast before it counts as failed.
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends `resp` to every connection registered for `identity`, the originator
/// included. Returns the number of connections the frame was queued for.
///
/// Failures are logged and the failing connection is dropped from the
/// registry; they never reach the caller.
pub async fn broadcast(registry: &SessionRegistry, identity: &Identity, resp: &Response) -> usize {
    let targets = registry.snapshot(identity);
    if targets.is_empty() {
        return 0;
    }

    let frame: Arc<str> = Arc::from(encode(resp));
    let sends = targets.iter().map(|conn| {
        let frame = frame.clone();
        async move {
            let res = tokio::time::timeout(SEND_TIMEOUT, conn.send_encoded(frame)).await;
            (conn, res)
        }
    });

    let mut delivered = 0;
    for (conn, res) in join_all(sends).await {
        match res {
            Ok(Ok(())) => delivered += 1,
            Ok(Err(e)) => {
                tracing::warn!(peer = %conn.peer(), %identity, error = %e, "broadcast send failed, dropping connection");
                drop_connection(registry, identity, conn);
            }
            Err(_) => {
                tracing::warn!(peer = %conn.peer(), %identity, "broadcast send timed out, dropping connection");
                drop_connection(registry, identity, conn);
            }
        }
    }

    tracing::debug!(%identity, action = %resp.action, recipients = targets.len(), delivered, "broadcast");
    delivered
}

/// A failed send counts as a disconnect: the session is told to shut down and
/// this exact handle leaves the registry.
fn drop_connection(registry: &SessionRegistry, identity: &Identity, conn: &OutputHandle) {
    conn.evict();
    registry.leave(identity, conn);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::Item;
    use crate::net::output::{OutFrame, output_channel};
    use crate::net::protocol::Action;
    use futures::FutureExt;
    use std::net::SocketAddr;

    fn addr(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    #[tokio::test]
    async fn reaches_every_connection_of_the_identity_only() {
        let reg = SessionRegistry::new();
        let ada = Identity("ada".into());
        let bob = Identity("bob".into());

        let (a1, mut a1_rx) = output_channel(addr(6001));
        let (a2, mut a2_rx) = output_channel(addr(6002));
        let (b1, b1_rx) = output_channel(addr(6003));
        reg.join(&ada, a1);
        reg.join(&ada, a2);
        reg.join(&bob, b1);

        let resp = Response::push(Action::Insert, vec![Item { id: 1, ..Item::new("milk") }]);
        assert_eq!(broadcast(&reg, &ada, &resp).await, 2);

        for rx in [&mut a1_rx, &mut a2_rx] {
            let Some(OutFrame::Text(text)) = rx.recv().await else { panic!("expected a frame") };
            let got: Response = serde_json::from_str(&text).unwrap();
            assert_eq!(got, resp);
        }
        assert!(b1_rx.is_empty());
    }

    #[tokio::test]
    async fn dead_connection_is_dropped_without_affecting_others() {
        let reg = SessionRegistry::new();
        let ada = Identity("ada".into());

        let (alive, mut alive_rx) = output_channel(addr(6101));
        let (dead, dead_rx) = output_channel(addr(6102));
        reg.join(&ada, alive.clone());
        reg.join(&ada, dead.clone());
        drop(dead_rx);

        let resp = Response::push(Action::Delete, vec![Item::tombstone(3)]);
        assert_eq!(broadcast(&reg, &ada, &resp).await, 1);

        assert!(matches!(alive_rx.recv().await, Some(OutFrame::Text(_))));
        assert_eq!(reg.connection_count(&ada), 1);
        assert_eq!(reg.snapshot(&ada)[0].peer(), addr(6101));
        assert!(dead.is_evicted());
        assert!(!alive.is_evicted());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_connection_is_evicted_after_the_send_timeout() {
        let reg = SessionRegistry::new();
        let ada = Identity("ada".into());

        let (alive, mut alive_rx) = output_channel(addr(6201));
        let (stalled, _stalled_rx) = output_channel(addr(6202));
        reg.join(&ada, alive.clone());
        reg.join(&ada, stalled.clone());

        // nobody drains the stalled queue
        let filler = Response::push(Action::Get, vec![]);
        while stalled.send_encoded(Arc::from(encode(&filler))).now_or_never().is_some() {}

        let resp = Response::push(Action::Insert, vec![Item { id: 9, ..Item::new("tea") }]);
        let started = tokio::time::Instant::now();
        assert_eq!(broadcast(&reg, &ada, &resp).await, 1);
        assert!(started.elapsed() >= SEND_TIMEOUT);

        let Some(OutFrame::Text(text)) = alive_rx.recv().await else { panic!("expected a frame") };
        assert_eq!(serde_json::from_str::<Response>(&text).unwrap(), resp);

        assert!(stalled.is_evicted());
        assert!(!alive.is_evicted());
        assert_eq!(reg.connection_count(&ada), 1);
        assert!(reg.snapshot(&ada)[0].same_channel(&alive));
    }

    #[tokio::test]
    async fn eviction_only_removes_the_failed_handle() {
        let reg = SessionRegistry::new();
        let ada = Identity("ada".into());

        let (old, old_rx) = output_channel(addr(6301));
        reg.join(&ada, old.clone());
        drop(old_rx);

        // old's session leaves and a fresh connection reuses the address
        reg.leave(&ada, &old);
        let (fresh, mut fresh_rx) = output_channel(addr(6301));
        reg.join(&ada, fresh.clone());

        // a send through the stale handle fails and is dropped
        drop_connection(&reg, &ada, &old);

        assert_eq!(reg.connection_count(&ada), 1);
        assert!(!fresh.is_evicted());
        let resp = Response::push(Action::Update, vec![Item { id: 2, ..Item::new("x") }]);
        assert_eq!(broadcast(&reg, &ada, &resp).await, 1);
        assert!(matches!(fresh_rx.recv().await, Some(OutFrame::Text(_))));
    }

    #[tokio::test]
    async fn nobody_online_is_a_no_op() {
        let reg = SessionRegistry::new();
        let resp = Response::push(Action::Update, vec![]);
        assert_eq!(broadcast(&reg, &Identity("ghost".into()), &resp).await, 0);
    }
}

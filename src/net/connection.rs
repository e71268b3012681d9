use crate::Registry;
use crate::commands::{CmdCtx, handle_request};
use crate::error::SessionError;
use crate::net::output::OutputHandle;
use crate::net::protocol::{Action, PUSH_MSG_ID, Response, decode};
use crate::state::session::{Protocol, Session};
use futures::{Stream, StreamExt};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::error::Elapsed;

/// Why the read loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer closed the stream
    Eof,
    /// Reading from the stream failed
    ReadError,
    /// Undecodable frame before authentication
    BadHandshake,
    /// Nothing received within the idle timeout
    Idle,
    /// Dropped after a send to this connection failed or stalled
    Evicted,
}

/// Drives one connection from accept to close: the credential phase, then
/// the command loop. `frames` yields one raw frame per item and ends when the
/// peer goes away.
pub async fn handle_connection<S>(
    frames: S,
    output: OutputHandle,
    protocol: Protocol,
    registry: Arc<Registry>,
) -> CloseReason
where
    S: Stream<Item = io::Result<String>> + Unpin,
{
    let sess = Session::new(protocol, output.peer());
    let mut ctx = CmdCtx::new(registry, output, sess);

    let reason = read_loop(frames, &mut ctx).await;
    cleanup(&mut ctx, reason).await;

    reason
}

async fn read_loop<S>(mut frames: S, ctx: &mut CmdCtx) -> CloseReason
where
    S: Stream<Item = io::Result<String>> + Unpin,
{
    let idle = ctx.registry.config.idle_timeout();
    let output = ctx.output.clone();

    loop {
        let next = tokio::select! {
            biased;
            _ = output.evicted() => return CloseReason::Evicted,
            next = next_frame(&mut frames, idle) => next,
        };

        let raw = match next {
            Err(_) => return CloseReason::Idle,
            Ok(None) => return CloseReason::Eof,
            Ok(Some(Err(e))) => {
                tracing::debug!(error = %e, "read failed");
                return CloseReason::ReadError;
            }
            Ok(Some(Ok(raw))) => raw,
        };

        let raw = raw.trim();
        if raw.is_empty() {
            continue;
        }

        let req = match decode(raw) {
            Ok(req) => req,
            Err(e) => {
                tracing::debug!(error = %e, "undecodable frame");
                let msg_id = e.msg_id.unwrap_or(PUSH_MSG_ID);
                let err = SessionError::from(e);
                ctx.reply(Response::error(msg_id, Action::Unknown, err.client_message())).await;

                if !ctx.sess.is_authenticated() {
                    return CloseReason::BadHandshake;
                }
                continue;
            }
        };

        handle_request(ctx, &req).await;
    }
}

/// Next frame, or `Elapsed` when the peer stayed silent past `idle`.
async fn next_frame<S>(frames: &mut S, idle: Option<Duration>) -> Result<Option<io::Result<String>>, Elapsed>
where
    S: Stream<Item = io::Result<String>> + Unpin,
{
    match idle {
        Some(limit) => tokio::time::timeout(limit, frames.next()).await,
        None => Ok(frames.next().await),
    }
}

async fn cleanup(ctx: &mut CmdCtx, reason: CloseReason) {
    ctx.leave();
    ctx.output.close();
    tracing::debug!(?reason, protocol = ?ctx.sess.protocol(), uptime = ?ctx.sess.session_started.elapsed(), "session closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::identity::Identity;
    use crate::net::output::{OutFrame, SessionOut, output_channel};
    use futures::channel::mpsc;
    use std::net::SocketAddr;

    fn registry() -> Arc<Registry> {
        Arc::new(Registry::in_memory(Config::default()))
    }

    async fn next_response(out: &mut SessionOut) -> Response {
        match out.recv().await {
            Some(OutFrame::Text(text)) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected a response, got {other:?}"),
        }
    }

    struct Client {
        tx: mpsc::UnboundedSender<io::Result<String>>,
        out: SessionOut,
        task: tokio::task::JoinHandle<CloseReason>,
    }

    fn connect(registry: &Arc<Registry>, port: u16) -> Client {
        let (tx, rx) = mpsc::unbounded();
        let (output, out) = output_channel(SocketAddr::from(([127, 0, 0, 1], port)));
        let task = tokio::spawn(handle_connection(rx, output, Protocol::Lines, registry.clone()));
        Client { tx, out, task }
    }

    impl Client {
        fn send(&self, raw: &str) {
            self.tx.unbounded_send(Ok(raw.to_string())).unwrap();
        }
    }

    #[tokio::test]
    async fn garbage_before_login_closes_the_connection() {
        let reg = registry();
        let mut c = connect(&reg, 7100);

        c.send("{not json");
        let resp = next_response(&mut c.out).await;
        assert_eq!(resp.error.as_deref(), Some("bad message"));
        assert!(matches!(c.out.recv().await, Some(OutFrame::Close)));
        assert_eq!(c.task.await.unwrap(), CloseReason::BadHandshake);
    }

    #[tokio::test]
    async fn garbage_after_login_is_answered_and_ignored() {
        let reg = registry();
        let mut c = connect(&reg, 7101);

        c.send(r#"{"id":1,"action":"register","user":{"email":"ada@x","password":"pw"}}"#);
        assert!(!next_response(&mut c.out).await.is_error());

        c.send(r#"{"id":2,"action":"get","item":{"id":"nope"}}"#);
        let resp = next_response(&mut c.out).await;
        assert_eq!(resp.msg_id, 2);
        assert_eq!(resp.error.as_deref(), Some("bad message"));

        c.send(r#"{"id":3,"action":"get"}"#);
        let resp = next_response(&mut c.out).await;
        assert_eq!(resp.msg_id, 3);
        assert_eq!(resp.items, Some(vec![]));

        drop(c.tx);
        assert_eq!(c.task.await.unwrap(), CloseReason::Eof);
    }

    #[tokio::test]
    async fn read_error_ends_the_session_and_leaves_the_registry() {
        let reg = registry();
        let mut c = connect(&reg, 7102);

        c.send(r#"{"id":1,"action":"register","user":{"email":"ada@x","password":"pw"}}"#);
        next_response(&mut c.out).await;
        assert!(reg.sessions.is_online(&Identity("ada@x".into())));

        c.tx.unbounded_send(Err(io::Error::other("reset"))).unwrap();
        assert_eq!(c.task.await.unwrap(), CloseReason::ReadError);
        assert!(!reg.sessions.is_online(&Identity("ada@x".into())));
    }

    #[tokio::test]
    async fn idle_connections_are_closed() {
        let cfg = Config {
            idle_timeout_secs: Some(1),
            ..Config::default()
        };
        let reg = Arc::new(Registry::in_memory(cfg));
        let c = connect(&reg, 7103);

        let reason = tokio::time::timeout(std::time::Duration::from_secs(5), c.task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reason, CloseReason::Idle);
        drop(c.tx);
    }

    #[tokio::test]
    async fn blank_frames_are_skipped() {
        let reg = registry();
        let mut c = connect(&reg, 7104);

        c.send("   ");
        c.send(r#"{"id":5,"action":"get"}"#);
        let resp = next_response(&mut c.out).await;
        assert_eq!(resp.msg_id, 5);
        assert_eq!(resp.error.as_deref(), Some("invalid action"));
    }

    #[tokio::test(start_paused = true)]
    async fn connection_that_stops_reading_is_closed_by_the_broadcast() {
        let reg = registry();
        let ada = Identity("ada@x".into());

        let mut a = connect(&reg, 7105);
        a.send(r#"{"id":1,"action":"register","user":{"email":"ada@x","password":"pw"}}"#);
        assert!(!next_response(&mut a.out).await.is_error());

        let mut b = connect(&reg, 7106);
        b.send(r#"{"id":1,"action":"login","user":{"email":"ada@x","password":"pw"}}"#);
        assert!(!next_response(&mut b.out).await.is_error());
        assert_eq!(next_response(&mut b.out).await.msg_id, PUSH_MSG_ID);
        assert_eq!(reg.sessions.connection_count(&ada), 2);

        // a keeps reading its output, b never does
        let Client { tx: a_tx, out: mut a_out, task: a_task } = a;
        let a_drain = tokio::spawn(async move {
            let mut seen = 0;
            while let Some(OutFrame::Text(_)) = a_out.recv().await {
                seen += 1;
            }
            seen
        });
        for i in 0..70 {
            let raw = format!(r#"{{"id":{},"action":"insert","item":{{"what":"item {i}"}}}}"#, i + 10);
            a_tx.unbounded_send(Ok(raw)).unwrap();
        }

        let reason = tokio::time::timeout(Duration::from_secs(60), b.task).await.unwrap().unwrap();
        assert_eq!(reason, CloseReason::Evicted);
        assert_eq!(reg.sessions.connection_count(&ada), 1);

        // b holds what fit in its queue and nothing after
        let mut queued = 0;
        while let Some(OutFrame::Text(_)) = b.out.recv().await {
            queued += 1;
        }
        assert_eq!(queued, 64);

        // a saw every insert
        drop(a_tx);
        assert_eq!(a_task.await.unwrap(), CloseReason::Eof);
        assert_eq!(a_drain.await.unwrap(), 70);
        assert!(!reg.sessions.is_online(&ada));
    }
}

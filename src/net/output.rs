use crate::net::protocol::{Response, encode};
use crate::net::sink::ClientSink;
use crate::net::sink::line::LineSink;
use crate::net::sink::websocket::WebSocketSink;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

/// Frames queued per connection before senders have to wait.
const OUTPUT_QUEUE: usize = 64;

#[derive(Debug, Clone)]
pub enum OutFrame {
    /// One encoded response
    Text(Arc<str>),
    /// Close the connection after everything queued before it
    Close,
}

#[derive(Debug, Error)]
#[error("output for {peer} is closed")]
pub struct OutputClosed {
    pub peer: SocketAddr,
}

/// Writing end of one connection. Cheap to clone; every clone feeds the same
/// FIFO queue, which a dedicated task drains into the socket.
#[derive(Clone, Debug)]
pub struct OutputHandle {
    /// Sender for output frames
    tx: mpsc::Sender<OutFrame>,
    /// Peer address, the stable label of this connection
    peer: SocketAddr,
    /// Flipped to `true` once the connection is thrown out after a failed send
    evicted: Arc<watch::Sender<bool>>,
}

impl OutputHandle {
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// True when both handles feed the same connection, whatever their address.
    pub fn same_channel(&self, other: &OutputHandle) -> bool {
        self.tx.same_channel(&other.tx)
    }

    pub async fn send(&self, resp: &Response) -> Result<(), OutputClosed> {
        self.send_encoded(Arc::from(encode(resp))).await
    }

    /// Queues one frame, waiting for room. Fails once the writer is gone or
    /// the connection has been evicted, even while waiting.
    pub async fn send_encoded(&self, frame: Arc<str>) -> Result<(), OutputClosed> {
        tokio::select! {
            biased;
            _ = self.evicted() => Err(OutputClosed { peer: self.peer }),
            res = self.tx.send(OutFrame::Text(frame)) => res.map_err(|_| OutputClosed { peer: self.peer }),
        }
    }

    /// Queues a close behind everything already queued. When the queue is full
    /// or gone the connection is evicted instead, so closing never waits on a
    /// stalled peer.
    pub fn close(&self) {
        if self.tx.try_send(OutFrame::Close).is_err() {
            self.evict();
        }
    }

    /// Tears the connection down: its writer stops and its read loop ends.
    pub fn evict(&self) {
        self.evicted.send_replace(true);
    }

    pub fn is_evicted(&self) -> bool {
        *self.evicted.borrow()
    }

    /// Resolves once `evict` has been called on any clone of this handle.
    pub async fn evicted(&self) {
        let mut rx = self.evicted.subscribe();
        let _ = rx.wait_for(|evicted| *evicted).await;
    }
}

/// Reading end of the output queue.
pub struct SessionOut {
    rx: mpsc::Receiver<OutFrame>,
    evicted: watch::Receiver<bool>,
}

impl SessionOut {
    pub async fn recv(&mut self) -> Option<OutFrame> {
        self.rx.recv().await
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    pub async fn run<C>(mut self, mut client: C) -> anyhow::Result<()>
    where
        C: ClientSink,
    {
        // A closed watch (every handle dropped) disables the eviction arms,
        // letting the queued frames and the final close drain normally.
        let mut evicted = self.evicted.clone();

        loop {
            let frame = tokio::select! {
                biased;
                true = wait_evicted(&mut evicted) => break,
                frame = self.rx.recv() => frame,
            };

            match frame {
                Some(OutFrame::Text(text)) => {
                    tokio::select! {
                        biased;
                        true = wait_evicted(&mut evicted) => break,
                        res = client.send_text(&text) => res?,
                    }
                }
                Some(OutFrame::Close) => {
                    client.close().await?;
                    break;
                }
                None => break,
            }
        }

        Ok(())
    }
}

async fn wait_evicted(rx: &mut watch::Receiver<bool>) -> bool {
    rx.wait_for(|evicted| *evicted).await.is_ok()
}

/// Creates the queue for one connection.
pub fn output_channel(peer: SocketAddr) -> (OutputHandle, SessionOut) {
    let (tx, rx) = mpsc::channel::<OutFrame>(OUTPUT_QUEUE);
    let (evicted_tx, evicted_rx) = watch::channel(false);

    let handle = OutputHandle {
        tx,
        peer,
        evicted: Arc::new(evicted_tx),
    };
    (handle, SessionOut { rx, evicted: evicted_rx })
}

pub struct SessionIoBundle {
    pub output: OutputHandle,
}

fn spawn_writer<C>(session_out: SessionOut, sink: C)
where
    C: ClientSink + 'static,
{
    tokio::spawn(
        async move {
            if let Err(e) = session_out.run(sink).await {
                tracing::warn!(error = %e, "session output failed");
            }
        }
        .in_current_span(),
    );
}

pub async fn init_session_for_lines<W>(writer: W, peer: SocketAddr) -> SessionIoBundle
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (output_handle, session_out) = output_channel(peer);
    spawn_writer(session_out, LineSink::new(writer));

    SessionIoBundle { output: output_handle }
}

pub async fn init_session_for_websocket(
    websocket_writer: SplitSink<WebSocket, Message>,
    peer: SocketAddr,
) -> SessionIoBundle {
    let (output_handle, session_out) = output_channel(peer);
    spawn_writer(session_out, WebSocketSink::new(websocket_writer));

    SessionIoBundle { output: output_handle }
}

use crate::Registry;
use crate::error::{AppResult, InfraError};
use crate::net::connection::handle_connection;
use crate::net::output::init_session_for_lines;
use crate::state::session::Protocol;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::Instrument;

/// Run the line protocol server: one JSON frame per line.
pub async fn serve(addr: SocketAddr, registry: Arc<Registry>) -> AppResult<()> {
    let listener = TcpListener::bind(&addr).await.map_err(InfraError::from)?;
    serve_listener(listener, registry).await
}

pub async fn serve_listener(listener: TcpListener, registry: Arc<Registry>) -> AppResult<()> {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let span = tracing::info_span!("conn", %peer, identity = tracing::field::Empty);
                let registry = registry.clone();
                tokio::spawn(
                    async move {
                        tracing::info!("client connected");
                        let reason = handle_tcp_connection(stream, peer, registry).await;
                        tracing::info!(?reason, "client disconnected");
                    }
                    .instrument(span),
                );
            }
            Err(e) => {
                tracing::error!(error=%e, "failed to accept connection");
                tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            }
        }
    }
}

async fn handle_tcp_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<Registry>,
) -> crate::net::connection::CloseReason {
    let (read_half, write_half) = stream.into_split();

    let io_bundle = init_session_for_lines(write_half, peer).await;

    let lines = BufReader::new(read_half).lines();
    let frames = futures::stream::unfold(lines, |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((Ok(line), lines)),
            Ok(None) => None,
            Err(e) => Some((Err(e), lines)),
        }
    });

    handle_connection(Box::pin(frames), io_bundle.output, Protocol::Lines, registry).await
}

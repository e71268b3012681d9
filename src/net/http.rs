use axum::{
    Router,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::{ConnectInfo, State},
    response::IntoResponse,
    routing::get,
};
use futures::StreamExt;
use futures::future::ready;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;
use tracing::Instrument;

use crate::Registry;
use crate::error::{AppResult, InfraError};
use crate::net::connection::handle_connection;
use crate::net::output::init_session_for_websocket;
use crate::state::session::Protocol;

#[derive(Clone)]
struct HttpAppCtx {
    registry: Arc<Registry>,
}

/// Run the HTTP server with WebSocket endpoint
pub async fn serve(addr: SocketAddr, registry: Arc<Registry>) -> AppResult<()> {
    let listener = TcpListener::bind(&addr).await.map_err(InfraError::from)?;
    serve_listener(listener, registry).await
}

pub async fn serve_listener(listener: TcpListener, registry: Arc<Registry>) -> AppResult<()> {
    let app = router(registry);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .map_err(InfraError::from)?;
    Ok(())
}

/// `/ws` upgrades to the list protocol, everything else serves the index page.
pub fn router(registry: Arc<Registry>) -> Router {
    let index = ServeFile::new(&registry.config.index_path);

    Router::new()
        .route("/ws", get(ws_upgrade))
        .fallback_service(index)
        .with_state(HttpAppCtx { registry })
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

async fn ws_upgrade(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(state): State<HttpAppCtx>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_handler(socket, peer, state.registry.clone()))
}

async fn ws_handler(socket: WebSocket, peer: SocketAddr, registry: Arc<Registry>) {
    let span = tracing::info_span!("conn", %peer, identity = tracing::field::Empty);

    async move {
        tracing::info!("client connected");
        let (ws_write, ws_read) = socket.split();

        let io_bundle = init_session_for_websocket(ws_write, peer).await;

        // Axum already answers pings; only data frames reach the session
        let frames = ws_read
            .take_while(|msg| ready(!matches!(msg, Ok(Message::Close(_)))))
            .filter_map(|msg| {
                ready(match msg {
                    Ok(Message::Text(t)) => Some(Ok(t.as_str().to_owned())),
                    Ok(Message::Binary(b)) => Some(Ok(String::from_utf8_lossy(&b).into_owned())),
                    Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Close(_)) => None,
                    Err(e) => Some(Err(io::Error::other(e))),
                })
            });

        let reason = handle_connection(Box::pin(frames), io_bundle.output, Protocol::WebSocket, registry).await;
        tracing::info!(?reason, "client disconnected");
    }
    .instrument(span)
    .await
}

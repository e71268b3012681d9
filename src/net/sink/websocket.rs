use crate::net::sink::ClientSink;
use async_trait::async_trait;
use futures::SinkExt;

/// One websocket text message per response.
pub struct WebSocketSink<S, M> {
    ws: S,
    _phantom: std::marker::PhantomData<M>,
}

impl<S, M> WebSocketSink<S, M> {
    pub fn new(ws: S) -> Self {
        Self {
            ws,
            _phantom: std::marker::PhantomData,
        }
    }
}

#[async_trait]
impl<S, M> ClientSink for WebSocketSink<S, M>
where
    S: SinkExt<M> + Unpin + Send,
    S::Error: std::error::Error + Send + Sync + 'static,
    M: From<String> + Send,
{
    async fn send_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.ws
            .send(M::from(text.to_string()))
            .await
            .map_err(|e| anyhow::Error::msg(format!("websocket send failed: {e}")))?;

        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.ws
            .close()
            .await
            .map_err(|e| anyhow::Error::msg(format!("websocket close failed: {e}")))?;

        Ok(())
    }
}

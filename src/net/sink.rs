pub mod line;
pub mod websocket;

use async_trait::async_trait;

#[async_trait]
pub trait ClientSink: Send {
    async fn send_text(&mut self, text: &str) -> anyhow::Result<()>;

    async fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

use crate::net::sink::ClientSink;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Newline-delimited frames for plain TCP clients.
pub struct LineSink<W> {
    writer: W,
}

impl<W> LineSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

#[async_trait]
impl<W> ClientSink for LineSink<W>
where
    W: AsyncWriteExt + Unpin + Send,
{
    async fn send_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;

        Ok(())
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.writer.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[tokio::test]
    async fn terminates_every_frame_with_a_newline() {
        let (client, server) = tokio::io::duplex(256);
        let mut sink = LineSink::new(server);

        sink.send_text(r#"{"msgId":1}"#).await.unwrap();
        sink.send_text(r#"{"msgId":2}"#).await.unwrap();
        sink.close().await.unwrap();
        drop(sink);

        let mut buf = String::new();
        let mut client = client;
        client.read_to_string(&mut buf).await.unwrap();
        assert_eq!(buf, "{\"msgId\":1}\n{\"msgId\":2}\n");
    }
}

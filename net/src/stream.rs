use std::io;

use tokio::{
    io::AsyncRead,
    net::TcpStream,
};

/// A byte-stream transport that can be established from an address.
#[async_trait::async_trait]
pub trait StreamOps: AsyncRead + Unpin + Send + Sized {
    type Address: Send;

    async fn connect(address: &Self::Address) -> io::Result<Self>;
    fn display_addr(addr: &Self::Address) -> String;
}

#[async_trait::async_trait]
impl StreamOps for TcpStream {
    /// `host:port`, resolved on every connect.
    type Address = String;

    #[tracing::instrument(err, skip_all, fields(address = address.as_str()))]
    #[inline]
    async fn connect(address: &String) -> io::Result<Self> {
        let stream = TcpStream::connect(address.as_str()).await?;
        stream.set_nodelay(true)?;

        tracing::debug!(peer = ?stream.peer_addr().ok(), "tcp connection established");

        Ok(stream)
    }

    #[inline]
    fn display_addr(addr: &String) -> String {
        addr.clone()
    }
}

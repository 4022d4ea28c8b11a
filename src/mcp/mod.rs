//! MCP server construction and the HTTP/SSE listener.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::actors::ActorClient;
use crate::error::ActorMcpError;

mod server;

pub use server::{ActorsMcpServer, DEFAULT_ACTORS};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerOptions {
    pub enable_adding_actors: bool,
    pub enable_default_actors: bool,
    pub actors: Vec<String>,
}

/// Invoked once the listener is bound.
pub type ReadyCallback = Box<dyn FnOnce(SocketAddr) + Send>;

#[async_trait]
pub trait Listen: Send + Sized {
    /// Binds `port` and serves in the background.
    ///
    /// The returned token stops the listener when cancelled.
    async fn listen(
        self,
        port: u16,
        on_ready: ReadyCallback,
    ) -> Result<CancellationToken, ActorMcpError>;
}

pub trait ServerFactory: Send + Sync {
    type Server: Listen;

    fn build(&self, host: &str, options: ServerOptions) -> Result<Self::Server, ActorMcpError>;
}

/// Builds MCP servers served over rmcp's SSE transport:
/// - `GET /sse` for the server-to-client stream
/// - `POST /message?sessionId=<id>` for client-to-server JSON-RPC messages
pub struct SseServerFactory {
    client: Arc<dyn ActorClient>,
    token: String,
}

impl SseServerFactory {
    pub fn new(client: Arc<dyn ActorClient>, token: String) -> Self {
        Self { client, token }
    }
}

impl ServerFactory for SseServerFactory {
    type Server = SseListener;

    fn build(&self, host: &str, options: ServerOptions) -> Result<SseListener, ActorMcpError> {
        let server = ActorsMcpServer::new(host, &options, self.client.clone(), self.token.clone());
        Ok(SseListener {
            bind_ip: bind_ip(host),
            server,
        })
    }
}

/// A non-IP host (the public standby URL) is only advertised; the listener
/// then binds every interface.
fn bind_ip(host: &str) -> IpAddr {
    host.parse()
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

pub struct SseListener {
    bind_ip: IpAddr,
    server: ActorsMcpServer,
}

#[async_trait]
impl Listen for SseListener {
    async fn listen(
        self,
        port: u16,
        on_ready: ReadyCallback,
    ) -> Result<CancellationToken, ActorMcpError> {
        use rmcp::transport::sse_server::SseServer;

        let bind = SocketAddr::new(self.bind_ip, port);
        let server = self.server;
        let ct = SseServer::serve(bind)
            .await
            .map_err(|e| ActorMcpError::Server(format!("Failed to bind HTTP server: {e}")))?
            .with_service(move || server.clone());

        tracing::debug!("SSE endpoint:  GET  http://{bind}/sse");
        tracing::debug!("Post endpoint: POST http://{bind}/message");
        on_ready(bind);
        Ok(ct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bind_ip_falls_back_to_wildcard_for_urls() {
        assert_eq!(
            bind_ip("https://me--actors-mcp.apify.actor"),
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        );
        assert_eq!(bind_ip("127.0.0.1"), IpAddr::V4(Ipv4Addr::LOCALHOST));
    }
}

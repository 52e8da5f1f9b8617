//! Server lifecycle: bind, serve, shut down.
//!
//! The server is an explicit value owned by the caller: built with root,
//! port and the browser flag, bound, then driven until the shutdown token
//! fires. No ambient state, no signal handlers in here — the binary owns
//! signals and cancels the token, which keeps shutdown testable without OS
//! signal delivery and idempotent under repeated signals.

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use transcript_http::connection::HttpConnection;

use crate::dispatch::Dispatcher;

pub struct ServerBuilder {
    root: Option<PathBuf>,
    port: u16,
    open_browser: bool,
}

impl ServerBuilder {
    fn new() -> Self {
        Self { root: None, port: 8080, open_browser: false }
    }

    /// The canonical, absolute directory to serve. Required.
    pub fn root(mut self, root: PathBuf) -> Self {
        self.root = Some(root);
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Open the host's default browser once the listener is up.
    pub fn open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    pub fn build(self) -> Result<Server, ServerBuildError> {
        let root = self.root.ok_or(ServerBuildError::MissingRoot)?;
        Ok(Server { root, port: self.port, open_browser: self.open_browser })
    }
}

#[derive(Error, Debug)]
pub enum ServerBuildError {
    #[error("serving root must be set")]
    MissingRoot,
}

#[derive(Error, Debug)]
pub enum StartError {
    /// The configured port is taken. Reported distinctly because the fix
    /// (pick another port) belongs to the user, not the program.
    #[error("port {port} is already in use")]
    PortInUse { port: u16 },

    #[error("can't bind listener: {source}")]
    Bind {
        #[from]
        source: io::Error,
    },
}

/// The preview server, ready to bind.
pub struct Server {
    root: PathBuf,
    port: u16,
    open_browser: bool,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Binds the listener on localhost.
    ///
    /// Port 0 asks the OS for an ephemeral port; the bound address is
    /// available on the returned [`BoundServer`].
    pub async fn bind(self) -> Result<BoundServer, StartError> {
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, self.port));
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => return Err(StartError::PortInUse { port: self.port }),
            Err(e) => return Err(StartError::Bind { source: e }),
        };
        let local_addr = listener.local_addr()?;

        Ok(BoundServer { listener, local_addr, root: self.root, open_browser: self.open_browser })
    }

    /// Binds and serves until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) -> Result<(), StartError> {
        self.bind().await?.serve(shutdown).await;
        Ok(())
    }
}

/// A server with a live listener.
pub struct BoundServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    root: PathBuf,
    open_browser: bool,
}

impl BoundServer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accepts connections until `shutdown` is cancelled.
    ///
    /// Each connection runs in its own task around an `Arc` of the one
    /// dispatcher. Cancellation stops the accept loop and returns;
    /// in-flight responses are not drained — dropping one is fine for a
    /// local preview.
    pub async fn serve(self, shutdown: CancellationToken) {
        let url = format!("http://{}/", self.local_addr);
        info!(addr = %self.local_addr, root = %self.root.display(), "preview server listening");

        if self.open_browser {
            // best effort: a preview without a browser is still a preview
            if let Err(e) = open::that_detached(&url) {
                warn!(cause = %e, url = %url, "failed to open browser");
            }
        }

        let handler = Arc::new(Dispatcher::new(self.root));

        loop {
            select! {
                _ = shutdown.cancelled() => {
                    info!("shutdown requested, stopping preview server");
                    return;
                }

                accepted = self.listener.accept() => {
                    let (tcp_stream, _remote_addr) = match accepted {
                        Ok(stream_and_addr) => stream_and_addr,
                        Err(e) => {
                            warn!(cause = %e, "failed to accept");
                            continue;
                        }
                    };

                    let handler = handler.clone();

                    tokio::spawn(async move {
                        let (reader, writer) = tcp_stream.into_split();
                        let connection = HttpConnection::new(reader, writer);
                        if let Err(e) = connection.process(handler).await {
                            debug!("connection closed with error: {}", e);
                        }
                    });
                }
            }
        }
    }
}

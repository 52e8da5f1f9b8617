//! A minimal asynchronous HTTP/1.1 server layer
//!
//! This crate carries just enough of the HTTP/1.1 protocol to serve a local,
//! read-only site preview: request heads are decoded from the wire, handed to
//! a [`handler::Handler`], and the handler's fully materialized response is
//! encoded back. It is built on top of tokio and `tokio_util`'s codec
//! framing.
//!
//! # Example
//!
//! ```no_run
//! use std::convert::Infallible;
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use http::{Response, StatusCode};
//! use tokio::net::TcpListener;
//! use tracing::{Level, error, info, warn};
//! use tracing_subscriber::FmtSubscriber;
//!
//! use transcript_http::connection::HttpConnection;
//! use transcript_http::handler::make_handler;
//! use transcript_http::protocol::RequestHeader;
//!
//! #[tokio::main]
//! async fn main() {
//!     let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
//!     tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
//!
//!     let tcp_listener = match TcpListener::bind("127.0.0.1:8080").await {
//!         Ok(tcp_listener) => tcp_listener,
//!         Err(e) => {
//!             error!(cause = %e, "bind server error");
//!             return;
//!         }
//!     };
//!
//!     let handler = Arc::new(make_handler(hello_world));
//!
//!     loop {
//!         let (tcp_stream, _remote_addr) = match tcp_listener.accept().await {
//!             Ok(stream_and_addr) => stream_and_addr,
//!             Err(e) => {
//!                 warn!(cause = %e, "failed to accept");
//!                 continue;
//!             }
//!         };
//!
//!         let handler = handler.clone();
//!
//!         tokio::spawn(async move {
//!             let (reader, writer) = tcp_stream.into_split();
//!             let connection = HttpConnection::new(reader, writer);
//!             if let Err(e) = connection.process(handler).await {
//!                 info!("connection shutdown, cause {}", e);
//!             }
//!         });
//!     }
//! }
//!
//! async fn hello_world(request: RequestHeader) -> Result<Response<Bytes>, Infallible> {
//!     info!("request path {}", request.uri().path());
//!     let body = Bytes::from_static(b"Hello World!\r\n");
//!     Ok(Response::builder().status(StatusCode::OK).body(body).unwrap())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`connection`]: connection lifecycle, one request/response at a time
//!   with keep-alive
//! - [`protocol`]: request head and error types
//! - [`codec`]: wire-level decoding and encoding
//! - [`handler`]: the request handler trait and function adapters
//!
//! # Limitations
//!
//! - HTTP/1.1 only
//! - No TLS (this layer only ever listens on localhost)
//! - Request bodies are refused at parse time; the preview surface is
//!   GET/HEAD only
//! - Maximum header size: 8KB, maximum number of headers: 64

pub mod codec;
pub mod connection;
pub mod handler;
pub mod protocol;

mod utils;
pub(crate) use utils::ensure;

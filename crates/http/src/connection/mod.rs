//! HTTP connection handling.
//!
//! [`HttpConnection`] owns one accepted stream and processes requests on it
//! until the peer goes away: decode a request head, hand it to the handler,
//! encode the response, repeat. Keep-alive falls out of the loop; there is
//! no per-connection state beyond the framing buffers.

mod http_connection;

pub use http_connection::HttpConnection;

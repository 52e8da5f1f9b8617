//! Wire-level codec for HTTP messages.
//!
//! - [`RequestDecoder`]: decodes one request head per request; requests that
//!   announce a body are refused
//! - [`ResponseEncoder`]: encodes a complete `http::Response<Bytes>` in one
//!   pass, since every response body here is a fully materialized file

mod request_decoder;
mod response_encoder;

pub use request_decoder::RequestDecoder;
pub use response_encoder::ResponseEncoder;

//! HTTP response encoder
//!
//! Serializes a complete `http::Response<Bytes>` into the write buffer:
//! status line, headers, then the body bytes. Bodies here are always fully
//! materialized, so there is no chunked path.
//!
//! The encoder trusts the headers it is given. A missing `Content-Length` is
//! filled in from the body for statuses that carry one, but an existing
//! value is never overwritten: HEAD responses set the length of the body
//! they deliberately omit, and 304 responses carry no framing headers at
//! all.

use std::io;
use std::io::{ErrorKind, Write};

use bytes::{BufMut, Bytes, BytesMut};
use http::{HeaderValue, Response, StatusCode, Version, header};
use tokio_util::codec::Encoder;
use tracing::error;

use crate::protocol::SendError;

/// Initial buffer size reserved for header serialization
const INIT_HEADER_SIZE: usize = 4 * 1024;

/// Encoder for HTTP responses implementing the [`Encoder`] trait.
pub struct ResponseEncoder;

impl Encoder<Response<Bytes>> for ResponseEncoder {
    type Error = SendError;

    fn encode(&mut self, response: Response<Bytes>, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let (mut parts, body) = response.into_parts();

        dst.reserve(INIT_HEADER_SIZE + body.len());
        match parts.version {
            Version::HTTP_11 => {
                write!(FastWrite(dst), "HTTP/1.1 {} {}\r\n", parts.status.as_str(), parts.status.canonical_reason().unwrap_or("Unknown"))
                    .map_err(SendError::io)?;
            }
            v => {
                error!(http_version = ?v, "unsupported http version");
                return Err(io::Error::from(ErrorKind::Unsupported).into());
            }
        }

        if takes_content_length(parts.status) && !parts.headers.contains_key(header::CONTENT_LENGTH) {
            parts.headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        }

        for (header_name, header_value) in parts.headers.iter() {
            dst.put_slice(header_name.as_ref());
            dst.put_slice(b": ");
            dst.put_slice(header_value.as_ref());
            dst.put_slice(b"\r\n");
        }
        dst.put_slice(b"\r\n");

        if !body.is_empty() {
            dst.put_slice(&body);
        }
        Ok(())
    }
}

/// Whether responses with this status carry a `Content-Length` header.
///
/// 1xx, 204 and 304 responses are defined to have no body, and 304 in
/// particular must echo only its validator.
fn takes_content_length(status: StatusCode) -> bool {
    !(status.is_informational() || status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED)
}

/// Fast writer implementation for writing to BytesMut.
///
/// Space is reserved up front, so every write is a straight copy.
struct FastWrite<'a>(&'a mut BytesMut);

impl Write for FastWrite<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.put_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

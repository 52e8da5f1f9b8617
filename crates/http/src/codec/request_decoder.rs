//! HTTP request head decoder
//!
//! Parses request heads with `httparse` using a streaming approach: the
//! decoder reports `None` until a complete head sits in the buffer, then
//! yields a [`RequestHeader`] and leaves the buffer positioned after the
//! head.
//!
//! # Limits
//!
//! - Maximum number of headers: 64
//! - Maximum head size: 8KB
//! - HTTP/1.0 and HTTP/1.1 only
//! - Requests that announce a body are rejected with
//!   [`ParseError::UnsupportedBody`]
//!
//! # Implementation Details
//!
//! Parsing records the byte ranges of header names and values instead of
//! copying them, then builds the typed `http` structures from a single
//! frozen slice of the read buffer.

use std::mem::MaybeUninit;

use bytes::BytesMut;
use http::{HeaderName, HeaderValue, Request};
use httparse::{Error, Status};
use tokio_util::codec::Decoder;
use tracing::trace;

use crate::ensure;
use crate::protocol::{ParseError, RequestHeader};

/// Maximum number of headers allowed in a request
const MAX_HEADER_NUM: usize = 64;

/// Maximum size in bytes allowed for the entire head section
const MAX_HEADER_BYTES: usize = 8 * 1024;

/// Decoder for HTTP request heads implementing the [`Decoder`] trait.
pub struct RequestDecoder;

impl Decoder for RequestDecoder {
    type Item = RequestHeader;
    type Error = ParseError;

    /// Attempts to decode a request head from the provided buffer.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(header))` if a complete head was successfully parsed
    /// - `Ok(None)` if more data is needed
    /// - `Err(ParseError)` if parsing failed or a limit was exceeded
    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Fast path: minimum valid request is "GET / HTTP/1.1\r\n\r\n"
        if src.len() < 14 {
            return Ok(None);
        }

        let mut req = httparse::Request::new(&mut []);
        // SAFETY: an uninitialized array of `MaybeUninit` is always valid,
        // and httparse only reads slots it has written.
        let mut headers: [MaybeUninit<httparse::Header>; MAX_HEADER_NUM] = unsafe { MaybeUninit::uninit().assume_init() };

        let parsed_result = req.parse_with_uninit_headers(src, &mut headers).map_err(|e| match e {
            Error::TooManyHeaders => ParseError::too_many_headers(MAX_HEADER_NUM),
            e => ParseError::invalid_header(e.to_string()),
        });

        match parsed_result? {
            Status::Complete(head_size) => {
                trace!(head_size, "parsed request head");
                ensure!(head_size <= MAX_HEADER_BYTES, ParseError::too_large_header(head_size, MAX_HEADER_BYTES));

                let header_count = req.headers.len();
                ensure!(header_count <= MAX_HEADER_NUM, ParseError::too_many_headers(header_count));

                // Record byte range indices for each header before the
                // borrow of `src` ends
                let mut header_index: [HeaderIndex; MAX_HEADER_NUM] = EMPTY_HEADER_INDEX_ARRAY;
                HeaderIndex::record(src, req.headers, &mut header_index);

                let version = match req.version {
                    Some(0) => http::Version::HTTP_10,
                    Some(1) => http::Version::HTTP_11,
                    // HTTP/2 and HTTP/3 not supported
                    _ => return Err(ParseError::InvalidVersion(req.version)),
                };

                let mut header_builder = Request::builder()
                    .method(req.method.ok_or(ParseError::InvalidMethod)?)
                    .uri(req.path.ok_or(ParseError::InvalidUri)?)
                    .version(version);

                let headers = header_builder.headers_mut().unwrap();
                headers.reserve(header_count);

                // Split the head portion off the read buffer
                let header_bytes = src.split_to(head_size).freeze();
                for index in &header_index[..header_count] {
                    // Safe to unwrap since httparse verified the header name
                    // is valid ASCII
                    let name = HeaderName::from_bytes(&header_bytes[index.name.0..index.name.1]).unwrap();

                    // SAFETY: httparse verified the header value contains
                    // only visible ASCII chars
                    let value = unsafe { HeaderValue::from_maybe_shared_unchecked(header_bytes.slice(index.value.0..index.value.1)) };

                    headers.append(name, value);
                }

                let header = RequestHeader::from(header_builder.body(()).map_err(|e| ParseError::invalid_header(e.to_string()))?);

                // Request bodies are a product non-goal; refuse them at the
                // wire instead of silently desyncing the framing
                ensure!(!header.declares_body(), ParseError::unsupported_body(format!("{} {}", header.method(), header.uri())));

                Ok(Some(header))
            }
            Status::Partial => {
                ensure!(src.len() <= MAX_HEADER_BYTES, ParseError::too_large_header(src.len(), MAX_HEADER_BYTES));
                Ok(None)
            }
        }
    }
}

/// Stores the byte range positions of a header's name and value within the
/// original buffer, so headers are built without copying out of the parse.
#[derive(Clone, Copy)]
struct HeaderIndex {
    name: (usize, usize),
    value: (usize, usize),
}

const EMPTY_HEADER_INDEX: HeaderIndex = HeaderIndex { name: (0, 0), value: (0, 0) };

const EMPTY_HEADER_INDEX_ARRAY: [HeaderIndex; MAX_HEADER_NUM] = [EMPTY_HEADER_INDEX; MAX_HEADER_NUM];

impl HeaderIndex {
    fn record(bytes: &[u8], headers: &[httparse::Header<'_>], indices: &mut [HeaderIndex]) {
        let bytes_ptr = bytes.as_ptr() as usize;
        for (header, indices) in headers.iter().zip(indices.iter_mut()) {
            let name_start = header.name.as_ptr() as usize - bytes_ptr;
            let name_end = name_start + header.name.len();
            indices.name = (name_start, name_end);
            let value_start = header.value.as_ptr() as usize - bytes_ptr;
            let value_end = value_start + header.value.len();
            indices.value = (value_start, value_end);
        }
    }
}

#[cfg(test)]
mod tests {
    use http::{Method, Version};
    use indoc::indoc;

    use super::*;

    #[test]
    fn from_curl() {
        let str = indoc! {r##"
        GET /index.html HTTP/1.1
        Host: 127.0.0.1:8080
        User-Agent: curl/7.79.1
        Accept: */*

        "##};

        let mut buf = BytesMut::from(str);

        let header = RequestDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(header.method(), &Method::GET);
        assert_eq!(header.version(), Version::HTTP_11);
        assert_eq!(header.uri().path(), "/index.html");
        assert_eq!(header.uri().query(), None);
        assert_eq!(header.headers().len(), 3);
        assert_eq!(header.headers().get(http::header::HOST), Some(&HeaderValue::from_static("127.0.0.1:8080")));
        assert!(buf.is_empty());
    }

    #[test]
    fn head_with_validator() {
        let str = indoc! {r##"
        HEAD /style.abcd1234.css HTTP/1.1
        Host: 127.0.0.1:8080
        If-None-Match: W/"deadbeef"

        "##};

        let mut buf = BytesMut::from(str);

        let header = RequestDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(header.method(), &Method::HEAD);
        assert_eq!(header.if_none_match(), Some("W/\"deadbeef\""));
    }

    #[test]
    fn partial_head_needs_more_data() {
        let mut buf = BytesMut::from("GET /index.html HTTP/1.1\r\nHost: 127.0.0.1");

        let result = RequestDecoder.decode(&mut buf).unwrap();

        assert!(result.is_none());
        // nothing consumed until the head is complete
        assert_eq!(&buf[..4], b"GET ");
    }

    #[test]
    fn two_requests_back_to_back() {
        let str = "GET /a HTTP/1.1\r\n\r\nGET /b HTTP/1.1\r\n\r\n";
        let mut buf = BytesMut::from(str);

        let first = RequestDecoder.decode(&mut buf).unwrap().unwrap();
        let second = RequestDecoder.decode(&mut buf).unwrap().unwrap();

        assert_eq!(first.uri().path(), "/a");
        assert_eq!(second.uri().path(), "/b");
        assert!(buf.is_empty());
    }

    #[test]
    fn declared_body_is_refused() {
        let str = indoc! {r##"
        POST /upload HTTP/1.1
        Host: 127.0.0.1:8080
        Content-Length: 5

        hello"##};

        let mut buf = BytesMut::from(str);

        let result = RequestDecoder.decode(&mut buf);

        assert!(matches!(result, Err(ParseError::UnsupportedBody { .. })));
    }

    #[test]
    fn zero_content_length_is_fine() {
        let str = indoc! {r##"
        POST /upload HTTP/1.1
        Host: 127.0.0.1:8080
        Content-Length: 0

        "##};

        let mut buf = BytesMut::from(str);

        let header = RequestDecoder.decode(&mut buf).unwrap().unwrap();
        assert_eq!(header.method(), &Method::POST);
    }

    #[test]
    fn oversized_head_is_refused() {
        let mut big = String::from("GET / HTTP/1.1\r\n");
        for i in 0..400 {
            big.push_str(&format!("X-Filler-{i}: {}\r\n", "y".repeat(20)));
        }
        big.push_str("\r\n");

        let mut buf = BytesMut::from(big.as_str());

        let result = RequestDecoder.decode(&mut buf);

        assert!(matches!(result, Err(ParseError::TooManyHeaders { .. }) | Err(ParseError::TooLargeHeader { .. })));
    }
}

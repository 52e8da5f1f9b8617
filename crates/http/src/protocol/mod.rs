//! Core HTTP protocol abstractions.
//!
//! The protocol module holds the types shared between the codec and the
//! connection layer:
//!
//! - [`RequestHeader`]: a decoded request head (there are no request bodies
//!   in this server)
//! - [`HttpError`], [`ParseError`], [`SendError`]: the error taxonomy for
//!   receiving and sending

mod request;
pub use request::RequestHeader;

mod error;
pub use error::HttpError;
pub use error::ParseError;
pub use error::SendError;

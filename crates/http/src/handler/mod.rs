use std::error::Error;
use std::future::Future;

use async_trait::async_trait;
use bytes::Bytes;
use http::Response;

use crate::protocol::RequestHeader;

/// A request handler.
///
/// Responses are complete `Bytes` bodies: everything this server delivers is
/// a small generated file that is read whole.
#[async_trait]
pub trait Handler: Send + Sync {
    type Error: Into<Box<dyn Error + Send + Sync>>;

    async fn call(&self, request: RequestHeader) -> Result<Response<Bytes>, Self::Error>;
}

/// Adapter implementing [`Handler`] for a plain async function.
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<Err, F, Fut> Handler for HandlerFn<F>
where
    F: Fn(RequestHeader) -> Fut + Send + Sync,
    Err: Into<Box<dyn Error + Send + Sync>>,
    Fut: Future<Output = Result<Response<Bytes>, Err>> + Send,
{
    type Error = Err;

    async fn call(&self, request: RequestHeader) -> Result<Response<Bytes>, Self::Error> {
        (self.f)(request).await
    }
}

pub fn make_handler<F, Err, Ret>(f: F) -> HandlerFn<F>
where
    Err: Into<Box<dyn Error + Send + Sync>>,
    Ret: Future<Output = Result<Response<Bytes>, Err>>,
    F: Fn(RequestHeader) -> Ret,
{
    HandlerFn { f }
}

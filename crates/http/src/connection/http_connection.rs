use std::sync::Arc;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use http::{Response, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{error, info};

use crate::codec::{RequestDecoder, ResponseEncoder};
use crate::handler::Handler;
use crate::protocol::HttpError;

/// An HTTP connection that manages request processing
///
/// `HttpConnection` handles the full lifecycle of a connection:
/// - Reading and decoding request heads
/// - Invoking the handler
/// - Writing the encoded response back
/// - Serving follow-up requests on the same connection (keep-alive)
///
/// # Type Parameters
///
/// * `R`: The async readable stream type
/// * `W`: The async writable stream type
pub struct HttpConnection<R, W> {
    framed_read: FramedRead<R, RequestDecoder>,
    framed_write: FramedWrite<W, ResponseEncoder>,
}

impl<R, W> HttpConnection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            framed_read: FramedRead::with_capacity(reader, RequestDecoder, 8 * 1024),
            framed_write: FramedWrite::new(writer, ResponseEncoder),
        }
    }

    pub async fn process<H>(mut self, handler: Arc<H>) -> Result<(), HttpError>
    where
        H: Handler,
    {
        loop {
            match self.framed_read.next().await {
                Some(Ok(header)) => {
                    let response_result = handler.call(header).await;
                    self.send_response(response_result).await?;
                }

                Some(Err(e)) => {
                    error!("can't receive next request, cause {}", e);
                    let error_response = build_error_response(StatusCode::BAD_REQUEST);
                    self.framed_write.send(error_response).await.map_err(HttpError::from)?;
                    return Err(e.into());
                }

                None => {
                    info!("cant read more request, break this connection down");
                    return Ok(());
                }
            }
        }
    }

    async fn send_response<E>(&mut self, response_result: Result<Response<Bytes>, E>) -> Result<(), HttpError>
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let response = match response_result {
            Ok(response) => response,
            Err(e) => {
                error!("handle response error, cause: {}", e.into());
                build_error_response(StatusCode::INTERNAL_SERVER_ERROR)
            }
        };

        self.framed_write.send(response).await.map_err(HttpError::from)
    }
}

fn build_error_response(status_code: StatusCode) -> Response<Bytes> {
    Response::builder().status(status_code).body(Bytes::new()).unwrap()
}

//! The transport seam.
//!
//! The client builds a complete `Request<Bytes>` and hands it to a
//! [`Transport`]; how it reaches the server is up to the implementation.
//! Timeouts configured on the client arrive as a
//! [`RequestTimeout`](crate::RequestTimeout) request extension.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};

/// Delivers requests and returns responses.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and waits for the full response.
    async fn send(&self, request: Request<Bytes>) -> anyhow::Result<Response<Bytes>>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Request<Bytes>) -> anyhow::Result<Response<Bytes>> {
        (**self).send(request).await
    }
}

#[cfg(feature = "reqwest")]
pub use self::reqwest_transport::ReqwestTransport;

#[cfg(feature = "reqwest")]
mod reqwest_transport {
    use super::{async_trait, Bytes, Request, Response, Transport};
    use crate::config::RequestTimeout;

    /// A [`Transport`] over a real HTTP connection pool.
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestTransport {
        client: reqwest::Client,
    }

    impl ReqwestTransport {
        /// Wraps an existing client.
        #[must_use]
        pub fn new(client: reqwest::Client) -> Self {
            Self { client }
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn send(&self, request: Request<Bytes>) -> anyhow::Result<Response<Bytes>> {
            let timeout = request.extensions().get::<RequestTimeout>().copied();
            let (parts, body) = request.into_parts();

            let mut builder = self
                .client
                .request(parts.method, parts.uri.to_string())
                .headers(parts.headers)
                .body(body);
            if let Some(RequestTimeout(timeout)) = timeout {
                builder = builder.timeout(timeout);
            }

            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;

            let mut out = Response::new(body);
            *out.status_mut() = status;
            *out.headers_mut() = headers;
            Ok(out)
        }
    }
}

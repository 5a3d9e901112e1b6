use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use url::Url;

use crate::data::{ByteRange, ProbeResponse};

/// A boxed stream type for HTTP response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Response to a ranged GET.
///
/// The status is reported as-is; deciding whether it is acceptable is left
/// to the caller.
pub struct RangeResponse<E> {
    /// HTTP status code.
    pub status: u16,
    /// Raw `Content-Range` header value, if present.
    pub content_range: Option<String>,
    /// Response body.
    pub body: BoxStream<'static, Result<Bytes, E>>,
}

/// Asynchronous HTTP transport used by the downloader.
///
/// This trait provides the two requests a ranged download needs. It is
/// `'static` because chunk workers run as spawned tasks sharing the client.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync + 'static {
    /// Error type for HTTP operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Capability probe, usually a HEAD request.
    ///
    /// Returns the status together with the raw `Content-Length` and
    /// `Accept-Ranges` information. Implementations must read the content
    /// length from the response headers, not from the (empty) body.
    fn probe(
        &self,
        url: &Url,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<ProbeResponse, Self::Error>> + Send;

    /// GET carrying `Range: bytes=<start>-<end>` for `range`.
    ///
    /// # Errors
    ///
    /// Returns an error only for transport failures (DNS, connection,
    /// timeout). HTTP error statuses are reported through
    /// [`RangeResponse::status`].
    fn get_range(
        &self,
        url: &Url,
        range: ByteRange,
        headers: &[(String, String)],
    ) -> impl Future<Output = Result<RangeResponse<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use futures_util::StreamExt;
    use reqwest::header;

    use super::*;
    use crate::error::{Error, Result};

    /// Production HTTP client implementation using reqwest.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    /// Builder for [`ReqwestClient`].
    #[derive(Debug, Clone, Default)]
    pub struct ReqwestClientBuilder {
        connect_timeout: Option<Duration>,
        read_timeout: Option<Duration>,
        user_agent: Option<String>,
    }

    impl ReqwestClientBuilder {
        #[must_use]
        pub fn connect_timeout(mut self, timeout: Duration) -> Self {
            self.connect_timeout = Some(timeout);
            self
        }

        /// Timeout for each read of a response body.
        #[must_use]
        pub fn read_timeout(mut self, timeout: Duration) -> Self {
            self.read_timeout = Some(timeout);
            self
        }

        #[must_use]
        pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
            self.user_agent = Some(user_agent.into());
            self
        }

        pub fn build(self) -> Result<ReqwestClient> {
            let mut builder = reqwest::Client::builder();
            if let Some(timeout) = self.connect_timeout {
                builder = builder.connect_timeout(timeout);
            }
            if let Some(timeout) = self.read_timeout {
                builder = builder.read_timeout(timeout);
            }
            if let Some(user_agent) = self.user_agent {
                builder = builder.user_agent(user_agent);
            }
            let client = builder.build().map_err(Error::transport)?;
            Ok(ReqwestClient { client })
        }
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Result<Self> { Self::builder().build() }

        pub fn builder() -> ReqwestClientBuilder { ReqwestClientBuilder::default() }

        /// Wrap an already configured `reqwest::Client`.
        pub fn from_client(client: reqwest::Client) -> Self { Self { client } }

        fn request(
            &self,
            method: reqwest::Method,
            url: &Url,
            headers: &[(String, String)],
        ) -> reqwest::RequestBuilder {
            let mut request = self.client.request(method, url.clone());
            for (key, value) in headers {
                request = request.header(key, value);
            }
            request
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = reqwest::Error;

        async fn probe(
            &self,
            url: &Url,
            headers: &[(String, String)],
        ) -> std::result::Result<ProbeResponse, Self::Error> {
            let response = self
                .request(reqwest::Method::HEAD, url, headers)
                .send()
                .await?;
            let headers = response.headers();

            let content_length = headers
                .get(header::CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok());
            let accept_ranges = headers
                .get(header::ACCEPT_RANGES)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            Ok(ProbeResponse {
                status: response.status().as_u16(),
                content_length,
                accept_ranges,
            })
        }

        async fn get_range(
            &self,
            url: &Url,
            range: ByteRange,
            headers: &[(String, String)],
        ) -> std::result::Result<RangeResponse<Self::Error>, Self::Error> {
            let response = self
                .request(reqwest::Method::GET, url, headers)
                .header(header::RANGE, range.header_value())
                .send()
                .await?;

            let content_range = response
                .headers()
                .get(header::CONTENT_RANGE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);

            Ok(RangeResponse {
                status: response.status().as_u16(),
                content_range,
                body: response.bytes_stream().boxed(),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ReqwestClient, ReqwestClientBuilder};

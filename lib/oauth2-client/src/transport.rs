//! HTTP transport abstraction.
//!
//! The client only needs to send a request and read back a status, headers
//! and body. [`ReqwestTransport`] is the default implementation; other
//! transports (or test doubles) implement [`HttpTransport`].

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use http::header::USER_AGENT;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use tracing::debug;
use url::Url;

use crate::TransportError;
use crate::config::ConnectionOptions;

/// Boxed future returned by [`HttpTransport::execute`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An outgoing HTTP request, fully resolved.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, query string included.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body, if any.
    pub body: Option<Bytes>,
}

/// A raw HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers (case-insensitive, multi-valued).
    pub headers: HeaderMap,
    /// Raw body.
    pub body: Bytes,
}

/// Sends HTTP requests on behalf of the client.
///
/// Implementations must not follow redirects: the client applies its own
/// redirect policy.
pub trait HttpTransport: Debug + Send + Sync {
    /// Sends the request and reads the whole response.
    fn execute(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>>;
}

/// [`HttpTransport`] backed by `reqwest`, with redirects disabled.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport applying the connection options.
    ///
    /// # Errors
    ///
    /// Returns an error if the user agent is not a valid header value or if
    /// the reqwest client cannot be built.
    pub fn new(options: &ConnectionOptions) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());
        if let Some(timeout) = options.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &options.user_agent {
            let value =
                HeaderValue::from_str(user_agent).map_err(|err| TransportError::Other {
                    message: format!("invalid user agent: {err}"),
                })?;
            let mut headers = HeaderMap::new();
            headers.insert(USER_AGENT, value);
            builder = builder.default_headers(headers);
        }

        let client = builder.build()?;
        Ok(Self { client })
    }

    /// Wraps an existing reqwest client.
    ///
    /// The client should be configured with `redirect::Policy::none()`.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl HttpTransport for ReqwestTransport {
    fn execute(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, TransportError>> {
        Box::pin(async move {
            let HttpRequest {
                method,
                url,
                headers,
                body,
            } = request;

            let mut builder = self.client.request(method, url).headers(headers);
            if let Some(body) = body {
                builder = builder.body(body);
            }

            let response = builder.send().await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await?;
            debug!(%status, length = body.len(), "transport response");

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        })
    }
}

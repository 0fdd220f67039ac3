use std::str::FromStr;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::transport::HttpResponse;
use crate::{OAuth2Error, ProviderError};

/// How a response body is interpreted by [`Response::parse`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Chosen from the `Content-Type` header.
    #[default]
    Automatic,
    /// Always decoded as JSON.
    Json,
    /// Always decoded as `application/x-www-form-urlencoded`.
    Query,
}

impl FromStr for ParseMode {
    type Err = OAuth2Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "automatic" => Ok(Self::Automatic),
            "json" => Ok(Self::Json),
            "query" => Ok(Self::Query),
            _ => Err(OAuth2Error::Configuration {
                reason: format!("unknown parse mode '{value}', expected automatic, json or query"),
            }),
        }
    }
}

/// An HTTP response received from the provider.
///
/// When a 4xx/5xx response is handed back with error raising disabled,
/// [`error`](Self::error) holds the [`ProviderError`] built from it.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    parse_mode: ParseMode,
    error: Option<Box<ProviderError>>,
}

impl Response {
    /// Wraps a raw response with the given parse mode.
    pub fn new(raw: HttpResponse, parse_mode: ParseMode) -> Self {
        let HttpResponse {
            status,
            headers,
            body,
        } = raw;
        Self {
            status,
            headers,
            body,
            parse_mode,
            error: None,
        }
    }

    /// The HTTP status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The raw body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// The `Content-Type` header value, if present and readable.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }

    /// The parse mode used by [`parse`](Self::parse).
    pub fn parse_mode(&self) -> ParseMode {
        self.parse_mode
    }

    /// The provider error attached to this response, if any.
    pub fn error(&self) -> Option<&ProviderError> {
        self.error.as_deref()
    }

    pub(crate) fn location(&self) -> Option<&str> {
        self.headers
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
    }

    pub(crate) fn attach_error(&mut self, error: ProviderError) {
        self.error = Some(Box::new(error));
    }

    pub(crate) fn without_error(&self) -> Self {
        Self {
            status: self.status,
            headers: self.headers.clone(),
            body: self.body.clone(),
            parse_mode: self.parse_mode,
            error: None,
        }
    }

    /// Parses the body according to the parse mode.
    ///
    /// In automatic mode, JSON is used for `application/json` and
    /// `text/javascript`, form decoding for
    /// `application/x-www-form-urlencoded`, and `None` is returned for any
    /// other content type. A body that fails to decode also yields `None`.
    pub fn parse(&self) -> Option<Value> {
        match self.parse_mode {
            ParseMode::Json => self.parse_json(),
            ParseMode::Query => self.parse_form(),
            ParseMode::Automatic => {
                let content_type = self.content_type()?.to_ascii_lowercase();
                if content_type.contains(mime::APPLICATION_JSON.essence_str())
                    || content_type.contains(mime::TEXT_JAVASCRIPT.essence_str())
                {
                    self.parse_json()
                } else if content_type
                    .contains(mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
                {
                    self.parse_form()
                } else {
                    None
                }
            }
        }
    }

    fn parse_json(&self) -> Option<Value> {
        serde_json::from_slice(&self.body).ok()
    }

    fn parse_form(&self) -> Option<Value> {
        let pairs = serde_urlencoded::from_bytes::<Vec<(String, String)>>(&self.body).ok()?;
        let map = pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect::<Map<_, _>>();
        Some(Value::Object(map))
    }
}

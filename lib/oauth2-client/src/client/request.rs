use bytes::Bytes;
use headers::{ContentType, HeaderMapExt};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use indexmap::IndexMap;

use crate::{OAuth2Error, ParseMode};

/// Ordered request parameters.
///
/// Merging with [`Extend`] keeps the position of existing keys and lets the
/// later value win.
pub type Params = IndexMap<String, String>;

/// Merges `params` over `defaults`: explicit entries win on conflict.
pub(crate) fn merge_params(defaults: Params, params: Params) -> Params {
    let mut merged = defaults;
    merged.extend(params);
    merged
}

/// Request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Raw text body, sent as is.
    Text(String),
    /// Form pairs, sent as `application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

impl RequestBody {
    /// Appends `name=value` without touching the existing content.
    ///
    /// # Errors
    ///
    /// Returns an error if the pair cannot be form-encoded.
    pub fn append(&mut self, name: &str, value: &str) -> Result<(), OAuth2Error> {
        match self {
            Self::Text(text) => {
                let pair = serde_urlencoded::to_string(&[(name, value)])?;
                if !text.is_empty() {
                    text.push('&');
                }
                text.push_str(&pair);
            }
            Self::Form(pairs) => pairs.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    pub(crate) fn encode(&self) -> Result<(Bytes, Option<ContentType>), OAuth2Error> {
        match self {
            Self::Text(text) => Ok((Bytes::from(text.clone()), None)),
            Self::Form(pairs) => {
                let encoded = serde_urlencoded::to_string(pairs)?;
                Ok((Bytes::from(encoded), Some(ContentType::form_url_encoded())))
            }
        }
    }
}

impl From<String> for RequestBody {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for RequestBody {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<Params> for RequestBody {
    fn from(value: Params) -> Self {
        Self::Form(value.into_iter().collect())
    }
}

/// Options of a single [`Client::request`](crate::Client::request) call.
///
/// # Example
///
/// ```rust
/// use oauth2_client::{ParseMode, RequestOptions};
///
/// let options = RequestOptions::new()
///     .with_param("page", "2")
///     .with_raise_errors(false)
///     .with_parse(ParseMode::Json);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Query string for GET, DELETE and other body-less methods; form
    /// payload for POST, PUT and PATCH when no body is set.
    pub params: Params,
    /// Always sent in the query string.
    pub query: Params,
    /// Request payload.
    pub body: Option<RequestBody>,
    /// Per-call headers, overriding transport defaults.
    pub headers: HeaderMap,
    /// Raises 4xx/5xx responses for this call. Errors are raised when either
    /// this or the client option is `true`.
    pub raise_errors: Option<bool>,
    /// Body parse mode of the returned response.
    pub parse: ParseMode,
}

impl RequestOptions {
    /// Creates empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets a header, replacing previous values.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Raises errors for this call even when the client option does not.
    #[must_use]
    pub fn with_raise_errors(mut self, raise_errors: bool) -> Self {
        self.raise_errors = Some(raise_errors);
        self
    }

    /// Sets the parse mode.
    #[must_use]
    pub fn with_parse(mut self, parse: ParseMode) -> Self {
        self.parse = parse;
        self
    }

    /// Appends `name=value` to the payload.
    ///
    /// With no explicit body, a payload method gets the pair appended to its
    /// form parameters; other methods get a form body holding the pair.
    pub(crate) fn append_to_body(
        &mut self,
        method: &Method,
        name: &str,
        value: &str,
    ) -> Result<(), OAuth2Error> {
        match &mut self.body {
            Some(body) => body.append(name, value)?,
            None if sends_payload(method) => {
                // IndexMap would overwrite an existing key, so switch to pairs
                let mut pairs = self.params.drain(..).collect::<Vec<_>>();
                pairs.push((name.to_string(), value.to_string()));
                self.body = Some(RequestBody::Form(pairs));
            }
            None => {
                self.body = Some(RequestBody::Form(vec![(name.to_string(), value.to_string())]));
            }
        }
        Ok(())
    }

    /// Resolves query pairs and payload for `method`.
    pub(crate) fn resolve(
        &self,
        method: &Method,
    ) -> Result<(Vec<(String, String)>, Option<Bytes>, HeaderMap), OAuth2Error> {
        let mut query = self
            .query
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect::<Vec<_>>();
        let mut headers = self.headers.clone();

        let payload = if let Some(body) = &self.body {
            if !sends_payload(method) {
                query.extend(self.params.clone());
            }
            Some(body.encode()?)
        } else if sends_payload(method) {
            (!self.params.is_empty())
                .then(|| RequestBody::from(self.params.clone()).encode())
                .transpose()?
        } else {
            query.extend(self.params.clone());
            None
        };

        let body = payload.map(|(bytes, content_type)| {
            if let Some(content_type) = content_type
                && !headers.contains_key(http::header::CONTENT_TYPE)
            {
                headers.typed_insert(content_type);
            }
            bytes
        });

        Ok((query, body, headers))
    }

    /// Drops the payload, as required when a 303 turns the request into a GET.
    pub(crate) fn drop_payload(&mut self, method: &Method) {
        self.body = None;
        if sends_payload(method) {
            self.params.clear();
        }
        self.headers.remove(http::header::CONTENT_TYPE);
    }
}

/// Methods whose `params` travel in the body.
pub(crate) fn sends_payload(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

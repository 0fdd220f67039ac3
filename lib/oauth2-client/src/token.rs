use std::fmt;
use std::str::FromStr;

use http::header::AUTHORIZATION;
use http::{HeaderValue, Method};
use jiff::{SignedDuration, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{Client, OAuth2Error, Params, RequestOptions, Response, SecureString};

/// Default `Authorization` header format, `%s` is replaced by the token.
pub const DEFAULT_HEADER_FORMAT: &str = "Bearer %s";

/// Default parameter name for query and body transmission.
pub const DEFAULT_PARAM_NAME: &str = "bearer_token";

/// Where the access token travels in authenticated requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenMode {
    /// `Authorization` header built from the header format.
    #[default]
    Header,
    /// Query string parameter.
    Query,
    /// Form parameter appended to the request body.
    Body,
}

impl TokenMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Query => "query",
            Self::Body => "body",
        }
    }
}

impl FromStr for TokenMode {
    type Err = OAuth2Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "header" => Ok(Self::Header),
            "query" => Ok(Self::Query),
            "body" => Ok(Self::Body),
            _ => Err(OAuth2Error::Configuration {
                reason: format!("unknown token mode '{value}', expected header, query or body"),
            }),
        }
    }
}

/// Transmission options of an [`AccessToken`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenOptions {
    /// Where the token is sent.
    pub mode: TokenMode,
    /// `Authorization` header format for [`TokenMode::Header`].
    pub header_format: String,
    /// Parameter name for [`TokenMode::Query`] and [`TokenMode::Body`].
    pub param_name: String,
}

impl TokenOptions {
    /// The `mode`, `header_format` and `param_name` entries read by
    /// [`AccessToken::from_hash`].
    pub fn to_hash(&self) -> Map<String, Value> {
        Map::from_iter([
            ("mode".to_string(), self.mode.as_str().into()),
            ("header_format".to_string(), self.header_format.clone().into()),
            ("param_name".to_string(), self.param_name.clone().into()),
        ])
    }
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            mode: TokenMode::default(),
            header_format: DEFAULT_HEADER_FORMAT.to_string(),
            param_name: DEFAULT_PARAM_NAME.to_string(),
        }
    }
}

/// An OAuth2 access token, bound to the client that issued it.
///
/// Expiry is kept as an absolute timestamp computed when the token is
/// created, so [`is_expired`](Self::is_expired) does not depend on when the
/// token is inspected.
///
/// # Example
///
/// ```rust,no_run
/// use oauth2_client::{AccessToken, Client, TokenMode, TokenOptions};
///
/// # async fn example() -> Result<(), oauth2_client::OAuth2Error> {
/// let client = Client::builder("client-id", "client-secret")
///     .with_site("https://provider.example.com")
///     .build()?;
///
/// let token = AccessToken::new(client, "my-token")
///     .with_refresh_token("my-refresh-token")
///     .with_expires_in(3600)?
///     .with_options(TokenOptions {
///         mode: TokenMode::Query,
///         ..TokenOptions::default()
///     });
///
/// let token = if token.is_expired() {
///     token.refresh(Default::default()).await?
/// } else {
///     token
/// };
/// let response = token.get("/api/me", Default::default()).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct AccessToken {
    client: Client,
    token: SecureString,
    refresh_token: Option<SecureString>,
    expires_in: Option<i64>,
    expires_at: Option<Timestamp>,
    params: Map<String, Value>,
    options: TokenOptions,
}

// Create
impl AccessToken {
    /// Creates a token with no refresh token, no expiry and default options.
    pub fn new(client: Client, token: impl Into<SecureString>) -> Self {
        Self {
            client,
            token: token.into(),
            refresh_token: None,
            expires_in: None,
            expires_at: None,
            params: Map::new(),
            options: TokenOptions::default(),
        }
    }

    /// Sets the refresh token.
    #[must_use]
    pub fn with_refresh_token(mut self, refresh_token: impl Into<SecureString>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Sets the lifetime in seconds; the token expires `seconds` from now.
    ///
    /// # Errors
    ///
    /// Returns an error if the expiry timestamp is out of range.
    pub fn with_expires_in(mut self, seconds: i64) -> Result<Self, OAuth2Error> {
        let expires_at = Timestamp::now().checked_add(SignedDuration::from_secs(seconds))?;
        self.expires_in = Some(seconds);
        self.expires_at = Some(expires_at);
        Ok(self)
    }

    /// Sets the absolute expiry.
    #[must_use]
    pub fn with_expires_at(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Sets the extra provider parameters.
    #[must_use]
    pub fn with_params(mut self, params: Map<String, Value>) -> Self {
        self.params = params;
        self
    }

    /// Sets the transmission options.
    #[must_use]
    pub fn with_options(mut self, options: TokenOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds a token from a flat mapping, typically a token endpoint response.
    ///
    /// `access_token` is required. `expires_in` (or its alias `expires`),
    /// `expires_at` (epoch seconds), `refresh_token`, `mode`,
    /// `header_format` and `param_name` are recognized; numbers may be JSON
    /// numbers or numeric strings. Any other key is kept as an extra
    /// parameter. An explicit `expires_at` takes precedence over the one
    /// computed from `expires_in`.
    ///
    /// # Errors
    ///
    /// Fails if `access_token` is missing, a number is malformed, or `mode`
    /// is unknown.
    pub fn from_hash(client: Client, mut hash: Map<String, Value>) -> Result<Self, OAuth2Error> {
        let token = hash
            .remove("access_token")
            .and_then(text)
            .ok_or_else(|| OAuth2Error::InvalidTokenHash {
                reason: "missing access_token".to_string(),
            })?;

        let expires_in = match hash.remove("expires_in") {
            Some(value) => {
                hash.remove("expires");
                seconds("expires_in", value)?
            }
            None => match hash.remove("expires") {
                Some(value) => seconds("expires", value)?,
                None => None,
            },
        };
        let expires_at = hash
            .remove("expires_at")
            .map(|value| seconds("expires_at", value))
            .transpose()?
            .flatten()
            .map(Timestamp::from_second)
            .transpose()?;
        let refresh_token = hash.remove("refresh_token").and_then(text);

        let mut options = TokenOptions::default();
        if let Some(mode) = hash.remove("mode").and_then(text) {
            options.mode = mode.parse()?;
        }
        if let Some(header_format) = hash.remove("header_format").and_then(text) {
            options.header_format = header_format;
        }
        if let Some(param_name) = hash.remove("param_name").and_then(text) {
            options.param_name = param_name;
        }

        let mut result = Self::new(client, token)
            .with_params(hash)
            .with_options(options);
        if let Some(refresh_token) = refresh_token {
            result = result.with_refresh_token(refresh_token);
        }
        if let Some(expires_in) = expires_in {
            result = result.with_expires_in(expires_in)?;
        }
        if let Some(expires_at) = expires_at {
            result = result.with_expires_at(expires_at);
        }
        Ok(result)
    }

    /// Builds a token from an `application/x-www-form-urlencoded` string.
    ///
    /// # Errors
    ///
    /// Fails if the string cannot be decoded, or as [`from_hash`](Self::from_hash).
    pub fn from_url_encoded_form(client: Client, form: &str) -> Result<Self, OAuth2Error> {
        let pairs = serde_urlencoded::from_str::<Vec<(String, String)>>(form).map_err(|err| {
            OAuth2Error::InvalidTokenHash {
                reason: format!("invalid form: {err}"),
            }
        })?;
        let hash = pairs
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        Self::from_hash(client, hash)
    }

    /// The mapping representation accepted by [`from_hash`](Self::from_hash).
    ///
    /// Holds the secrets in clear: store it accordingly.
    pub fn to_hash(&self) -> Map<String, Value> {
        let mut hash = self.params.clone();
        hash.insert("access_token".to_string(), self.token.as_str().into());
        if let Some(refresh_token) = &self.refresh_token {
            hash.insert("refresh_token".to_string(), refresh_token.as_str().into());
        }
        if let Some(expires_in) = self.expires_in {
            hash.insert("expires_in".to_string(), expires_in.into());
        }
        if let Some(expires_at) = self.expires_at {
            hash.insert("expires_at".to_string(), expires_at.as_second().into());
        }
        hash.extend(self.options.to_hash());
        hash
    }
}

fn text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text),
        other => Some(other.to_string()),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn seconds(key: &str, value: Value) -> Result<Option<i64>, OAuth2Error> {
    let invalid = || OAuth2Error::InvalidTokenHash {
        reason: format!("'{key}' is not a number of seconds"),
    };
    match value {
        Value::Null => Ok(None),
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float as i64))
            .map(Some)
            .ok_or_else(invalid),
        Value::String(text) if text.trim().is_empty() => Ok(None),
        Value::String(text) => text.trim().parse().map(Some).map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

// Accessors
impl AccessToken {
    /// The access token value.
    pub fn token(&self) -> &str {
        self.token.as_str()
    }

    /// The refresh token value.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(SecureString::as_str)
    }

    /// The lifetime in seconds given when the token was created.
    pub fn expires_in(&self) -> Option<i64> {
        self.expires_in
    }

    /// The absolute expiry.
    pub fn expires_at(&self) -> Option<Timestamp> {
        self.expires_at
    }

    /// Extra parameters returned by the provider, e.g. `scope`.
    pub fn params(&self) -> &Map<String, Value> {
        &self.params
    }

    /// An extra parameter.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }

    /// The transmission options.
    pub fn options(&self) -> &TokenOptions {
        &self.options
    }

    /// The client this token was issued by.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Whether the token has a known expiry.
    pub fn expires(&self) -> bool {
        self.expires_at.is_some()
    }

    /// Whether the token has a known expiry in the past.
    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at < Timestamp::now())
    }
}

// Requests
impl AccessToken {
    /// Sends a request through the client, carrying this token.
    ///
    /// # Errors
    ///
    /// Fails if the token cannot be used as a header value, or as
    /// [`Client::request`].
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        mut options: RequestOptions,
    ) -> Result<Response, OAuth2Error> {
        let token = self.token.as_str();
        match self.options.mode {
            TokenMode::Header => {
                let mut value =
                    HeaderValue::from_str(&self.options.header_format.replace("%s", token))?;
                value.set_sensitive(true);
                options.headers.insert(AUTHORIZATION, value);
            }
            TokenMode::Query => {
                options
                    .query
                    .insert(self.options.param_name.clone(), token.to_string());
            }
            TokenMode::Body => options.append_to_body(&method, &self.options.param_name, token)?,
        }

        self.client.request(method, path, options).await
    }

    /// Sends a `GET` request carrying this token.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn get(&self, path: &str, options: RequestOptions) -> Result<Response, OAuth2Error> {
        self.request(Method::GET, path, options).await
    }

    /// Sends a `POST` request carrying this token.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn post(&self, path: &str, options: RequestOptions) -> Result<Response, OAuth2Error> {
        self.request(Method::POST, path, options).await
    }

    /// Sends a `PUT` request carrying this token.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn put(&self, path: &str, options: RequestOptions) -> Result<Response, OAuth2Error> {
        self.request(Method::PUT, path, options).await
    }

    /// Sends a `PATCH` request carrying this token.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn patch(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, OAuth2Error> {
        self.request(Method::PATCH, path, options).await
    }

    /// Sends a `DELETE` request carrying this token.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub async fn delete(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, OAuth2Error> {
        self.request(Method::DELETE, path, options).await
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// The new token keeps the transmission options of this one.
    ///
    /// # Errors
    ///
    /// [`OAuth2Error::MissingRefreshToken`] without any network call when no
    /// refresh token is held, otherwise as [`Client::get_token`].
    pub async fn refresh(&self, params: Params) -> Result<Self, OAuth2Error> {
        let Some(refresh_token) = &self.refresh_token else {
            return Err(OAuth2Error::MissingRefreshToken);
        };

        let mut params = params;
        params.insert("grant_type".to_string(), "refresh_token".to_string());
        params.insert(
            "refresh_token".to_string(),
            refresh_token.as_str().to_string(),
        );

        debug!(token = %self.token, "refreshing access token");
        self.client
            .get_token(params, Some(self.options.to_hash()))
            .await
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &self.token)
            .field("refresh_token", &self.refresh_token)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("params", &self.params)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

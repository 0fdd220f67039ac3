//! Client configuration.
//!
//! Every option is an explicit field with a documented default. The enums
//! can be parsed from strings (and deserialized with serde), so a
//! configuration loaded from a file or the environment goes through the
//! same validation as one built in code.

use std::str::FromStr;
use std::time::Duration;

use http::Method;
use serde::{Deserialize, Serialize};

use crate::OAuth2Error;

/// Default path of the provider authorization endpoint.
pub const DEFAULT_AUTHORIZE_URL: &str = "/oauth/authorize";

/// Default path of the provider token endpoint.
pub const DEFAULT_TOKEN_URL: &str = "/oauth/token";

/// Default number of redirects followed by a single request.
pub const DEFAULT_MAX_REDIRECTS: u32 = 5;

/// HTTP method used to call the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TokenMethod {
    /// Parameters are sent as query string.
    Get,
    /// Parameters are sent as a form-encoded body.
    #[default]
    Post,
}

impl TokenMethod {
    /// The matching HTTP method.
    pub fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
        }
    }
}

impl FromStr for TokenMethod {
    type Err = OAuth2Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            _ => Err(OAuth2Error::Configuration {
                reason: format!("unknown token method '{value}', expected GET or POST"),
            }),
        }
    }
}

/// How the client credentials are sent to the token endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuth {
    /// HTTP Basic authentication with `client_id:client_secret`.
    #[default]
    Header,
    /// `client_id` and `client_secret` query parameters.
    Query,
    /// `client_id` and `client_secret` form parameters in the request body.
    Body,
}

impl FromStr for ClientAuth {
    type Err = OAuth2Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "header" => Ok(Self::Header),
            "query" => Ok(Self::Query),
            "body" => Ok(Self::Body),
            _ => Err(OAuth2Error::Configuration {
                reason: format!(
                    "unknown client authentication '{value}', expected header, query or body"
                ),
            }),
        }
    }
}

/// Options handed through to the HTTP transport.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionOptions {
    /// Timeout for establishing the connection.
    pub connect_timeout: Option<Duration>,
    /// Timeout for the whole request, including reading the body.
    pub timeout: Option<Duration>,
    /// Value of the `User-Agent` header.
    pub user_agent: Option<String>,
}

/// Provider endpoints and request policy of a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    /// Authorization endpoint, absolute or relative to the site.
    pub authorize_url: String,
    /// Token endpoint, absolute or relative to the site.
    pub token_url: String,
    /// HTTP method of the token request.
    pub token_method: TokenMethod,
    /// Client authentication on the token request.
    pub client_auth: ClientAuth,
    /// Maximum number of redirects followed by one request.
    pub max_redirects: u32,
    /// Whether 4xx/5xx responses fail the request.
    pub raise_errors: bool,
    /// Transport options.
    pub connection: ConnectionOptions,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            authorize_url: DEFAULT_AUTHORIZE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            token_method: TokenMethod::default(),
            client_auth: ClientAuth::default(),
            max_redirects: DEFAULT_MAX_REDIRECTS,
            raise_errors: true,
            connection: ConnectionOptions::default(),
        }
    }
}

impl ClientOptions {
    /// Checks option combinations that cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`OAuth2Error::Configuration`] when body client authentication
    /// is combined with a `GET` token request, which carries no body.
    pub fn validate(&self) -> Result<(), OAuth2Error> {
        if self.client_auth == ClientAuth::Body && self.token_method == TokenMethod::Get {
            return Err(OAuth2Error::Configuration {
                reason: "body client authentication requires the POST token method".to_string(),
            });
        }
        Ok(())
    }
}

use std::fmt;

use serde_json::Value;

use crate::Response;

/// Errors that can occur when using the OAuth2 [`Client`](crate::Client).
///
/// Configuration errors are programmer errors and surface immediately.
/// Provider errors carry the provider `error` code, its description and the
/// originating [`Response`], so callers can branch on codes such as
/// `invalid_grant` or `invalid_token`.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum OAuth2Error {
    /// The HTTP transport failed to deliver the request.
    Transport(TransportError),

    /// URL parsing error when resolving endpoints or redirects.
    Url(url::ParseError),

    /// Invalid HTTP header name.
    InvalidHeaderName(http::header::InvalidHeaderName),

    /// Invalid HTTP header value.
    InvalidHeaderValue(http::header::InvalidHeaderValue),

    /// Parameters could not be form-encoded.
    FormEncoding(serde_urlencoded::ser::Error),

    /// Expiry timestamp arithmetic overflowed.
    Timestamp(jiff::Error),

    /// The provider answered with an error (4xx/5xx status, or a token
    /// response without `access_token`).
    #[display("OAuth2 provider error: {_0}")]
    Provider(ProviderError),

    /// The provider answered with a status outside of 200..=599.
    ///
    /// Always raised, whatever the `raise_errors` option.
    #[display("Unexpected status code {}: {_0}", _0.response.status())]
    #[from(skip)]
    UnexpectedStatus(ProviderError),

    /// Invalid configuration: unknown client authentication, token mode or
    /// parse mode, or an unsupported combination of options.
    #[display("Configuration error: {reason}")]
    #[from(skip)]
    Configuration {
        /// Description of the configuration issue.
        reason: String,
    },

    /// A refresh was requested on a token holding no refresh token.
    #[display("A refresh_token is not available")]
    #[from(skip)]
    MissingRefreshToken,

    /// The grant type has no authorization endpoint.
    #[display("The authorization endpoint is not used by the {grant_type} grant")]
    #[from(skip)]
    AuthorizeUrlUnsupported {
        /// The grant type name.
        grant_type: &'static str,
    },

    /// A token hash could not be turned into an access token.
    #[display("Invalid token hash: {reason}")]
    #[from(skip)]
    InvalidTokenHash {
        /// Description of what was invalid.
        reason: String,
    },
}

impl OAuth2Error {
    /// The provider error, for provider and unexpected status errors.
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self {
            Self::Provider(error) | Self::UnexpectedStatus(error) => Some(error),
            _ => None,
        }
    }
}

/// Failure of the HTTP transport.
#[derive(Debug, derive_more::Error, derive_more::Display, derive_more::From)]
pub enum TransportError {
    /// Error from the reqwest transport.
    Reqwest(reqwest::Error),

    /// Error from another transport implementation.
    #[display("{message}")]
    #[from(skip)]
    Other {
        /// Description of the failure.
        message: String,
    },
}

/// A provider error derived from a [`Response`].
///
/// The code comes from the `error` field of the parsed body and the
/// description from `error_description`; both are `None` when the body does
/// not parse to a mapping or lacks them.
#[derive(Debug, Clone, derive_more::Error)]
pub struct ProviderError {
    code: Option<String>,
    description: Option<String>,
    response: Box<Response>,
}

impl ProviderError {
    /// Builds the error from a response.
    pub fn from_response(response: &Response) -> Self {
        let parsed = response.parse();
        let field = |name: &str| match parsed.as_ref().and_then(|value| value.get(name)) {
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };

        Self {
            code: field("error"),
            description: field("error_description"),
            response: Box::new(response.without_error()),
        }
    }

    /// The provider error code, e.g. `invalid_grant`.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// The provider error description.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The response this error was built from.
    ///
    /// This is a snapshot taken before the error existed: its
    /// [`Response::error`] is always `None`. The response handed back with
    /// error raising disabled is the one carrying the error.
    pub fn response(&self) -> &Response {
        &self.response
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.code, &self.description) {
            (Some(code), Some(description)) => write!(f, "{code}: {description}"),
            (Some(code), None) => write!(f, "{code}"),
            (None, Some(description)) => write!(f, "{description}"),
            (None, None) => write!(f, "HTTP status {}", self.response.status()),
        }
    }
}

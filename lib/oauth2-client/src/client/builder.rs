use std::sync::Arc;
use std::time::Duration;

use super::Client;
use crate::config::{ClientAuth, ClientOptions, TokenMethod};
use crate::transport::{HttpTransport, ReqwestTransport};
use crate::{OAuth2Error, SecureString};

/// Builder for [`Client`] instances.
///
/// # Default configuration
///
/// - **Authorize URL**: `/oauth/authorize`
/// - **Token URL**: `/oauth/token`
/// - **Token method**: `POST`
/// - **Client authentication**: HTTP Basic header
/// - **Max redirects**: 5
/// - **Raise errors**: `true`
/// - **Transport**: reqwest, redirects disabled
///
/// # Example
///
/// ```rust
/// use oauth2_client::{Client, ClientAuth};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::builder("client-id", "client-secret")
///     .with_site("https://provider.example.com")
///     .with_token_url("/oauth2/token")
///     .with_client_auth(ClientAuth::Body)
///     .build()?;
///
/// assert_eq!(client.token_url(&Default::default())?, "https://provider.example.com/oauth2/token");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    id: String,
    secret: SecureString,
    site: String,
    options: ClientOptions,
    transport: Option<Arc<dyn HttpTransport>>,
}

impl ClientBuilder {
    pub(super) fn new(id: impl Into<String>, secret: impl Into<SecureString>) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            site: String::new(),
            options: ClientOptions::default(),
            transport: None,
        }
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Fails with a configuration error for unsupported option combinations,
    /// or if the default transport cannot be created.
    pub fn build(self) -> Result<Client, OAuth2Error> {
        let Self {
            id,
            secret,
            site,
            options,
            transport,
        } = self;

        options.validate()?;

        let transport = match transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&options.connection)?),
        };

        Ok(Client {
            id,
            secret,
            site,
            options,
            transport,
        })
    }

    /// Sets the provider base URL, e.g. `https://api.example.com`.
    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = site.into();
        self
    }

    /// Replaces all options.
    pub fn with_options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the authorization endpoint, absolute or relative to the site.
    pub fn with_authorize_url(mut self, url: impl Into<String>) -> Self {
        self.options.authorize_url = url.into();
        self
    }

    /// Sets the token endpoint, absolute or relative to the site.
    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.options.token_url = url.into();
        self
    }

    /// Sets the token request method.
    pub fn with_token_method(mut self, method: TokenMethod) -> Self {
        self.options.token_method = method;
        self
    }

    /// Sets how client credentials reach the token endpoint.
    pub fn with_client_auth(mut self, client_auth: ClientAuth) -> Self {
        self.options.client_auth = client_auth;
        self
    }

    /// Sets the maximum number of redirects followed per request.
    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.options.max_redirects = max_redirects;
        self
    }

    /// Sets whether 4xx/5xx responses fail requests.
    pub fn with_raise_errors(mut self, raise_errors: bool) -> Self {
        self.options.raise_errors = raise_errors;
        self
    }

    /// Sets the connect timeout of the default transport.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connection.connect_timeout = Some(timeout);
        self
    }

    /// Sets the request timeout of the default transport.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.connection.timeout = Some(timeout);
        self
    }

    /// Sets the `User-Agent` of the default transport.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.connection.user_agent = Some(user_agent.into());
        self
    }

    /// Uses a custom transport instead of reqwest.
    ///
    /// Connection options are not applied to a custom transport.
    pub fn with_transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }
}

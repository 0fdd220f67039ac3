//! # OAuth2 Client
//!
//! An OAuth 2.0 client: obtain access tokens from a provider, refresh them,
//! and make authenticated requests with them.
//!
//! - **[`Client`]** - provider configuration, endpoint URLs and the request
//!   pipeline (redirects, error classification)
//! - **[`AccessToken`]** - a token with its expiry, refresh token and
//!   transmission mode
//! - **[`Strategy`]** - the grants: [`AuthCode`] and [`Password`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oauth2_client::{Client, Params, PasswordCredentials, Strategy};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::builder("client-id", "client-secret")
//!     .with_site("https://provider.example.com")
//!     .build()?;
//!
//! let token = client
//!     .password()
//!     .get_token(PasswordCredentials::new("alice", "secret"), Params::new(), None)
//!     .await?;
//!
//! let response = token.get("/api/me", Default::default()).await?;
//! println!("{}", response.text());
//!
//! if token.is_expired() {
//!     let token = token.refresh(Params::new()).await?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! By default 4xx/5xx responses fail with [`OAuth2Error::Provider`], whose
//! [`ProviderError`] carries the provider `error` code and description.
//! With `raise_errors` disabled on the client, the response is returned with
//! [`Response::error`] set instead; a single call can still opt in to raising
//! with [`RequestOptions::with_raise_errors`]. Token requests always fail on
//! errors.
//!
//! ## Transport
//!
//! Requests go through an [`HttpTransport`](transport::HttpTransport),
//! [`ReqwestTransport`](transport::ReqwestTransport) by default. The
//! transport must not follow redirects: the client does, up to
//! [`ClientOptions::max_redirects`] per request.

mod client;
pub use self::client::{Client, ClientBuilder, Params, RequestBody, RequestOptions};

pub mod config;
pub use self::config::{ClientAuth, ClientOptions, ConnectionOptions, TokenMethod};

mod error;
pub use self::error::{OAuth2Error, ProviderError, TransportError};

mod response;
pub use self::response::{ParseMode, Response};

mod secret;
pub use self::secret::SecureString;

pub mod strategy;
pub use self::strategy::{AuthCode, Password, PasswordCredentials, Strategy};

mod token;
pub use self::token::{
    AccessToken, DEFAULT_HEADER_FORMAT, DEFAULT_PARAM_NAME, TokenMode, TokenOptions,
};

pub mod transport;

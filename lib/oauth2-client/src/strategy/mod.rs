//! Grant strategies.
//!
//! A strategy turns grant-specific credentials into a token request on a
//! [`Client`]. Strategies borrow the client and are obtained from it with
//! [`Client::auth_code`] and [`Client::password`].

use std::future::Future;

use serde_json::{Map, Value};

use crate::client::merge_params;
use crate::{AccessToken, Client, OAuth2Error, Params};

mod auth_code;
pub use self::auth_code::AuthCode;

mod password;
pub use self::password::{Password, PasswordCredentials};

/// Behaviour shared by grant strategies.
pub trait Strategy {
    /// The `grant_type` value sent to the token endpoint.
    const GRANT_TYPE: &'static str;

    /// What the resource owner hands over for this grant.
    type Credentials: Send;

    /// The client this strategy works on.
    fn client(&self) -> &Client;

    /// Parameters of the authorization URL: `client_id`, overridable by `params`.
    fn authorize_params(&self, params: Params) -> Params {
        let defaults = Params::from([("client_id".to_string(), self.client().id().to_string())]);
        merge_params(defaults, params)
    }

    /// The authorization URL the resource owner is sent to.
    ///
    /// # Errors
    ///
    /// Fails if the parameters cannot be encoded, or if the grant has no
    /// authorization step.
    fn authorize_url(&self, params: Params) -> Result<String, OAuth2Error> {
        self.client().authorize_url(&self.authorize_params(params))
    }

    /// Client credentials as token parameters, overridable by `params`.
    fn token_params(&self, params: Params) -> Params {
        let defaults = Params::from([
            ("client_id".to_string(), self.client().id().to_string()),
            ("client_secret".to_string(), self.client().secret().to_string()),
        ]);
        merge_params(defaults, params)
    }

    /// The token URL carrying [`token_params`](Self::token_params) as query.
    ///
    /// # Errors
    ///
    /// Fails if the parameters cannot be encoded.
    fn token_url(&self, params: Params) -> Result<String, OAuth2Error> {
        self.client().token_url(&self.token_params(params))
    }

    /// Exchanges the credentials for an access token.
    ///
    /// Grant parameters are defaults: entries in `params` win.
    /// `token_overrides` are merged over the token response, as in
    /// [`Client::get_token`].
    fn get_token(
        &self,
        credentials: Self::Credentials,
        params: Params,
        token_overrides: Option<Map<String, Value>>,
    ) -> impl Future<Output = Result<AccessToken, OAuth2Error>> + Send;
}

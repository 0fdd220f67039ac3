use std::future::Future;

use serde_json::{Map, Value};

use super::Strategy;
use crate::client::merge_params;
use crate::{AccessToken, Client, OAuth2Error, Params};

/// Authorization Code grant.
///
/// The resource owner is sent to [`authorize_url`](Strategy::authorize_url)
/// and comes back with a code, exchanged with
/// [`get_token`](Strategy::get_token).
#[derive(Debug, Clone, Copy)]
pub struct AuthCode<'a> {
    client: &'a Client,
}

impl<'a> AuthCode<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl Strategy for AuthCode<'_> {
    const GRANT_TYPE: &'static str = "authorization_code";

    /// The authorization code.
    type Credentials = String;

    fn client(&self) -> &Client {
        self.client
    }

    fn authorize_params(&self, params: Params) -> Params {
        let defaults = Params::from([
            ("response_type".to_string(), "code".to_string()),
            ("client_id".to_string(), self.client.id().to_string()),
        ]);
        merge_params(defaults, params)
    }

    fn get_token(
        &self,
        code: String,
        params: Params,
        token_overrides: Option<Map<String, Value>>,
    ) -> impl Future<Output = Result<AccessToken, OAuth2Error>> + Send {
        let defaults = Params::from([
            ("grant_type".to_string(), Self::GRANT_TYPE.to_string()),
            ("code".to_string(), code),
        ]);
        let params = merge_params(defaults, params);
        self.client.get_token(params, token_overrides)
    }
}

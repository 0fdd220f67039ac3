use std::fmt;
use std::future::Future;

use serde_json::{Map, Value};

use super::Strategy;
use crate::client::merge_params;
use crate::{AccessToken, Client, OAuth2Error, Params, SecureString};

/// Resource owner credentials for the [`Password`] grant.
#[derive(Clone)]
pub struct PasswordCredentials {
    /// The resource owner username.
    pub username: String,
    /// The resource owner password.
    pub password: SecureString,
}

impl PasswordCredentials {
    /// Creates the credentials.
    pub fn new(username: impl Into<String>, password: impl Into<SecureString>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("username", &self.username)
            .field("password", &self.password)
            .finish()
    }
}

/// Resource Owner Password Credentials grant.
///
/// There is no authorization step: [`authorize_url`](Strategy::authorize_url)
/// always fails.
#[derive(Debug, Clone, Copy)]
pub struct Password<'a> {
    client: &'a Client,
}

impl<'a> Password<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }
}

impl Strategy for Password<'_> {
    const GRANT_TYPE: &'static str = "password";

    type Credentials = PasswordCredentials;

    fn client(&self) -> &Client {
        self.client
    }

    fn authorize_url(&self, _params: Params) -> Result<String, OAuth2Error> {
        Err(OAuth2Error::AuthorizeUrlUnsupported {
            grant_type: Self::GRANT_TYPE,
        })
    }

    fn get_token(
        &self,
        credentials: PasswordCredentials,
        params: Params,
        token_overrides: Option<Map<String, Value>>,
    ) -> impl Future<Output = Result<AccessToken, OAuth2Error>> + Send {
        let defaults = Params::from([
            ("grant_type".to_string(), Self::GRANT_TYPE.to_string()),
            ("username".to_string(), credentials.username.clone()),
            (
                "password".to_string(),
                credentials.password.as_str().to_string(),
            ),
        ]);
        let params = merge_params(defaults, params);
        self.client.get_token(params, token_overrides)
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rstest::rstest;

    use super::*;
    use crate::transport::mock::MockTransport;

    fn client_with(transport: &MockTransport) -> Client {
        Client::builder("abc", "def")
            .with_site("https://api.example.com")
            .with_transport(transport.clone())
            .build()
            .expect("should build client")
    }

    #[test]
    fn should_not_have_authorize_url() {
        let client = client_with(&MockTransport::new());

        let error = client
            .password()
            .authorize_url(Params::new())
            .expect_err("unsupported");

        insta::assert_snapshot!(
            error,
            @"The authorization endpoint is not used by the password grant"
        );
    }

    #[rstest]
    #[case::json(
        "application/json",
        r#"{"expires_in":600,"access_token":"salmon","refresh_token":"trout"}"#
    )]
    #[case::form(
        "application/x-www-form-urlencoded",
        "expires_in=600&access_token=salmon&refresh_token=trout"
    )]
    #[tokio::test]
    async fn should_get_token(#[case] content_type: &'static str, #[case] body: &str) {
        let transport = MockTransport::new();
        transport.push(200, &[("content-type", content_type)], body);
        let client = client_with(&transport);

        let token = client
            .password()
            .get_token(
                PasswordCredentials::new("username", "password"),
                Params::new(),
                None,
            )
            .await
            .expect("token");

        assert_eq!(token.token(), "salmon");
        assert_eq!(token.refresh_token(), Some("trout"));
        assert_eq!(token.expires_in(), Some(600));
        assert!(token.expires_at().is_some());
        assert_eq!(
            transport.last_request().body,
            Some(Bytes::from_static(
                b"grant_type=password&username=username&password=password"
            ))
        );
    }

    #[test]
    fn should_redact_password_in_debug() {
        let credentials = PasswordCredentials::new("alice", "wonderland-password");

        let debug = format!("{credentials:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("wonderland-password"));
    }
}

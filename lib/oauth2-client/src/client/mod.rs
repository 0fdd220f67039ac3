use std::sync::Arc;

use headers::{Authorization, HeaderMapExt};
use http::header::AUTHORIZATION;
use http::{Method, StatusCode};
use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::config::{ClientAuth, ClientOptions};
use crate::strategy::{AuthCode, Password};
use crate::transport::{HttpRequest, HttpTransport};
use crate::{AccessToken, OAuth2Error, ParseMode, ProviderError, Response, SecureString};

mod builder;
pub use self::builder::ClientBuilder;

mod request;
pub(crate) use self::request::merge_params;
pub use self::request::{Params, RequestBody, RequestOptions};

/// OAuth2 client bound to one provider.
///
/// Holds the client credentials, the provider site and the
/// [`ClientOptions`], and runs the request pipeline: URL resolution,
/// redirect following and error classification.
///
/// Cloning is cheap: clones share the HTTP transport. Access tokens keep a
/// clone of the client that issued them.
///
/// # Example
///
/// ```rust,no_run
/// use oauth2_client::{Client, Params, Strategy};
///
/// # async fn example() -> Result<(), oauth2_client::OAuth2Error> {
/// let client = Client::builder("client-id", "client-secret")
///     .with_site("https://provider.example.com")
///     .build()?;
///
/// // Send the user to the provider
/// let params = Params::from([("redirect_uri".to_string(), "https://app.example.com/callback".to_string())]);
/// let url = client.auth_code().authorize_url(params.clone())?;
///
/// // Exchange the code received on the callback
/// let token = client.auth_code().get_token("the-code".to_string(), params, None).await?;
/// let response = token.get("/api/me", Default::default()).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Thread Safety
///
/// The redirect counter lives in each [`request`](Self::request) call, so a
/// client can serve concurrent requests.
#[derive(Debug, Clone)]
pub struct Client {
    id: String,
    secret: SecureString,
    site: String,
    options: ClientOptions,
    transport: Arc<dyn HttpTransport>,
}

// Create
impl Client {
    /// Creates a builder with the client credentials.
    pub fn builder(id: impl Into<String>, secret: impl Into<SecureString>) -> ClientBuilder {
        ClientBuilder::new(id, secret)
    }
}

// Accessors
impl Client {
    /// The client identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The client secret.
    pub fn secret(&self) -> &str {
        self.secret.as_str()
    }

    /// The provider base URL.
    pub fn site(&self) -> &str {
        &self.site
    }

    /// The client options.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Mutable access to the options, to adjust them between requests.
    ///
    /// Tokens already issued keep the options of their own client clone.
    pub fn options_mut(&mut self) -> &mut ClientOptions {
        &mut self.options
    }

    fn credentials(&self) -> Params {
        Params::from([
            ("client_id".to_string(), self.id.clone()),
            ("client_secret".to_string(), self.secret.as_str().to_string()),
        ])
    }
}

// Strategies
impl Client {
    /// The Authorization Code grant.
    pub fn auth_code(&self) -> AuthCode<'_> {
        AuthCode::new(self)
    }

    /// The Resource Owner Password Credentials grant.
    pub fn password(&self) -> Password<'_> {
        Password::new(self)
    }
}

// Endpoints
impl Client {
    /// The authorization endpoint URL, with `params` as query string.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters cannot be form-encoded.
    pub fn authorize_url(&self, params: &Params) -> Result<String, OAuth2Error> {
        endpoint(&self.site, &self.options.authorize_url, params)
    }

    /// The token endpoint URL, with `params` as query string.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters cannot be form-encoded.
    pub fn token_url(&self, params: &Params) -> Result<String, OAuth2Error> {
        endpoint(&self.site, &self.options.token_url, params)
    }
}

// Requests
impl Client {
    /// Sends a request relative to the site, following redirects.
    ///
    /// - 2xx: the response is returned.
    /// - 3xx: the `Location` is followed, up to `max_redirects` times per
    ///   call; past the limit the redirect response itself is returned. A 303
    ///   turns the request into a body-less `GET`. The `Authorization` header
    ///   is dropped when the redirect leaves the origin.
    /// - 4xx/5xx: a [`ProviderError`] is raised when either the client or the
    ///   call enables `raise_errors`, otherwise it is attached to the returned
    ///   response.
    /// - anything else fails with [`OAuth2Error::UnexpectedStatus`].
    ///
    /// # Errors
    ///
    /// Transport failures, invalid URLs or headers, raised provider errors and
    /// unexpected status codes.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        mut options: RequestOptions,
    ) -> Result<Response, OAuth2Error> {
        let raise_errors = options.raise_errors.unwrap_or(false) || self.options.raise_errors;
        let mut method = method;
        let mut url = Url::parse(&resolve(&self.site, url))?;
        let mut redirects = 0_u32;

        loop {
            let request = Self::build_request(&method, &url, &options)?;
            debug!(%method, %url, "sending...");
            let raw = self.transport.execute(request).await?;
            let mut response = Response::new(raw, options.parse);
            let status = response.status();
            debug!(%status, "...receiving");

            match status.as_u16() {
                200..=299 => return Ok(response),
                300..=399 => {
                    redirects += 1;
                    if redirects > self.options.max_redirects {
                        warn!(%url, max_redirects = self.options.max_redirects, "redirect limit reached");
                        return Ok(response);
                    }
                    let Some(location) = response.location() else {
                        warn!(%status, %url, "redirect without location");
                        return Ok(response);
                    };
                    let next = url.join(location)?;
                    if status == StatusCode::SEE_OTHER {
                        options.drop_payload(&method);
                        method = Method::GET;
                    }
                    if next.origin() != url.origin() {
                        options.headers.remove(AUTHORIZATION);
                    }
                    debug!(%status, from = %url, to = %next, redirects, "following redirect");
                    url = next;
                }
                400..=599 => {
                    let error = ProviderError::from_response(&response);
                    if raise_errors {
                        return Err(OAuth2Error::Provider(error));
                    }
                    debug!(%status, code = ?error.code(), "provider error returned to caller");
                    response.attach_error(error);
                    return Ok(response);
                }
                _ => {
                    return Err(OAuth2Error::UnexpectedStatus(
                        ProviderError::from_response(&response),
                    ));
                }
            }
        }
    }

    fn build_request(
        method: &Method,
        url: &Url,
        options: &RequestOptions,
    ) -> Result<HttpRequest, OAuth2Error> {
        let (query, body, headers) = options.resolve(method)?;
        let mut url = url.clone();
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        Ok(HttpRequest {
            method: method.clone(),
            url,
            headers,
            body,
        })
    }

    /// Exchanges `params` for an access token at the token endpoint.
    ///
    /// A `parse` entry in `params` selects the response parse mode and is not
    /// sent. Parameters go in a form-encoded body with the `POST` token
    /// method, in the query string with `GET`. Client credentials are added according to
    /// [`ClientOptions::client_auth`]. Provider errors are always raised.
    /// `token_overrides`, when given, are merged over the parsed response
    /// before the token is built, so they can set transmission options (see
    /// [`TokenOptions::to_hash`](crate::TokenOptions::to_hash)), `expires_in`
    /// or extra parameters.
    ///
    /// # Errors
    ///
    /// Configuration errors, request failures, and a [`ProviderError`] when
    /// the response does not parse to a mapping holding `access_token`.
    pub async fn get_token(
        &self,
        mut params: Params,
        token_overrides: Option<Map<String, Value>>,
    ) -> Result<AccessToken, OAuth2Error> {
        self.options.validate()?;

        let parse = params
            .shift_remove("parse")
            .map(|mode| mode.parse::<ParseMode>())
            .transpose()?
            .unwrap_or_default();
        let mut options = RequestOptions::new()
            .with_raise_errors(true)
            .with_parse(parse);

        match self.options.client_auth {
            ClientAuth::Header => options
                .headers
                .typed_insert(Authorization::basic(&self.id, self.secret.as_str())),
            ClientAuth::Query => options.query.extend(self.credentials()),
            ClientAuth::Body => params.extend(self.credentials()),
        }

        // form body for POST, query string for GET
        options.params = params;

        let url = self.token_url(&Params::new())?;
        let response = self
            .request(self.options.token_method.method(), &url, options)
            .await?;

        let mut hash = match response.parse() {
            Some(Value::Object(hash)) if hash.contains_key("access_token") => hash,
            _ => {
                return Err(OAuth2Error::Provider(ProviderError::from_response(
                    &response,
                )));
            }
        };

        if let Some(token_overrides) = token_overrides {
            hash.extend(token_overrides);
        }
        AccessToken::from_hash(self.clone(), hash)
    }
}

/// Returns `true` if `url` starts with a URI scheme and authority (`scheme://`).
///
/// Paths such as `documents:batchGet` stay relative to the site.
fn has_scheme(url: &str) -> bool {
    let Some((scheme, _)) = url.split_once("://") else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|first| first.is_ascii_alphabetic())
        && chars.all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '-' | '.'))
}

/// `url` if absolute, otherwise `url` appended to `site`.
fn resolve(site: &str, url: &str) -> String {
    if has_scheme(url) || site.is_empty() {
        url.to_string()
    } else {
        format!(
            "{}/{}",
            site.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}

fn endpoint(site: &str, url: &str, params: &Params) -> Result<String, OAuth2Error> {
    let mut result = resolve(site, url);
    if !params.is_empty() {
        let query = serde_urlencoded::to_string(params)?;
        result.push(if result.contains('?') { '&' } else { '?' });
        result.push_str(&query);
    }
    Ok(result)
}

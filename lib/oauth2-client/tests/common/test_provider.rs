#![allow(
    clippy::missing_errors_doc,
    dead_code,
    missing_docs,
    clippy::expect_used
)]
use std::net::SocketAddr;

use axum::Router;
use axum::extract::RawQuery;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE, LOCATION};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use tracing::{error, info};

use oauth2_client::{Client, ClientBuilder};

use super::{CLIENT_ID, CLIENT_SECRET};

pub const AUTH_CODE: &str = "sushi";
pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "wonderland";
pub const REFRESH_TOKEN: &str = "trout";

/// An in-process OAuth2 provider serving the routes the tests call.
#[derive(Debug)]
pub struct TestProvider {
    address: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestProvider {
    pub async fn start() -> anyhow::Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let address = listener.local_addr()?;
        info!(%address, "launching provider");

        let handle = tokio::spawn(async move {
            if let Err(error) = axum::serve(listener, router()).await {
                error!(?error, "provider stopped");
            }
        });

        Ok(Self { address, handle })
    }

    pub fn site(&self) -> String {
        format!("http://{}", self.address)
    }

    pub fn client_builder(&self) -> ClientBuilder {
        Client::builder(CLIENT_ID, CLIENT_SECRET).with_site(self.site())
    }

    pub fn client(&self) -> Client {
        self.client_builder().build().expect("valid client")
    }
}

impl Drop for TestProvider {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn router() -> Router {
    Router::new()
        .route("/success", get(success))
        .route("/reflect", any(reflect))
        .route("/redirect", get(|| redirect(StatusCode::FOUND, "/success")))
        .route("/see_other", any(|| redirect(StatusCode::SEE_OTHER, "/reflect")))
        .route(
            "/temporary",
            any(|| redirect(StatusCode::TEMPORARY_REDIRECT, "/reflect")),
        )
        .route("/loop", any(|| redirect(StatusCode::FOUND, "/loop")))
        .route("/unauthorized", get(unauthorized))
        .route("/conflict", get(conflict))
        .route("/error", get(internal_error))
        .route("/oauth/token", any(token))
        .route("/me", any(me))
}

async fn success() -> Response {
    (StatusCode::OK, [(CONTENT_TYPE, "text/awesome")], "yay").into_response()
}

async fn reflect(method: Method, body: String) -> Response {
    (StatusCode::OK, format!("{method} {body}")).into_response()
}

async fn redirect(status: StatusCode, location: &'static str) -> Response {
    (status, [(LOCATION, location)]).into_response()
}

async fn unauthorized() -> Response {
    json_response(
        StatusCode::UNAUTHORIZED,
        &json!({"error": "invalid_token", "error_description": "bad bad token"}),
    )
}

async fn conflict() -> Response {
    (
        StatusCode::CONFLICT,
        [(CONTENT_TYPE, "text/plain")],
        "not authorized",
    )
        .into_response()
}

async fn internal_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "unknown error").into_response()
}

/// Echoes how the access token was transmitted.
async fn me(
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: String,
) -> Response {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    json_response(
        StatusCode::OK,
        &json!({
            "method": method.as_str(),
            "authorization": authorization,
            "query": query,
            "body": body,
        }),
    )
}

async fn token(
    method: Method,
    headers: HeaderMap,
    RawQuery(query): RawQuery,
    body: String,
) -> Response {
    let mut params = decode(query.as_deref().unwrap_or_default());
    if method == Method::POST {
        params.extend(decode(&body));
    }
    let param = |name: &str| {
        params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    };

    let basic = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some("Basic YWJjOmRlZg==");
    let in_params = param("client_id") == Some(CLIENT_ID)
        && param("client_secret") == Some(CLIENT_SECRET);
    if !basic && !in_params {
        return json_response(
            StatusCode::UNAUTHORIZED,
            &json!({"error": "invalid_client"}),
        );
    }

    match param("grant_type") {
        Some("authorization_code") if param("code") == Some(AUTH_CODE) => json_response(
            StatusCode::OK,
            &json!({
                "access_token": "salmon",
                "refresh_token": REFRESH_TOKEN,
                "expires_in": 600,
                "extra_param": "steve",
            }),
        ),
        Some("password")
            if param("username") == Some(USERNAME) && param("password") == Some(PASSWORD) =>
        {
            (
                StatusCode::OK,
                [(CONTENT_TYPE, "application/x-www-form-urlencoded")],
                "expires_in=600&access_token=salmon&refresh_token=trout",
            )
                .into_response()
        }
        Some("refresh_token") if param("refresh_token") == Some(REFRESH_TOKEN) => json_response(
            StatusCode::OK,
            &json!({
                "access_token": "refreshed_salmon",
                "refresh_token": "refreshed_trout",
                "expires_in": 600,
            }),
        ),
        _ => json_response(
            StatusCode::BAD_REQUEST,
            &json!({"error": "invalid_grant", "error_description": "the grant is not valid"}),
        ),
    }
}

fn decode(raw: &str) -> Vec<(String, String)> {
    serde_urlencoded::from_str(raw).unwrap_or_default()
}

fn json_response(status: StatusCode, body: &Value) -> Response {
    (
        status,
        [(CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
        .into_response()
}

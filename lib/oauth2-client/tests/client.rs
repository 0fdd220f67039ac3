#![allow(missing_docs)]

use http::{Method, StatusCode};
use oauth2_client::{OAuth2Error, Params, RequestOptions};
use rstest::rstest;
use tracing::info;

mod common;
pub use self::common::*;

#[rstest]
#[tokio::test]
async fn should_get_success(#[future] provider: TestProvider) -> anyhow::Result<()> {
    let provider = provider.await;
    let client = provider.client();

    let response = client
        .request(Method::GET, "/success", RequestOptions::new())
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), "yay");
    assert_eq!(response.content_type(), Some("text/awesome"));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_post_params_as_form(#[future] provider: TestProvider) -> anyhow::Result<()> {
    let provider = provider.await;
    let client = provider.client();

    let response = client
        .request(
            Method::POST,
            "/reflect",
            RequestOptions::new().with_param("foo", "bar"),
        )
        .await?;

    assert_eq!(response.text(), "POST foo=bar");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_follow_redirect(#[future] provider: TestProvider) -> anyhow::Result<()> {
    let provider = provider.await;
    let client = provider.client();

    let response = client
        .request(Method::GET, "/redirect", RequestOptions::new())
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text(), "yay");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_turn_see_other_into_get(#[future] provider: TestProvider) -> anyhow::Result<()> {
    let provider = provider.await;
    let client = provider.client();

    let response = client
        .request(
            Method::POST,
            "/see_other",
            RequestOptions::new().with_body("foo=bar"),
        )
        .await?;

    assert_eq!(response.text(), "GET ");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_keep_verb_on_temporary_redirect(
    #[future] provider: TestProvider,
) -> anyhow::Result<()> {
    let provider = provider.await;
    let client = provider.client();

    let response = client
        .request(
            Method::PUT,
            "/temporary",
            RequestOptions::new().with_body("foo=bar"),
        )
        .await?;

    assert_eq!(response.text(), "PUT foo=bar");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_stop_redirect_loop(#[future] provider: TestProvider) -> anyhow::Result<()> {
    let provider = provider.await;
    let client = provider.client_builder().with_max_redirects(2).build()?;

    let response = client
        .request(Method::GET, "/loop", RequestOptions::new())
        .await?;

    assert_eq!(response.status(), StatusCode::FOUND);
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_raise_provider_errors(#[future] provider: TestProvider) -> anyhow::Result<()> {
    let provider = provider.await;
    let client = provider.client();

    for path in ["/unauthorized", "/conflict", "/error"] {
        let result = client
            .request(Method::GET, path, RequestOptions::new())
            .await;
        match result {
            Err(OAuth2Error::Provider(error)) => {
                info!(%path, %error, "provider error");
            }
            Err(error) => anyhow::bail!("{path}: expected a provider error, got {error:?}"),
            Ok(response) => anyhow::bail!("{path}: expected an error, got {response:?}"),
        }
    }

    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_expose_error_code_and_description(
    #[future] provider: TestProvider,
) -> anyhow::Result<()> {
    let provider = provider.await;
    let client = provider.client();

    let error = client
        .request(Method::GET, "/unauthorized", RequestOptions::new())
        .await
        .expect_err("unauthorized");

    let provider_error = error.provider_error().expect("provider error");
    assert_eq!(provider_error.code(), Some("invalid_token"));
    assert_eq!(provider_error.description(), Some("bad bad token"));
    assert_eq!(
        provider_error.response().status(),
        StatusCode::UNAUTHORIZED
    );
    insta::assert_snapshot!(error, @"OAuth2 provider error: invalid_token: bad bad token");
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_return_error_response_when_not_raising(
    #[future] provider: TestProvider,
) -> anyhow::Result<()> {
    let provider = provider.await;
    let client = provider.client_builder().with_raise_errors(false).build()?;

    let response = client
        .request(Method::GET, "/conflict", RequestOptions::new())
        .await?;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response.text(), "not authorized");
    let error = response.error().expect("attached error");
    assert!(error.code().is_none());
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_fail_on_transport_error() -> anyhow::Result<()> {
    init_tracing();
    let client = oauth2_client::Client::builder(CLIENT_ID, CLIENT_SECRET)
        .with_site("http://127.0.0.1:1")
        .build()?;

    let error = client
        .request(Method::GET, "/success", RequestOptions::new())
        .await
        .expect_err("nothing listens on port 1");

    assert!(matches!(error, OAuth2Error::Transport(_)));
    Ok(())
}

#[rstest]
#[tokio::test]
async fn should_build_urls(#[future] provider: TestProvider) -> anyhow::Result<()> {
    let provider = provider.await;
    let client = provider
        .client_builder()
        .with_authorize_url("https://auth.example.com/authorize")
        .build()?;

    let params = Params::from([("state".to_string(), "xyz".to_string())]);
    assert_eq!(
        client.authorize_url(&params)?,
        "https://auth.example.com/authorize?state=xyz"
    );
    assert_eq!(
        client.token_url(&Params::new())?,
        format!("{}/oauth/token", provider.site())
    );
    Ok(())
}

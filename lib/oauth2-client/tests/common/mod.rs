#![allow(
    clippy::missing_errors_doc,
    dead_code,
    missing_docs,
    clippy::expect_used
)]
use rstest::fixture;
use tracing::info;

mod test_provider;
pub use self::test_provider::*;

pub const CLIENT_ID: &str = "abc";
pub const CLIENT_SECRET: &str = "def";

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

#[fixture]
pub async fn provider() -> TestProvider {
    init_tracing();
    match TestProvider::start().await {
        Ok(provider) => provider,
        Err(error) => {
            panic!("fail to start test provider: {error:?}");
        }
    }
}

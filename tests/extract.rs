#![cfg(feature = "axum")]

use anyhow::Result;
use axum::{routing::get, Router};
use axum_test::{TestServer, TestServerConfig};
use http::StatusCode;
use tower_twofold::{Token, Twofold};

#[tokio::test]
async fn extracts_token_without_extension_wrapper() -> Result<()> {
    async fn read_token(token: Token) -> Result<String, StatusCode> {
        token.get().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
    }

    let app = Router::new()
        .route("/", get(read_token))
        .layer(Twofold::new("secret-key"));

    let config = TestServerConfig::builder().save_cookies().build();
    let server = TestServer::new_with_config(app, config)?;

    let response = server.get("/").await;
    response.assert_status_ok();

    let cookies = response.cookies();
    let cookie = cookies.get("csrftoken").expect("cookie not found.");
    assert_eq!(response.text(), cookie.value());

    Ok(())
}

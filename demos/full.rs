use std::net::SocketAddr;

use axum::{
    response::Redirect,
    routing::{get, post},
    Router,
};
use http::StatusCode;
use maud::{html, Markup};
use tower_twofold::{Token, Twofold};

#[tokio::main]
async fn main() {
    let app = Router::new()
        .route("/", get(root))
        .route("/transfer", post(transfer))
        .route("/logout", get(logout))
        .layer(Twofold::new("secret-key"));

    let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();

    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}

async fn root(token: Token) -> Result<Markup, StatusCode> {
    let token = token.get().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(html! {
        link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/@picocss/pico@2/css/pico.min.css";
        script src="https://unpkg.com/htmx.org@2.0.2" {}

        main class="container" {
            nav {
                ul {
                    li { a href="/logout" { "Logout" } }
                }
            }

            p { mark { "Open the Network tab in your dev console." } }
            p { small { kbd { (token) } } }

            div class="grid" {
                div {
                    form hx-post="/transfer" hx-swap="none" "hx-on::config-request"={"event.detail.headers['X-CSRFToken'] = \"" (token) "\""} {
                        label for="amount" { "Amount to transfer" }

                        input type="number" name="amount" value="100";

                        button type="submit" { "Transfer with token" }
                    }
                }

                div {
                    form hx-post="/transfer" {
                        label for="amount" { "Amount to transfer" }

                        input type="number" name="amount" value="100";

                        button type="submit" { "Transfer without token" }
                    }
                }
            }
        }
    })
}

async fn transfer() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Success!")
}

async fn logout(token: Token) -> Redirect {
    token.reset();

    Redirect::to("/")
}

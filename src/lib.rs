//! ## 🍪 Overview
//!
//! This crate uses the [Double Submit Cookie Pattern][owasp-double-submit] to mitigate CSRF.
//!
//! ### How it works
//!
//! - **Secret key**: You provide a **secret key** used to sign CSRF tokens (See: [OWASP's Cryptographic Storage Cheat Sheet][owasp-cryptographic-storage]).
//! - **Token issuance**:
//!   - When a request arrives without the token cookie, we generate a **secret** from a cryptographically secure **random source** (using the [`rand`][crate-rand] crate).
//!   - We then sign the **secret** with the **secret key** and set the result as a cookie on the response.
//!   - Your frontend reads the token (from the cookie, or from a handler that exposes it) and echoes it back in a header on every mutating request.
//! - **Token validation**:
//!   - Requests with a safe method (`GET`, `HEAD`, `OPTIONS`, `TRACE`) pass through unchecked.
//!   - For every other request, we require both the cookie and the header token, verify both signatures, and compare the embedded secrets in constant time.
//!   - If anything is missing, forged, or mismatched, the request is rejected with `403 Forbidden` before it reaches your handlers.
//!
//! ### Cookies
//!
//! By default the cookie is named `csrftoken`, scoped to `/`, `HTTPOnly`, `SameSite: Lax`,
//! and not `Secure`; the header is `X-CSRFToken`. All of it can be changed on [`Twofold`],
//! and HTTPS deployments should opt into [`Twofold::secure`].
//!
//! An existing cookie is never overwritten: a token is only minted for clients that
//! don't hold one yet (an empty value counts as none), so a leaked token stays valid
//! until the client clears its cookie or a handler calls [`Token::reset`].
//!
//! ## 🏗️ Usage
//!
//! ### With [`axum`][crate-axum]
//!
//! ```rust, no_run
//! use std::net::SocketAddr;
//!
//! use axum::{routing::{get, post}, Extension, Router};
//! use http::StatusCode;
//! use tower_twofold::{Token, Twofold};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = Router::new()
//!         .route("/form", get(form)).route("/transfer", post(transfer))
//!         .layer(Twofold::new("secret-key"));
//!
//!     let addr = SocketAddr::from(([127, 0, 0, 1], 3000));
//!     let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
//!
//!     axum::serve(listener, app.into_make_service())
//!         .await
//!         .unwrap();
//! }
//!
//! async fn form(Extension(token): Extension<Token>) -> Result<String, StatusCode> {
//!     // Embed this in the page; the frontend sends it back as `X-CSRFToken`.
//!     token.get().map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
//! }
//!
//! async fn transfer() -> StatusCode {
//!     StatusCode::OK
//! }
//! ```
//!
//! With the `axum` feature enabled, handlers can also take [`Token`] as an
//! extractor directly instead of going through [`Extension`][axum-extension].
//!
//! [axum-extension]: https://docs.rs/axum/latest/axum/struct.Extension.html
//! [crate-axum]: https://github.com/tokio-rs/axum
//! [crate-rand]: https://github.com/rust-random/rand
//! [crate-tower]: https://github.com/tower-rs/tower
//! [owasp-cryptographic-storage]: https://cheatsheetseries.owasp.org/cheatsheets/Cryptographic_Storage_Cheat_Sheet.html
//! [owasp-double-submit]: https://cheatsheetseries.owasp.org/cheatsheets/Cross-Site_Request_Forgery_Prevention_Cheat_Sheet.html#alternative-using-a-double-submit-cookie-pattern

use hmac::Hmac;
use sha2::Sha256;

pub(crate) type HmacSha256 = Hmac<Sha256>;

pub use error::Error;
pub use token::Token;
pub use twofold::Twofold;

pub use tower_cookies::cookie::SameSite;

mod error;
mod guard;
mod token;
mod twofold;

#[cfg(feature = "axum")]
mod extract;

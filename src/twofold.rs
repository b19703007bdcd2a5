use futures_util::future::BoxFuture;
use http::{Request, Response};
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use tower_cookies::{cookie::SameSite, CookieManager, Cookies};
use tower_layer::Layer;
use tower_service::Service;

use crate::{guard::GuardService, Error, Token};

#[derive(Clone)]
pub(crate) struct Config {
    pub(crate) secret: String,
    pub(crate) cookie_domain: Option<String>,
    pub(crate) cookie_name: String,
    pub(crate) cookie_path: String,
    pub(crate) header_name: String,
    pub(crate) http_only: bool,
    pub(crate) same_site: SameSite,
    pub(crate) secure: bool,
}

/// Layer that adds double-submit cookie CSRF protection to a service.
///
/// Safe methods (`GET`, `HEAD`, `OPTIONS`, `TRACE`) pass through and receive a
/// signed token cookie if they don't already carry one. Every other request
/// must submit that cookie together with a matching signed header value, or it
/// is rejected with `403 Forbidden` before reaching the inner service.
#[derive(Clone)]
pub struct Twofold {
    pub(crate) config: Config,
}

impl Twofold {
    /// Creates a layer that signs tokens with `secret`.
    ///
    /// # Panics
    ///
    /// Panics when `secret` is empty.
    pub fn new(secret: impl Into<String>) -> Self {
        let secret = secret.into();
        assert!(!secret.is_empty(), "signing secret must not be empty");

        Self {
            config: Config {
                secret,
                cookie_domain: None,
                cookie_name: "csrftoken".into(),
                cookie_path: "/".into(),
                header_name: "X-CSRFToken".into(),
                http_only: true,
                same_site: SameSite::Lax,
                secure: false,
            },
        }
    }

    pub fn cookie_domain(mut self, cookie_domain: impl Into<String>) -> Self {
        self.config.cookie_domain = Some(cookie_domain.into());

        self
    }

    pub fn cookie_name(mut self, cookie_name: impl Into<String>) -> Self {
        self.config.cookie_name = cookie_name.into();

        self
    }

    pub fn cookie_path(mut self, cookie_path: impl Into<String>) -> Self {
        self.config.cookie_path = cookie_path.into();

        self
    }

    pub fn header_name(mut self, header_name: impl Into<String>) -> Self {
        self.config.header_name = header_name.into();

        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.config.http_only = http_only;

        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.config.same_site = same_site;

        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.config.secure = secure;

        self
    }
}

impl<S> Layer<S> for Twofold {
    type Service = CookieManager<GuardService<TwofoldService<S>>>;

    fn layer(&self, inner: S) -> Self::Service {
        let config = Arc::new(self.config.clone());

        CookieManager::new(GuardService::new(
            config.clone(),
            TwofoldService { config, inner },
        ))
    }
}

#[derive(Clone)]
pub struct TwofoldService<S> {
    config: Arc<Config>,
    inner: S,
}

impl<S, Q, R> Service<Request<Q>> for TwofoldService<S>
where
    S: Service<Request<Q>, Response = Response<R>> + Send + 'static,
    S::Future: Send + 'static,
    Q: Send + 'static,
    R: From<&'static str> + Send,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Q>) -> Self::Future {
        let cookies = match request
            .extensions()
            .get::<Cookies>()
            .ok_or(Error::ExtensionNotFound("Cookies".into()))
        {
            Ok(cookies) => cookies,
            Err(err) => return Box::pin(async move { Error::make_layer_error(err) }),
        };

        let token = Token {
            config: self.config.clone(),
            cookies: cookies.clone(),
        };

        // Only ever issues when the client shows up without a cookie, so an
        // established token survives across requests. An empty value counts
        // as no cookie, same as the guard reads it.
        if cookies
            .get(&self.config.cookie_name)
            .filter(|cookie| !cookie.value().is_empty())
            .is_none()
        {
            if let Err(err) = token.issue() {
                return Box::pin(async move { Error::make_layer_error(err) });
            };
        }

        request.extensions_mut().insert(token);

        Box::pin(self.inner.call(request))
    }
}

use futures_util::future::BoxFuture;
use http::{Method, Request, Response};
use std::{
    sync::Arc,
    task::{Context, Poll},
};
use subtle::ConstantTimeEq;
use tower_cookies::Cookies;
use tower_service::Service;

use crate::{error::Error, twofold::Config};

/// Safe methods never mutate state, so they are exempt from token checks.
/// Anything outside this set is guarded, including nonstandard verbs.
pub(crate) fn is_safe(method: &Method) -> bool {
    [Method::GET, Method::HEAD, Method::OPTIONS, Method::TRACE].contains(method)
}

#[derive(Clone)]
pub struct GuardService<S> {
    config: Arc<Config>,
    inner: S,
}

impl<S> GuardService<S> {
    pub(crate) fn new(config: Arc<Config>, inner: S) -> Self {
        Self { config, inner }
    }

    /// The double-submit check: cookie and header token must both be present,
    /// both carry a valid signature, and agree on the embedded secret.
    pub(crate) fn check(&self, cookie: Option<&str>, header: Option<&str>) -> Result<(), Error> {
        let (Some(cookie), Some(header)) = (cookie, header) else {
            return Err(Error::MissingToken);
        };

        let cookie_secret = self.config.verify(cookie)?;
        let header_secret = self.config.verify(header)?;

        // Comparison time must not depend on where the secrets diverge.
        if bool::from(cookie_secret.as_bytes().ct_eq(header_secret.as_bytes())) {
            Ok(())
        } else {
            Err(Error::Mismatch)
        }
    }
}

impl<S, Q, R> Service<Request<Q>> for GuardService<S>
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

    fn call(&mut self, request: Request<Q>) -> Self::Future {
        if is_safe(request.method()) {
            return Box::pin(self.inner.call(request));
        }

        let cookies = match request
            .extensions()
            .get::<Cookies>()
            .ok_or(Error::ExtensionNotFound("Cookies".into()))
        {
            Ok(cookies) => cookies,
            Err(err) => return Box::pin(async move { Error::make_layer_error(err) }),
        };

        let cookie_value = cookies
            .get(&self.config.cookie_name)
            .map(|cookie| cookie.value().to_owned())
            .filter(|value| !value.is_empty());
        let header_value = request
            .headers()
            .get(&self.config.header_name)
            .and_then(|header| header.to_str().ok())
            .filter(|value| !value.is_empty());

        match self.check(cookie_value.as_deref(), header_value) {
            Ok(()) => Box::pin(self.inner.call(request)),
            Err(err @ (Error::MissingToken | Error::BadSignature | Error::Mismatch)) => {
                Box::pin(async move { Error::make_layer_reject(&err) })
            }
            Err(err) => Box::pin(async move { Error::make_layer_error(err) }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{is_safe, GuardService};
    use crate::{token::fresh_secret, Error, Twofold};
    use http::Method;
    use std::sync::Arc;

    fn guard() -> GuardService<()> {
        GuardService::new(Arc::new(Twofold::new("test-signing-key").config), ())
    }

    #[test]
    fn exempts_safe_methods_only() {
        for method in [Method::GET, Method::HEAD, Method::OPTIONS, Method::TRACE] {
            assert!(is_safe(&method), "{method}");
        }

        for method in [
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::CONNECT,
        ] {
            assert!(!is_safe(&method), "{method}");
        }

        // Unknown verbs get no exemption either.
        assert!(!is_safe(&Method::from_bytes(b"LOCK").unwrap()));
    }

    #[test]
    fn requires_both_tokens() {
        let guard = guard();
        let token = guard.config.sign(&fresh_secret()).unwrap();

        assert_eq!(guard.check(None, None), Err(Error::MissingToken));
        assert_eq!(guard.check(Some(&token), None), Err(Error::MissingToken));
        assert_eq!(guard.check(None, Some(&token)), Err(Error::MissingToken));
    }

    #[test]
    fn rejects_unsigned_tokens() {
        let guard = guard();
        let token = guard.config.sign(&fresh_secret()).unwrap();
        let bare = fresh_secret();

        assert_eq!(
            guard.check(Some(&bare), Some(&token)),
            Err(Error::BadSignature)
        );
        assert_eq!(
            guard.check(Some(&token), Some(&bare)),
            Err(Error::BadSignature)
        );
    }

    #[test]
    fn rejects_tokens_with_different_secrets() {
        let guard = guard();
        let one = guard.config.sign(&fresh_secret()).unwrap();
        let two = guard.config.sign(&fresh_secret()).unwrap();

        assert_eq!(guard.check(Some(&one), Some(&two)), Err(Error::Mismatch));
    }

    #[test]
    fn accepts_matching_tokens() {
        let guard = guard();
        let token = guard.config.sign(&fresh_secret()).unwrap();

        assert_eq!(guard.check(Some(&token), Some(&token)), Ok(()));
    }
}

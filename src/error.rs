use http::{header, HeaderValue, StatusCode};

/// Fixed body sent with every rejection, regardless of which check failed.
pub(crate) const REJECTION_BODY: &str = "CSRF verification failed";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// Maps the [`hmac::digest::InvalidLength`] error.
    #[error("invalid signing key length")]
    InvalidLength,
    /// An expected extension was missing.
    #[error("couldn't extract `{0}`. is the `Twofold` layer enabled?")]
    ExtensionNotFound(String),
    /// A submitted token failed signature verification.
    #[error("token signature is invalid")]
    BadSignature,
    /// The cookie or header token was absent where one was required.
    #[error("no token submitted")]
    MissingToken,
    /// Cookie and header tokens are both signed but carry different secrets.
    #[error("cookie and header tokens don't match")]
    Mismatch,
}

impl Error {
    pub(crate) fn make_layer_error<T: From<&'static str>, E>(
        err: impl std::error::Error,
    ) -> Result<http::Response<T>, E> {
        tracing::error!(err = %err);

        let mut response = http::Response::new(T::from(""));
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;

        Ok(response)
    }

    pub(crate) fn make_layer_reject<T: From<&'static str>, E>(
        err: &Error,
    ) -> Result<http::Response<T>, E> {
        tracing::debug!(err = %err, "rejected request");

        let mut response = http::Response::new(T::from(REJECTION_BODY));
        *response.status_mut() = StatusCode::FORBIDDEN;
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        Ok(response)
    }
}

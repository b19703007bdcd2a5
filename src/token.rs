use std::sync::Arc;

use base64::prelude::*;
use hmac::{digest::Output, Mac};
use rand::prelude::*;
use tower_cookies::{Cookie, Cookies};

use crate::{error::Error, twofold::Config, HmacSha256};

/// Produces a fresh CSRF secret: 32 random bytes, URL-safe encoded.
pub(crate) fn fresh_secret() -> String {
    let mut random = [0u8; 32];
    thread_rng().fill(&mut random);

    BASE64_URL_SAFE_NO_PAD.encode(random)
}

impl Config {
    /// The signing key is derived from the server key and the cookie name, so a
    /// token minted for one cookie name never verifies under another.
    fn namespaced_key(&self) -> Result<Output<HmacSha256>, Error> {
        let mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| Error::InvalidLength)?;

        Ok(mac
            .chain_update(self.cookie_name.as_bytes())
            .finalize()
            .into_bytes())
    }

    pub(crate) fn sign(&self, secret: &str) -> Result<String, Error> {
        let key = self.namespaced_key()?;
        let mut mac =
            HmacSha256::new_from_slice(key.as_slice()).map_err(|_| Error::InvalidLength)?;
        mac.update(secret.as_bytes());
        let signature = BASE64_URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{signature}.{secret}"))
    }

    /// Returns the embedded secret when the signature checks out. Any malformed
    /// or tampered input is an [`Error::BadSignature`], never a panic.
    pub(crate) fn verify(&self, token: &str) -> Result<String, Error> {
        let Some((signature, secret)) = token.split_once('.') else {
            return Err(Error::BadSignature);
        };
        let Ok(signature) = BASE64_URL_SAFE_NO_PAD.decode(signature) else {
            return Err(Error::BadSignature);
        };

        let key = self.namespaced_key()?;
        let mut mac =
            HmacSha256::new_from_slice(key.as_slice()).map_err(|_| Error::InvalidLength)?;
        mac.update(secret.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| Error::BadSignature)?;

        Ok(secret.to_owned())
    }
}

/// Handle to the CSRF token associated with the current request, available to
/// handlers through the request extensions.
#[derive(Clone)]
pub struct Token {
    pub(crate) config: Arc<Config>,
    pub(crate) cookies: Cookies,
}

impl Token {
    pub(crate) fn issue(&self) -> Result<(), Error> {
        let token = self.config.sign(&fresh_secret())?;

        let mut cookie = Cookie::build((self.config.cookie_name.clone(), token))
            .path(self.config.cookie_path.clone())
            .http_only(self.config.http_only)
            .same_site(self.config.same_site)
            .secure(self.config.secure);

        if let Some(domain) = &self.config.cookie_domain {
            cookie = cookie.domain(domain.clone());
        }

        self.cookies.add(cookie.build());

        Ok(())
    }

    /// The signed token for this request: the value of the inbound cookie, or
    /// the freshly minted one when the request arrived without a cookie.
    pub fn get(&self) -> Result<String, Error> {
        self.cookies
            .get(&self.config.cookie_name)
            .map(|cookie| cookie.value().to_owned())
            .ok_or(Error::MissingToken)
    }

    /// Removes the cookie. The next cookie-less response gets a fresh token.
    pub fn reset(&self) {
        let mut cookie = Cookie::build((self.config.cookie_name.clone(), ""))
            .path(self.config.cookie_path.clone());

        if let Some(domain) = &self.config.cookie_domain {
            cookie = cookie.domain(domain.clone());
        }

        self.cookies.remove(cookie.build());
    }
}

#[cfg(test)]
mod tests {
    use super::fresh_secret;
    use crate::{twofold::Config, Error, Twofold};

    fn config() -> Config {
        Twofold::new("test-signing-key").config
    }

    #[test]
    fn round_trip_returns_the_secret() {
        let config = config();
        let secret = fresh_secret();

        let token = config.sign(&secret).unwrap();

        assert_eq!(config.verify(&token).unwrap(), secret);
    }

    #[test]
    fn fresh_secrets_are_unique_and_url_safe() {
        let one = fresh_secret();
        let two = fresh_secret();

        assert_ne!(one, two);
        // 32 bytes of randomness, unpadded.
        assert_eq!(one.len(), 43);
        assert!(one
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn rejects_tampered_secret() {
        let config = config();
        let token = config.sign(&fresh_secret()).unwrap();

        let (signature, secret) = token.split_once('.').unwrap();
        let forged = format!("{signature}.{}", secret.to_uppercase());

        assert_eq!(config.verify(&forged), Err(Error::BadSignature));
    }

    #[test]
    fn rejects_tampered_signature() {
        let config = config();
        let token = config.sign(&fresh_secret()).unwrap();

        let (signature, secret) = token.split_once('.').unwrap();
        let mut flipped = signature.to_owned();
        flipped.replace_range(0..1, if &flipped[0..1] == "A" { "B" } else { "A" });

        assert_eq!(
            config.verify(&format!("{flipped}.{secret}")),
            Err(Error::BadSignature)
        );
    }

    #[test]
    fn rejects_malformed_input_without_panicking() {
        let config = config();

        for input in [
            "",
            ".",
            "..",
            "no-separator",
            "n0t/b64!.payload",
            ".payload-without-signature",
            "signature-without-payload.",
            "QQ.short-signature",
            "\u{1f980}.\u{1f980}",
            &"A".repeat(10_000),
        ] {
            assert_eq!(config.verify(input), Err(Error::BadSignature), "{input:?}");
        }
    }

    #[test]
    fn binds_tokens_to_the_cookie_name() {
        let config = config();
        let foreign = Twofold::new("test-signing-key")
            .cookie_name("othertoken")
            .config;

        let secret = fresh_secret();
        let token = config.sign(&secret).unwrap();

        assert_eq!(foreign.verify(&token), Err(Error::BadSignature));
        assert_eq!(config.verify(&token).unwrap(), secret);
    }

    #[test]
    fn binds_tokens_to_the_signing_key() {
        let config = config();
        let other = Twofold::new("another-signing-key").config;

        let token = config.sign(&fresh_secret()).unwrap();

        assert_eq!(other.verify(&token), Err(Error::BadSignature));
    }
}

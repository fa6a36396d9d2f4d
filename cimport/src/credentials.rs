//! API token credentials and the contact service authorization headers

use crate::error::{ImportError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use std::fmt;

/// Account-scoping header sent on every contact service call
pub const ACCOUNT_KEY_HEADER: &str = "x-account-key";

/// API token key/secret pair plus the account they act on
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    token_key: String,
    token_secret: String,
    account_key: String,
}

impl Credentials {
    pub fn new(
        token_key: impl Into<String>,
        token_secret: impl Into<String>,
        account_key: impl Into<String>,
    ) -> Self {
        Self {
            token_key: token_key.into(),
            token_secret: token_secret.into(),
            account_key: account_key.into(),
        }
    }

    pub fn token_key(&self) -> &str {
        &self.token_key
    }

    pub fn account_key(&self) -> &str {
        &self.account_key
    }

    /// Base64 of `key:secret` (RFC 7617 basic credentials)
    pub fn basic_credential(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.token_key, self.token_secret))
    }

    /// Full `Authorization` header value
    pub fn authorization_value(&self) -> String {
        format!("Basic {}", self.basic_credential())
    }

    /// Headers attached to every contact service request
    ///
    /// The authorization value is marked sensitive so it is never printed by
    /// reqwest's debug output.
    pub fn default_headers(&self) -> Result<HeaderMap> {
        let mut auth = HeaderValue::from_str(&self.authorization_value())
            .map_err(|e| ImportError::Config(format!("Invalid API token: {}", e)))?;
        auth.set_sensitive(true);

        let account = HeaderValue::from_str(&self.account_key)
            .map_err(|e| ImportError::Config(format!("Invalid account key: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(HeaderName::from_static(ACCOUNT_KEY_HEADER), account);
        Ok(headers)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token_key", &self.token_key)
            .field("token_secret", &"<redacted>")
            .field("account_key", &self.account_key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(credential: &str) -> String {
        String::from_utf8(STANDARD.decode(credential).unwrap()).unwrap()
    }

    #[test]
    fn test_basic_credential_round_trips() {
        let pairs = [
            ("key", "secret"),
            ("AbC123", "s3cr3t/with+chars=="),
            ("", ""),
            ("ключ", "секрет"),
        ];
        for (key, secret) in pairs {
            let creds = Credentials::new(key, secret, "acct");
            assert_eq!(decode(&creds.basic_credential()), format!("{}:{}", key, secret));
        }
    }

    #[test]
    fn test_known_authorization_value() {
        let creds = Credentials::new("Aladdin", "open sesame", "acct");
        assert_eq!(
            creds.authorization_value(),
            "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ=="
        );
    }

    #[test]
    fn test_default_headers() {
        let creds = Credentials::new("key", "secret", "acct-42");
        let headers = creds.default_headers().unwrap();

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Basic a2V5OnNlY3JldA==");
        assert!(headers.get(AUTHORIZATION).unwrap().is_sensitive());
        assert_eq!(headers.get("X-Account-Key").unwrap(), "acct-42");
    }

    #[test]
    fn test_account_key_with_newline_rejected() {
        let creds = Credentials::new("key", "secret", "acct\n");
        assert!(matches!(creds.default_headers(), Err(ImportError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("key", "topsecret", "acct");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("topsecret"));
        assert!(rendered.contains("key"));
    }
}

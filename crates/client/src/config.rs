//! Client configuration, read from the process environment.

use std::time::Duration;

use retailerp_auth::BearerToken;

use crate::error::{ClientError, ClientResult};

pub const API_URL_VAR: &str = "RETAILERP_API_URL";
pub const AUTH_TOKEN_VAR: &str = "RETAILERP_AUTH_TOKEN";
pub const TIMEOUT_VAR: &str = "RETAILERP_HTTP_TIMEOUT_SECS";

pub const DEFAULT_API_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash.
    pub api_url: String,
    pub auth_token: Option<BearerToken>,
    /// Overrides reqwest's default (no timeout) when set.
    pub timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            auth_token: None,
            timeout: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(BearerToken::new(token));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn from_env() -> ClientResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ClientResult<Self> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_url = non_empty(API_URL_VAR).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ClientError::Validation(format!(
                "{API_URL_VAR} must be an http(s) URL, got '{api_url}'"
            )));
        }

        let timeout = match non_empty(TIMEOUT_VAR) {
            None => None,
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| {
                    ClientError::Validation(format!(
                        "{TIMEOUT_VAR} must be a whole number of seconds, got '{raw}'"
                    ))
                })?;
                if secs == 0 {
                    return Err(ClientError::Validation(format!(
                        "{TIMEOUT_VAR} must be greater than zero"
                    )));
                }
                Some(Duration::from_secs(secs))
            }
        };

        let mut config = Self::new(api_url);
        config.auth_token = non_empty(AUTH_TOKEN_VAR).map(BearerToken::new);
        config.timeout = timeout;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert!(config.auth_token.is_none());
        assert!(config.timeout.is_none());
    }

    #[test]
    fn reads_all_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_URL_VAR, "https://erp.example.com/api/"),
            (AUTH_TOKEN_VAR, " abc "),
            (TIMEOUT_VAR, "15"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, "https://erp.example.com/api");
        assert_eq!(config.auth_token.unwrap().expose(), "abc");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
    }

    #[test]
    fn blank_token_is_treated_as_absent() {
        let config = ClientConfig::from_lookup(lookup(&[(AUTH_TOKEN_VAR, "   ")])).unwrap();
        assert!(config.auth_token.is_none());
    }

    #[test]
    fn rejects_bad_timeout_and_url() {
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "soon")])),
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(TIMEOUT_VAR, "0")])),
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(API_URL_VAR, "localhost:8080")])),
            Err(ClientError::Validation(_))
        ));
    }
}

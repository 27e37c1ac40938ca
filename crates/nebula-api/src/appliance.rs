// Appliance record: where an instance lives and how to log into it.

use std::fmt;
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Failure to parse a `url|password` appliance string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseApplianceError {
    #[error("invalid appliance format, expected 'url|password'")]
    MissingSeparator,

    #[error("invalid appliance url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// One Pi-hole instance, primary or replica.
///
/// Immutable after construction. The base URL is the identity used in
/// logs and error context; the password never leaves this struct except
/// when posted to `/api/auth`.
#[derive(Debug, Clone)]
pub struct Appliance {
    url: Url,
    password: SecretString,
}

impl Appliance {
    pub fn new(url: Url, password: SecretString) -> Self {
        Self { url, password }
    }

    /// Base address (scheme, host, port and optional path prefix).
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }
}

impl fmt::Display for Appliance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str().trim_end_matches('/'))
    }
}

impl FromStr for Appliance {
    type Err = ParseApplianceError;

    /// Parse `http://host:port|password`. Only the first `|` separates, so
    /// passwords may themselves contain `|`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (raw_url, password) = value
            .split_once('|')
            .ok_or(ParseApplianceError::MissingSeparator)?;

        let url = Url::parse(raw_url.trim()).map_err(|e| ParseApplianceError::InvalidUrl {
            url: raw_url.to_owned(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ParseApplianceError::InvalidUrl {
                url: raw_url.to_owned(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(Self {
            url,
            password: SecretString::from(password.to_owned()),
        })
    }
}

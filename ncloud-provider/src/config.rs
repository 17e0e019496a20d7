//! Provider configuration
//!
//! Built once per provider instance and shared read-only by every resource
//! adapter. The `support_vpc` flag selects the client family each adapter
//! talks to.

use std::fmt;
use std::str::FromStr;

use ncloud_core::resource::{Attributes, Value};
use thiserror::Error;

pub const ACCESS_KEY_ENV: &str = "NCLOUD_ACCESS_KEY";
pub const SECRET_KEY_ENV: &str = "NCLOUD_SECRET_KEY";
pub const REGION_ENV: &str = "NCLOUD_REGION";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("region is required (set `region` or {REGION_ENV})")]
    MissingRegion,

    #[error("credentials are required (set {ACCESS_KEY_ENV} and {SECRET_KEY_ENV})")]
    MissingCredentials,

    #[error("invalid site '{0}', expected one of: public, gov, fin")]
    InvalidSite(String),

    #[error("provider attribute '{name}' must be a {expected}")]
    InvalidAttribute { name: String, expected: &'static str },

    #[error("unknown provider attribute '{0}'")]
    UnknownAttribute(String),
}

/// Platform site; each has its own API gateway domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Site {
    #[default]
    Public,
    Gov,
    Fin,
}

impl Site {
    /// API gateway serving the query-style APIs (autoscaling, vpc, ...)
    pub fn api_gateway(&self) -> &'static str {
        match self {
            Site::Public => "https://ncloud.apigw.ntruss.com",
            Site::Gov => "https://ncloud.apigw.gov-ntruss.com",
            Site::Fin => "https://fin-ncloud.apigw.fin-ntruss.com",
        }
    }

    /// SourceBuild REST endpoint for the given account model
    pub fn sourcebuild_endpoint(&self, support_vpc: bool) -> &'static str {
        match (self, support_vpc) {
            (Site::Public, false) => "https://sourcebuild.apigw.ntruss.com/api/v1",
            (Site::Public, true) => "https://vpcsourcebuild.apigw.ntruss.com/api/v1",
            (Site::Gov, false) => "https://sourcebuild.apigw.gov-ntruss.com/api/v1",
            (Site::Gov, true) => "https://vpcsourcebuild.apigw.gov-ntruss.com/api/v1",
            (Site::Fin, false) => "https://sourcebuild.apigw.fin-ntruss.com/api/v1",
            (Site::Fin, true) => "https://vpcsourcebuild.apigw.fin-ntruss.com/api/v1",
        }
    }
}

impl FromStr for Site {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Site::Public),
            "gov" => Ok(Site::Gov),
            "fin" => Ok(Site::Fin),
            other => Err(ConfigError::InvalidSite(other.to_string())),
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Site::Public => "public",
            Site::Gov => "gov",
            Site::Fin => "fin",
        };
        write!(f, "{}", s)
    }
}

/// API key pair
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Read `NCLOUD_ACCESS_KEY` / `NCLOUD_SECRET_KEY`
    pub fn from_env() -> Option<Self> {
        let access_key = std::env::var(ACCESS_KEY_ENV).ok()?;
        let secret_key = std::env::var(SECRET_KEY_ENV).ok()?;
        Some(Self::new(access_key, secret_key))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Provider-wide settings
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Region code, e.g. "KR"
    pub region: String,
    /// true: VPC account model, false: classic
    pub support_vpc: bool,
    pub site: Site,
    pub credentials: Option<Credentials>,
}

impl ProviderConfig {
    pub fn new(region: impl Into<String>, support_vpc: bool) -> Self {
        Self {
            region: region.into(),
            support_vpc,
            site: Site::default(),
            credentials: None,
        }
    }

    pub fn with_site(mut self, site: Site) -> Self {
        self.site = site;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Build from a manifest `[provider]` table.
    ///
    /// Recognised keys: `region`, `support_vpc`, `site`, `access_key`,
    /// `secret_key`. Missing region falls back to `NCLOUD_REGION`; missing
    /// credentials fall back to the environment.
    pub fn from_attributes(attributes: &Attributes) -> Result<Self, ConfigError> {
        for key in attributes.keys() {
            if !matches!(
                key.as_str(),
                "region" | "support_vpc" | "site" | "access_key" | "secret_key"
            ) {
                return Err(ConfigError::UnknownAttribute(key.clone()));
            }
        }

        let region = match attributes.get("region") {
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(invalid("region", "string")),
            None => std::env::var(REGION_ENV).map_err(|_| ConfigError::MissingRegion)?,
        };

        let support_vpc = match attributes.get("support_vpc") {
            Some(Value::Bool(b)) => *b,
            Some(_) => return Err(invalid("support_vpc", "boolean")),
            None => false,
        };

        let site = match attributes.get("site") {
            Some(Value::String(s)) => s.parse()?,
            Some(_) => return Err(invalid("site", "string")),
            None => Site::default(),
        };

        let credentials = match (attributes.get("access_key"), attributes.get("secret_key")) {
            (Some(Value::String(a)), Some(Value::String(s))) => Some(Credentials::new(a, s)),
            (None, None) => Credentials::from_env(),
            _ => return Err(ConfigError::MissingCredentials),
        };

        let config = Self {
            region,
            support_vpc,
            site,
            credentials,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.region.trim().is_empty() {
            return Err(ConfigError::MissingRegion);
        }
        Ok(())
    }

    /// Credentials, required before any remote call
    pub fn require_credentials(&self) -> Result<&Credentials, ConfigError> {
        self.credentials
            .as_ref()
            .ok_or(ConfigError::MissingCredentials)
    }

    /// Human readable account model name
    pub fn account_model(&self) -> &'static str {
        if self.support_vpc { "vpc" } else { "classic" }
    }
}

fn invalid(name: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidAttribute {
        name: name.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn attrs(pairs: &[(&str, Value)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect::<HashMap<_, _>>()
    }

    #[test]
    fn from_attributes_reads_all_keys() {
        let config = ProviderConfig::from_attributes(&attrs(&[
            ("region", Value::from("KR")),
            ("support_vpc", Value::Bool(true)),
            ("site", Value::from("gov")),
            ("access_key", Value::from("AK")),
            ("secret_key", Value::from("SK")),
        ]))
        .unwrap();

        assert_eq!(config.region, "KR");
        assert!(config.support_vpc);
        assert_eq!(config.site, Site::Gov);
        assert_eq!(config.credentials, Some(Credentials::new("AK", "SK")));
        assert_eq!(config.account_model(), "vpc");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            ProviderConfig::from_attributes(&attrs(&[
                ("region", Value::from("KR")),
                ("support_vpc", Value::from("yes")),
            ])),
            Err(ConfigError::InvalidAttribute { .. })
        ));
        assert!(matches!(
            ProviderConfig::from_attributes(&attrs(&[
                ("region", Value::from("KR")),
                ("site", Value::from("moon")),
            ])),
            Err(ConfigError::InvalidSite(_))
        ));
        assert!(matches!(
            ProviderConfig::from_attributes(&attrs(&[
                ("region", Value::from("KR")),
                ("access_key", Value::from("AK")),
            ])),
            Err(ConfigError::MissingCredentials)
        ));
        assert!(matches!(
            ProviderConfig::from_attributes(&attrs(&[
                ("region", Value::from("KR")),
                ("zone", Value::from("KR-1")),
            ])),
            Err(ConfigError::UnknownAttribute(_))
        ));
    }

    #[test]
    fn empty_region_is_invalid() {
        assert!(ProviderConfig::new(" ", false).validate().is_err());
        assert!(ProviderConfig::new("KR", false).validate().is_ok());
    }

    #[test]
    fn endpoints_follow_site_and_model() {
        assert_eq!(Site::Public.api_gateway(), "https://ncloud.apigw.ntruss.com");
        assert_eq!(
            Site::Public.sourcebuild_endpoint(true),
            "https://vpcsourcebuild.apigw.ntruss.com/api/v1"
        );
        assert_eq!(
            Site::Fin.sourcebuild_endpoint(false),
            "https://sourcebuild.apigw.fin-ntruss.com/api/v1"
        );
    }

    #[test]
    fn debug_redacts_secret() {
        let creds = Credentials::new("AK", "very-secret");
        let rendered = format!("{:?}", creds);
        assert!(rendered.contains("AK"));
        assert!(!rendered.contains("very-secret"));
    }
}

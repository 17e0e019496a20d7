//! NCloud API clients
//!
//! One trait per API family. The HTTP implementations talk to the API
//! gateway; tests substitute recording mocks. [`Clients`] bundles one
//! instance of each family and is built once from the provider config.

pub mod autoscaling;
pub mod http;
#[cfg(test)]
pub mod mock;
pub mod signer;
pub mod sourcebuild;
pub mod vautoscaling;
pub mod vpc;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ConfigError, ProviderConfig};
use autoscaling::{AutoScalingApi, HttpAutoScalingApi};
use http::{QueryApiClient, RestApiClient};
use signer::Signer;
use sourcebuild::{HttpSourceBuildApi, SourceBuildApi};
use vautoscaling::{HttpVautoScalingApi, VautoScalingApi};
use vpc::{HttpVpcApi, VpcApi};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}, code {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("Failed to decode {operation} response: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ApiError {
    /// The platform reported the target does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Api { status: 404, .. })
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Code/name pair the platform uses for enumerations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonCode {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub code_name: Option<String>,
}

impl CommonCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            code_name: None,
        }
    }
}

/// One client per API family
#[derive(Clone)]
pub struct Clients {
    pub autoscaling: Arc<dyn AutoScalingApi>,
    pub vautoscaling: Arc<dyn VautoScalingApi>,
    pub vpc: Arc<dyn VpcApi>,
    pub sourcebuild: Arc<dyn SourceBuildApi>,
    pub vsourcebuild: Arc<dyn SourceBuildApi>,
}

impl Clients {
    /// HTTP clients signed with the configured credentials
    pub fn from_config(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let signer = Signer::new(config.require_credentials()?.clone());
        let http = reqwest::Client::new();
        let gateway = config.site.api_gateway();

        let query = |service: &'static str| {
            QueryApiClient::new(http.clone(), gateway, service, signer.clone())
        };
        let rest = |support_vpc: bool| {
            RestApiClient::new(
                http.clone(),
                config.site.sourcebuild_endpoint(support_vpc),
                signer.clone(),
            )
        };

        Ok(Self {
            autoscaling: Arc::new(HttpAutoScalingApi::new(query("autoscaling"))),
            vautoscaling: Arc::new(HttpVautoScalingApi::new(query("vautoscaling"))),
            vpc: Arc::new(HttpVpcApi::new(query("vpc"))),
            sourcebuild: Arc::new(HttpSourceBuildApi::new(rest(false))),
            vsourcebuild: Arc::new(HttpSourceBuildApi::new(rest(true))),
        })
    }
}

impl std::fmt::Debug for Clients {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Clients").finish_non_exhaustive()
    }
}

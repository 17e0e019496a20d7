//! Resource and data source registry
//!
//! This module defines:
//! - The adapter traits every resource and data source implements
//! - Type definitions (implementing ResourceType) for schema discovery
//! - The registry mapping type names to adapters built for one configuration

use std::collections::HashMap;

use async_trait::async_trait;
use ncloud_core::provider::{ProviderError, ProviderResult, ResourceType};
use ncloud_core::resource::Attributes;
use ncloud_core::schema::ResourceSchema;

use crate::client::Clients;
use crate::config::ProviderConfig;
use crate::services::autoscaling::policy::{self, AutoScalingPolicyResource};
use crate::services::devtools::sourcebuild_env::{Lookup, SourceBuildLookup};
use crate::services::devtools::sourcebuild_project::{self, SourceBuildProjectResource};
use crate::services::devtools::sourcebuild_project_data_source::{
    self, SourceBuildProjectDataSource,
};
use crate::services::vpc::nat_gateway::{self, NatGatewayResource};
use crate::services::vpc::nat_gateway_data_source::{self, NatGatewayDataSource};

// =============================================================================
// Adapter Traits
// =============================================================================

/// Lifecycle of one managed resource type.
///
/// Attributes have been validated against the schema before any call.
#[async_trait]
pub trait ManagedResource: Send + Sync {
    /// Create the resource and return its platform identifier
    async fn create(&self, attributes: &Attributes) -> ProviderResult<String>;

    /// Current attributes, or `None` when the resource no longer exists.
    /// `known` holds the last recorded attributes (parent identifiers).
    async fn read(&self, identifier: &str, known: &Attributes) -> ProviderResult<Option<Attributes>>;

    async fn update(&self, identifier: &str, from: &Attributes, to: &Attributes)
    -> ProviderResult<()>;

    /// Delete the resource. Already gone is success.
    async fn delete(&self, identifier: &str, known: &Attributes) -> ProviderResult<()>;
}

/// Outcome of a data source read
#[derive(Debug, Clone, PartialEq)]
pub struct DataSourceResult {
    pub id: String,
    pub attributes: Attributes,
}

impl DataSourceResult {
    pub fn new(id: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            id: id.into(),
            attributes,
        }
    }
}

#[async_trait]
pub trait DataSource: Send + Sync {
    async fn read(&self, attributes: &Attributes) -> ProviderResult<DataSourceResult>;
}

// =============================================================================
// Type Definitions
// =============================================================================

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema
            }
        }
    };
}

define_resource_type!(
    AutoScalingPolicyType,
    policy::RESOURCE_NAME,
    policy::schema()
);
define_resource_type!(
    NatGatewayType,
    nat_gateway::RESOURCE_NAME,
    nat_gateway::schema()
);
define_resource_type!(
    SourceBuildProjectType,
    sourcebuild_project::RESOURCE_NAME,
    sourcebuild_project::schema()
);

define_resource_type!(
    NatGatewayDataSourceType,
    nat_gateway_data_source::DATA_SOURCE_NAME,
    nat_gateway_data_source::schema()
);
define_resource_type!(
    SourceBuildProjectDataSourceType,
    sourcebuild_project_data_source::DATA_SOURCE_NAME,
    sourcebuild_project_data_source::schema()
);

/// Build-environment lookups share one definition keyed by kind
pub struct LookupType(pub Lookup);

impl ResourceType for LookupType {
    fn name(&self) -> &'static str {
        self.0.type_name()
    }
    fn schema(&self) -> ResourceSchema {
        self.0.schema()
    }
}

/// Returns all managed resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(AutoScalingPolicyType),
        Box::new(NatGatewayType),
        Box::new(SourceBuildProjectType),
    ]
}

/// Returns all data sources supported by this provider
pub fn data_source_types() -> Vec<Box<dyn ResourceType>> {
    let mut types: Vec<Box<dyn ResourceType>> = vec![
        Box::new(NatGatewayDataSourceType),
        Box::new(SourceBuildProjectDataSourceType),
    ];
    types.extend(
        Lookup::ALL
            .into_iter()
            .map(|lookup| Box::new(LookupType(lookup)) as Box<dyn ResourceType>),
    );
    types
}

// =============================================================================
// Registry
// =============================================================================

/// Adapters built once for a provider configuration
pub struct Registry {
    resources: HashMap<&'static str, Box<dyn ManagedResource>>,
    data_sources: HashMap<&'static str, Box<dyn DataSource>>,
    schemas: HashMap<&'static str, ResourceSchema>,
    data_source_schemas: HashMap<&'static str, ResourceSchema>,
}

impl Registry {
    pub fn new(config: &ProviderConfig, clients: &Clients) -> Self {
        let mut resources: HashMap<&'static str, Box<dyn ManagedResource>> = HashMap::new();
        resources.insert(
            policy::RESOURCE_NAME,
            Box::new(AutoScalingPolicyResource::new(config, clients)),
        );
        resources.insert(
            nat_gateway::RESOURCE_NAME,
            Box::new(NatGatewayResource::new(config, clients)),
        );
        resources.insert(
            sourcebuild_project::RESOURCE_NAME,
            Box::new(SourceBuildProjectResource::new(config, clients)),
        );

        let mut data_sources: HashMap<&'static str, Box<dyn DataSource>> = HashMap::new();
        data_sources.insert(
            nat_gateway_data_source::DATA_SOURCE_NAME,
            Box::new(NatGatewayDataSource::new(config, clients)),
        );
        data_sources.insert(
            sourcebuild_project_data_source::DATA_SOURCE_NAME,
            Box::new(SourceBuildProjectDataSource::new(config, clients)),
        );
        for lookup in Lookup::ALL {
            data_sources.insert(
                lookup.type_name(),
                Box::new(SourceBuildLookup::new(lookup, config, clients)),
            );
        }

        let index = |types: Vec<Box<dyn ResourceType>>| {
            types
                .into_iter()
                .map(|t| (t.name(), t.schema()))
                .collect::<HashMap<_, _>>()
        };

        Self {
            resources,
            data_sources,
            schemas: index(resource_types()),
            data_source_schemas: index(data_source_types()),
        }
    }

    pub fn resource(&self, type_name: &str) -> ProviderResult<(&dyn ManagedResource, &ResourceSchema)> {
        match (self.resources.get(type_name), self.schemas.get(type_name)) {
            (Some(resource), Some(schema)) => Ok((resource.as_ref(), schema)),
            _ => Err(ProviderError::new(format!(
                "unknown resource type: {}",
                type_name
            ))),
        }
    }

    pub fn data_source(&self, type_name: &str) -> ProviderResult<(&dyn DataSource, &ResourceSchema)> {
        match (
            self.data_sources.get(type_name),
            self.data_source_schemas.get(type_name),
        ) {
            (Some(data_source), Some(schema)) => Ok((data_source.as_ref(), schema)),
            _ => Err(ProviderError::new(format!(
                "unknown data source: {}",
                type_name
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::Mocks;

    #[test]
    fn type_names_are_unique_per_kind() {
        let mut names: Vec<_> = resource_types().iter().map(|t| t.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(
            names,
            vec![
                "ncloud_auto_scaling_policy",
                "ncloud_nat_gateway",
                "ncloud_sourcebuild_project"
            ]
        );
        assert_eq!(data_source_types().len(), 7);
    }

    #[test]
    fn every_type_has_an_adapter() {
        let mocks = Mocks::new();
        let registry = Registry::new(&ProviderConfig::new("KR", true), &mocks.clients());
        for t in resource_types() {
            assert!(registry.resource(t.name()).is_ok(), "{}", t.name());
        }
        for t in data_source_types() {
            assert!(registry.data_source(t.name()).is_ok(), "{}", t.name());
        }
    }

    #[test]
    fn unknown_types_are_errors() {
        let mocks = Mocks::new();
        let registry = Registry::new(&ProviderConfig::new("KR", false), &mocks.clients());
        let err = registry.resource("ncloud_server").err().unwrap();
        assert_eq!(err.to_string(), "unknown resource type: ncloud_server");
        assert!(
            registry
                .data_source("ncloud_sourcebuild_project_os")
                .is_ok()
        );
        assert!(registry.data_source("ncloud_auto_scaling_policy").is_err());
    }
}

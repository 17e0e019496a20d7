//! NCloud Provider
//!
//! NAVER Cloud Platform resources and data sources for both the classic and
//! the VPC account model.
//!
//! ## Module Structure
//!
//! - `config` - Provider configuration (region, site, credentials)
//! - `client` - Signed API client families, one per platform service
//! - `services` - Resource adapters and data sources
//! - `resources` - Adapter traits and the type registry
//! - `provider` - NcloudProvider implementation
//! - `utils` - Typed attribute readers and writers

pub mod client;
pub mod config;
pub mod logging;
pub mod provider;
pub mod resources;
pub mod services;
pub mod utils;

// Re-export main types
pub use config::{ConfigError, Credentials, ProviderConfig, Site};
pub use provider::NcloudProvider;

use ncloud_core::provider::{BoxFuture, Provider, ProviderResult, ResourceType};
use ncloud_core::resource::{Attributes, Resource, ResourceId, State};

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for NcloudProvider {
    fn name(&self) -> &'static str {
        "ncloud"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::resource_types()
    }

    fn data_source_types(&self) -> Vec<Box<dyn ResourceType>> {
        resources::data_source_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: &str,
        known: &Attributes,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let known = known.clone();
        Box::pin(async move {
            self.read_resource(&id, &identifier, &known)
                .await
                .map_err(|e| e.for_resource(id))
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            self.create_resource(&resource)
                .await
                .map_err(|e| e.for_resource(resource.id))
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            self.update_resource(&id, &identifier, &from, &to)
                .await
                .map_err(|e| e.for_resource(id))
        })
    }

    fn delete(
        &self,
        id: &ResourceId,
        identifier: &str,
        known: &Attributes,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let known = known.clone();
        Box::pin(async move {
            self.delete_resource(&id, &identifier, &known)
                .await
                .map_err(|e| e.for_resource(id))
        })
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            self.evaluate_data_source(&resource)
                .await
                .map_err(|e| e.for_resource(resource.id))
        })
    }
}

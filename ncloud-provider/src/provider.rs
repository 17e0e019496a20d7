//! NCloud Provider implementation
//!
//! Dispatches lifecycle requests to the adapter registered for each type,
//! validating attributes first so invalid configuration never reaches the
//! network.

use ncloud_core::provider::{ProviderError, ProviderResult};
use ncloud_core::resource::{Attributes, Resource, ResourceId, State};
use ncloud_core::schema::ResourceSchema;
use tracing::{debug, info};

use crate::client::Clients;
use crate::config::{ConfigError, ProviderConfig};
use crate::resources::Registry;

/// NCloud Provider
pub struct NcloudProvider {
    config: ProviderConfig,
    registry: Registry,
}

fn validate(schema: &ResourceSchema, attributes: &Attributes) -> ProviderResult<()> {
    schema.validate(attributes).map_err(|errors| {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        ProviderError::new(format!("invalid configuration: {}", messages.join("; ")))
    })
}

impl NcloudProvider {
    /// Create a provider over explicit client families
    pub fn new(config: ProviderConfig, clients: Clients) -> Self {
        let registry = Registry::new(&config, &clients);
        Self { config, registry }
    }

    /// Create a provider talking to the live API gateway
    pub fn from_config(config: ProviderConfig) -> Result<Self, ConfigError> {
        let clients = Clients::from_config(&config)?;
        Ok(Self::new(config, clients))
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Read a resource
    pub async fn read_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        known: &Attributes,
    ) -> ProviderResult<State> {
        let (resource, _) = self.registry.resource(&id.resource_type)?;
        match resource.read(identifier, known).await? {
            Some(attributes) => Ok(State::existing(id.clone(), attributes).with_identifier(identifier)),
            None => {
                debug!(resource = %id, identifier, "resource not found");
                Ok(State::not_found(id.clone()))
            }
        }
    }

    /// Create a resource and read it back
    pub async fn create_resource(&self, resource: &Resource) -> ProviderResult<State> {
        let (adapter, schema) = self.registry.resource(&resource.id.resource_type)?;
        validate(schema, &resource.attributes)?;

        let identifier = adapter.create(&resource.attributes).await?;
        info!(resource = %resource.id, identifier = %identifier, "created");

        let state = self
            .read_resource(&resource.id, &identifier, &resource.attributes)
            .await?;
        if !state.exists {
            return Err(ProviderError::new(format!(
                "resource {} was created but could not be read back",
                identifier
            )));
        }
        Ok(state)
    }

    /// Update a resource in place and read it back
    pub async fn update_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let (adapter, schema) = self.registry.resource(&id.resource_type)?;
        validate(schema, &to.attributes)?;

        adapter
            .update(identifier, &from.attributes, &to.attributes)
            .await?;
        info!(resource = %id, identifier, "updated");

        let state = self.read_resource(id, identifier, &to.attributes).await?;
        if !state.exists {
            return Err(ProviderError::new(format!(
                "resource {} disappeared during update",
                identifier
            )));
        }
        Ok(state)
    }

    /// Delete a resource
    pub async fn delete_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        known: &Attributes,
    ) -> ProviderResult<()> {
        let (adapter, _) = self.registry.resource(&id.resource_type)?;
        adapter.delete(identifier, known).await?;
        info!(resource = %id, identifier, "deleted");
        Ok(())
    }

    /// Evaluate a data source
    pub async fn evaluate_data_source(&self, resource: &Resource) -> ProviderResult<State> {
        let (data_source, schema) = self.registry.data_source(&resource.id.resource_type)?;
        validate(schema, &resource.attributes)?;

        let result = data_source.read(&resource.attributes).await?;
        Ok(State::existing(resource.id.clone(), result.attributes).with_identifier(result.id))
    }
}

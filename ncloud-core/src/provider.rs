//! Provider - Trait abstracting resource operations
//!
//! A Provider exposes the resource types and data sources of one platform
//! and turns lifecycle requests into actual API calls.

use std::future::Future;
use std::pin::Pin;

use crate::resource::{Attributes, Resource, ResourceId, State};
use crate::schema::ResourceSchema;

/// Error type for Provider operations
#[derive(Debug)]
pub struct ProviderError {
    pub message: String,
    pub resource_id: Option<ResourceId>,
    pub cause: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref id) = self.resource_id {
            write!(f, "[{}.{}] {}", id.resource_type, id.name, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(ref cause) = self.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

impl std::error::Error for ProviderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &dyn std::error::Error)
    }
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            resource_id: None,
            cause: None,
        }
    }

    pub fn for_resource(mut self, id: ResourceId) -> Self {
        self.resource_id = Some(id);
        self
    }

    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Error for an operation the current account model cannot serve
    pub fn not_supported_classic(kind: &str, type_name: &str) -> Self {
        Self::new(format!(
            "{} `{}` does not support classic",
            kind, type_name
        ))
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Return type for async operations
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Definition of a resource type or data source a Provider can handle
pub trait ResourceType: Send + Sync {
    /// Registered name (e.g., "ncloud_nat_gateway")
    fn name(&self) -> &'static str;

    /// Attribute schema used to validate configuration
    fn schema(&self) -> ResourceSchema;
}

/// Main Provider trait
///
/// All operations are async and involve side effects. Callers validate
/// attributes against the schema before calling in.
pub trait Provider: Send + Sync {
    /// Name of this Provider (e.g., "ncloud")
    fn name(&self) -> &'static str;

    /// Managed resource types this Provider can handle
    fn resource_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Read-only data sources this Provider can handle
    fn data_source_types(&self) -> Vec<Box<dyn ResourceType>>;

    /// Get the current state of a resource
    ///
    /// `known` holds the attributes last recorded for the resource; adapters
    /// use them to re-resolve parent resources (e.g. the auto scaling group
    /// a policy belongs to). Returns `State::not_found()` if the resource
    /// does not exist.
    fn read(
        &self,
        id: &ResourceId,
        identifier: &str,
        known: &Attributes,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Create a resource
    ///
    /// Returns State with identifier set to the platform-assigned id
    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;

    /// Update a resource in place
    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>>;

    /// Delete a resource. A resource that is already gone is not an error.
    fn delete(
        &self,
        id: &ResourceId,
        identifier: &str,
        known: &Attributes,
    ) -> BoxFuture<'_, ProviderResult<()>>;

    /// Evaluate a data source declaration
    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>>;
}

/// Provider implementation for Box<dyn Provider>
/// This enables dynamic dispatch for Providers
impl Provider for Box<dyn Provider> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).resource_types()
    }

    fn data_source_types(&self) -> Vec<Box<dyn ResourceType>> {
        (**self).data_source_types()
    }

    fn read(
        &self,
        id: &ResourceId,
        identifier: &str,
        known: &Attributes,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read(id, identifier, known)
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).create(resource)
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).update(id, identifier, from, to)
    }

    fn delete(
        &self,
        id: &ResourceId,
        identifier: &str,
        known: &Attributes,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        (**self).delete(id, identifier, known)
    }

    fn read_data_source(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        (**self).read_data_source(resource)
    }
}

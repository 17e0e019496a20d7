//! `ncloud_sourcebuild_project` data source

use std::sync::Arc;

use async_trait::async_trait;
use ncloud_core::filter::validate_one_result;
use ncloud_core::provider::ProviderResult;
use ncloud_core::resource::{Attributes, Value};
use ncloud_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::sourcebuild_project::{self, find_project, project_attributes, sourcebuild_api};
use crate::client::Clients;
use crate::client::sourcebuild::SourceBuildApi;
use crate::config::ProviderConfig;
use crate::resources::{DataSource, DataSourceResult};
use crate::utils::required_string;

pub const DATA_SOURCE_NAME: &str = "ncloud_sourcebuild_project";

pub fn schema() -> ResourceSchema {
    sourcebuild_project::schema()
        .to_read_only(DATA_SOURCE_NAME)
        .with_description("Look up a SourceBuild project by number")
        .attribute(AttributeSchema::new("id", AttributeType::String).required())
}

pub struct SourceBuildProjectDataSource {
    api: Arc<dyn SourceBuildApi>,
}

impl SourceBuildProjectDataSource {
    pub fn new(config: &ProviderConfig, clients: &Clients) -> Self {
        Self {
            api: sourcebuild_api(config, clients),
        }
    }
}

#[async_trait]
impl DataSource for SourceBuildProjectDataSource {
    async fn read(&self, attributes: &Attributes) -> ProviderResult<DataSourceResult> {
        let id = required_string(attributes, "id")?;
        let project = find_project(self.api.as_ref(), &id).await?;
        validate_one_result(usize::from(project.is_some()))?;

        let mut attrs = project.as_ref().map(project_attributes).unwrap_or_default();
        attrs.insert("id".to_string(), Value::String(id.clone()));
        Ok(DataSourceResult::new(id, attrs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::Mocks;
    use crate::resources::ManagedResource;
    use crate::services::devtools::sourcebuild_project::SourceBuildProjectResource;
    use crate::services::devtools::sourcebuild_project::tests::declared;

    fn by_id(id: &str) -> Attributes {
        Attributes::from([("id".to_string(), Value::from(id))])
    }

    #[test]
    fn only_id_is_accepted() {
        let schema = schema();
        assert!(schema.validate(&by_id("1")).is_ok());
        assert!(schema.validate(&Attributes::new()).is_err());
        assert!(schema.validate(&declared()).is_err());
    }

    #[tokio::test]
    async fn reads_existing_project() {
        let mocks = Mocks::new();
        let config = ProviderConfig::new("KR", true);
        let id = SourceBuildProjectResource::new(&config, &mocks.clients())
            .create(&declared())
            .await
            .unwrap();

        let result = SourceBuildProjectDataSource::new(&config, &mocks.clients())
            .read(&by_id(&id))
            .await
            .unwrap();
        assert_eq!(result.id, id);
        assert_eq!(result.attributes["name"], Value::from("build-web"));
        assert_eq!(result.attributes["project_no"], Value::from(id.as_str()));
    }

    #[tokio::test]
    async fn missing_project_is_a_zero_result_error() {
        let mocks = Mocks::new();
        let err = SourceBuildProjectDataSource::new(&ProviderConfig::new("KR", false), &mocks.clients())
            .read(&by_id("404"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no matching result found"));
    }
}

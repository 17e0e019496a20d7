//! SourceBuild build-environment lookups
//!
//! Five list data sources that expose the catalog a project's `env` block
//! refers to. They support `filter` but have no singular constraint.

use std::sync::Arc;

use async_trait::async_trait;
use ncloud_core::filter::{apply_filters, filter_attribute, parse_filters};
use ncloud_core::provider::ProviderResult;
use ncloud_core::resource::{Attributes, Value};
use ncloud_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::sourcebuild_project::sourcebuild_api;
use crate::client::Clients;
use crate::client::sourcebuild::SourceBuildApi;
use crate::config::ProviderConfig;
use crate::resources::{DataSource, DataSourceResult};
use crate::utils::{api_error, insert_opt, required_int};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Computes,
    Os,
    Runtimes,
    RuntimeVersions,
    DockerEngines,
}

impl Lookup {
    pub const ALL: [Lookup; 5] = [
        Lookup::Computes,
        Lookup::Os,
        Lookup::Runtimes,
        Lookup::RuntimeVersions,
        Lookup::DockerEngines,
    ];

    pub fn type_name(self) -> &'static str {
        match self {
            Lookup::Computes => "ncloud_sourcebuild_project_computes",
            Lookup::Os => "ncloud_sourcebuild_project_os",
            Lookup::Runtimes => "ncloud_sourcebuild_project_os_runtimes",
            Lookup::RuntimeVersions => "ncloud_sourcebuild_project_os_runtime_versions",
            Lookup::DockerEngines => "ncloud_sourcebuild_project_docker_engines",
        }
    }

    /// Attribute holding the listed items
    pub fn output(self) -> &'static str {
        match self {
            Lookup::Computes => "computes",
            Lookup::Os => "os",
            Lookup::Runtimes => "runtimes",
            Lookup::RuntimeVersions => "runtime_versions",
            Lookup::DockerEngines => "docker_engines",
        }
    }

    fn inputs(self) -> &'static [&'static str] {
        match self {
            Lookup::Runtimes => &["os_id"],
            Lookup::RuntimeVersions => &["os_id", "runtime_id"],
            _ => &[],
        }
    }

    fn item_attributes(self) -> Vec<AttributeSchema> {
        let field = |name: &str, attr_type| AttributeSchema::new(name, attr_type).read_only();
        let mut attributes = vec![field("id", AttributeType::Int)];
        match self {
            Lookup::Computes => {
                attributes.push(field("cpu", AttributeType::Int));
                attributes.push(field("mem", AttributeType::Int));
            }
            Lookup::Os => {
                attributes.push(field("name", AttributeType::String));
                attributes.push(field("version", AttributeType::String));
                attributes.push(field("archi", AttributeType::String));
            }
            Lookup::Runtimes | Lookup::RuntimeVersions | Lookup::DockerEngines => {
                attributes.push(field("name", AttributeType::String));
            }
        }
        attributes
    }

    /// Schema of a single listed item, which is what filters address
    fn item_schema(self) -> ResourceSchema {
        self.item_attributes()
            .into_iter()
            .fold(ResourceSchema::new(self.output()), ResourceSchema::attribute)
    }

    pub fn schema(self) -> ResourceSchema {
        let mut schema = ResourceSchema::new(self.type_name()).attribute(
            AttributeSchema::new(
                self.output(),
                AttributeType::list_of_objects(self.item_attributes()),
            )
            .read_only(),
        );
        for input in self.inputs() {
            schema = schema.attribute(AttributeSchema::new(*input, AttributeType::Int).required());
        }
        schema.attribute(filter_attribute())
    }
}

pub struct SourceBuildLookup {
    lookup: Lookup,
    api: Arc<dyn SourceBuildApi>,
}

impl SourceBuildLookup {
    pub fn new(lookup: Lookup, config: &ProviderConfig, clients: &Clients) -> Self {
        Self {
            lookup,
            api: sourcebuild_api(config, clients),
        }
    }

    async fn fetch(&self, attributes: &Attributes) -> ProviderResult<Vec<Attributes>> {
        let item = |id: i64, fields: Vec<(&str, Option<Value>)>| {
            let mut attrs = Attributes::from([("id".to_string(), Value::Int(id))]);
            for (name, value) in fields {
                insert_opt(&mut attrs, name, value);
            }
            attrs
        };
        let text = |s: &Option<String>| s.as_deref().map(Value::from);

        let items = match self.lookup {
            Lookup::Computes => self
                .api
                .get_computes()
                .await
                .map_err(|e| api_error("getComputes", e))?
                .iter()
                .map(|c| {
                    item(
                        c.id,
                        vec![("cpu", c.cpu.map(Value::Int)), ("mem", c.mem.map(Value::Int))],
                    )
                })
                .collect(),
            Lookup::Os => self
                .api
                .get_os()
                .await
                .map_err(|e| api_error("getOs", e))?
                .iter()
                .map(|os| {
                    item(
                        os.id,
                        vec![
                            ("name", text(&os.name)),
                            ("version", text(&os.version)),
                            ("archi", text(&os.archi)),
                        ],
                    )
                })
                .collect(),
            Lookup::Runtimes => {
                let os_id = required_int(attributes, "os_id")?;
                self.api
                    .get_runtimes(os_id)
                    .await
                    .map_err(|e| api_error("getRuntimes", e))?
                    .iter()
                    .map(|r| item(r.id, vec![("name", text(&r.name))]))
                    .collect()
            }
            Lookup::RuntimeVersions => {
                let os_id = required_int(attributes, "os_id")?;
                let runtime_id = required_int(attributes, "runtime_id")?;
                self.api
                    .get_runtime_versions(os_id, runtime_id)
                    .await
                    .map_err(|e| api_error("getRuntimeVersions", e))?
                    .iter()
                    .map(|v| item(v.id, vec![("name", text(&v.name))]))
                    .collect()
            }
            Lookup::DockerEngines => self
                .api
                .get_docker_engines()
                .await
                .map_err(|e| api_error("getDockerEngines", e))?
                .iter()
                .filter_map(|d| d.id.map(|id| item(id, vec![("name", text(&d.name))])))
                .collect(),
        };
        Ok(items)
    }
}

#[async_trait]
impl DataSource for SourceBuildLookup {
    async fn read(&self, attributes: &Attributes) -> ProviderResult<DataSourceResult> {
        let filters = parse_filters(attributes)?;
        let items = self.fetch(attributes).await?;
        let items = apply_filters(&filters, items, &self.lookup.item_schema())?;

        let mut id = vec![self.lookup.type_name().to_string()];
        for input in self.lookup.inputs() {
            id.push(required_int(attributes, input)?.to_string());
        }

        let mut result = attributes.clone();
        result.insert(
            self.lookup.output().to_string(),
            Value::List(items.into_iter().map(Value::Map).collect()),
        );
        Ok(DataSourceResult::new(id.join(":"), result))
    }
}

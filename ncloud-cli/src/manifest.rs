//! TOML manifest
//!
//! ```toml
//! [provider]
//! region = "KR"
//! support_vpc = true
//!
//! [backend]
//! path = "prod.state.json"
//!
//! [[resource]]
//! type = "ncloud_nat_gateway"
//! name = "egress"
//! vpc_no = "100"
//! zone = "KR-1"
//!
//! [[data]]
//! type = "ncloud_sourcebuild_project_os"
//! name = "os"
//! ```
//!
//! `type` and `name` identify each block; every other key is an attribute.

use std::collections::HashSet;
use std::path::Path;

use ncloud_core::resource::{Attributes, Resource, Value};
use ncloud_state::BackendConfig;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{section} #{index}: missing string `{field}`")]
    MissingField {
        section: &'static str,
        index: usize,
        field: &'static str,
    },

    #[error("{path}: {kind} values are not supported")]
    UnsupportedValue { path: String, kind: &'static str },

    #[error("{0} is declared more than once")]
    Duplicate(String),
}

#[derive(Debug, Deserialize)]
struct RawManifest {
    #[serde(default)]
    provider: toml::Table,
    backend: Option<toml::Table>,
    #[serde(default)]
    resource: Vec<toml::Table>,
    #[serde(default)]
    data: Vec<toml::Table>,
}

#[derive(Debug, Clone)]
pub struct Manifest {
    /// `[provider]` attributes, passed to `ProviderConfig::from_attributes`
    pub provider: Attributes,
    pub backend: BackendConfig,
    /// Managed resources followed by data sources (`read_only`)
    pub resources: Vec<Resource>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        content.parse()
    }

    pub fn managed(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| !r.is_data_source())
    }

    pub fn data_sources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().filter(|r| r.is_data_source())
    }
}

impl std::str::FromStr for Manifest {
    type Err = ManifestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: RawManifest = toml::from_str(s)?;

        let provider = table_to_attributes(raw.provider, "provider")?;

        let backend = match raw.backend {
            Some(mut table) => {
                let backend_type = match table.remove("type") {
                    Some(toml::Value::String(t)) => t,
                    _ => "local".to_string(),
                };
                BackendConfig {
                    backend_type,
                    attributes: table_to_attributes(table, "backend")?,
                }
            }
            None => BackendConfig::local(),
        };

        let mut resources = Vec::new();
        for (index, table) in raw.resource.into_iter().enumerate() {
            resources.push(block_to_resource(table, "resource", index)?);
        }
        for (index, table) in raw.data.into_iter().enumerate() {
            resources.push(block_to_resource(table, "data", index)?.with_read_only(true));
        }

        let mut seen = HashSet::new();
        for resource in &resources {
            let key = (resource.is_data_source(), resource.id.clone());
            if !seen.insert(key) {
                let kind = if resource.is_data_source() { "data" } else { "resource" };
                return Err(ManifestError::Duplicate(format!("{} {}", kind, resource.id)));
            }
        }

        Ok(Self {
            provider,
            backend,
            resources,
        })
    }
}

fn block_to_resource(
    mut table: toml::Table,
    section: &'static str,
    index: usize,
) -> Result<Resource, ManifestError> {
    let mut take = |field: &'static str| match table.remove(field) {
        Some(toml::Value::String(s)) => Ok(s),
        _ => Err(ManifestError::MissingField {
            section,
            index,
            field,
        }),
    };
    let resource_type = take("type")?;
    let name = take("name")?;

    let path = format!("{}.{}", resource_type, name);
    let mut resource = Resource::new(resource_type, name);
    resource.attributes = table_to_attributes(table, &path)?;
    Ok(resource)
}

fn table_to_attributes(table: toml::Table, path: &str) -> Result<Attributes, ManifestError> {
    table
        .into_iter()
        .map(|(key, value)| {
            let value = toml_to_value(value, &format!("{}.{}", path, key))?;
            Ok((key, value))
        })
        .collect()
}

fn toml_to_value(value: toml::Value, path: &str) -> Result<Value, ManifestError> {
    let unsupported = |kind| ManifestError::UnsupportedValue {
        path: path.to_string(),
        kind,
    };
    match value {
        toml::Value::String(s) => Ok(Value::String(s)),
        toml::Value::Integer(n) => Ok(Value::Int(n)),
        toml::Value::Boolean(b) => Ok(Value::Bool(b)),
        toml::Value::Array(items) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| toml_to_value(item, &format!("{}[{}]", path, i)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        toml::Value::Table(table) => table_to_attributes(table, path).map(Value::Map),
        toml::Value::Float(_) => Err(unsupported("float")),
        toml::Value::Datetime(_) => Err(unsupported("datetime")),
    }
}

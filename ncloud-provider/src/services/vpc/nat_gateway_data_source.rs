//! `ncloud_nat_gateway` data source (VPC only)

use std::sync::Arc;

use async_trait::async_trait;
use ncloud_core::filter::{Filter, apply_filters, filter_attribute, parse_filters, validate_one_result};
use ncloud_core::provider::{ProviderError, ProviderResult};
use ncloud_core::resource::{Attributes, Value};
use ncloud_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::nat_gateway::{self, nat_gateway_attributes};
use crate::client::Clients;
use crate::client::vpc::{GetNatGatewayInstanceListRequest, VpcApi};
use crate::config::ProviderConfig;
use crate::resources::{DataSource, DataSourceResult};
use crate::utils::{api_error, optional_string};

pub const DATA_SOURCE_NAME: &str = "ncloud_nat_gateway";

pub fn schema() -> ResourceSchema {
    nat_gateway::schema()
        .to_read_only(DATA_SOURCE_NAME)
        .with_description("Look up a single NAT gateway")
        .attribute(
            AttributeSchema::new("id", AttributeType::String)
                .computed()
                .with_description("NAT gateway instance number"),
        )
        .attribute(AttributeSchema::new("name", AttributeType::String).computed())
        .attribute(AttributeSchema::new("vpc_name", AttributeType::String).computed())
        .attribute(AttributeSchema::new("description", AttributeType::String).computed())
        .attribute(filter_attribute())
}

pub struct NatGatewayDataSource {
    /// `None` under the classic account model
    api: Option<Arc<dyn VpcApi>>,
    region_code: String,
}

impl NatGatewayDataSource {
    pub fn new(config: &ProviderConfig, clients: &Clients) -> Self {
        Self {
            api: config.support_vpc.then(|| clients.vpc.clone()),
            region_code: config.region.clone(),
        }
    }

    /// List gateways matching the request parameters and filters
    async fn list_filtered(
        &self,
        api: &dyn VpcApi,
        attributes: &Attributes,
    ) -> ProviderResult<Vec<Attributes>> {
        let req = GetNatGatewayInstanceListRequest {
            region_code: self.region_code.clone(),
            nat_gateway_instance_no_list: optional_string(attributes, "id").into_iter().collect(),
            nat_gateway_name: optional_string(attributes, "name"),
            vpc_name: optional_string(attributes, "vpc_name"),
        };
        let list = api
            .get_nat_gateway_instance_list(&req)
            .await
            .map_err(|e| api_error("getNatGatewayInstanceList", e))?;

        let items = list
            .nat_gateway_instance_list
            .iter()
            .map(|instance| {
                let mut attrs = nat_gateway_attributes(instance);
                if let Some(no) = &instance.nat_gateway_instance_no {
                    attrs.insert("id".to_string(), Value::String(no.clone()));
                }
                attrs
            })
            .collect();

        // description is not a request parameter; match it exactly client-side
        let mut filters = parse_filters(attributes)?;
        if let Some(description) = optional_string(attributes, "description") {
            filters.push(Filter::new("description", vec![description]));
        }
        apply_filters(&filters, items, &schema())
    }
}

#[async_trait]
impl DataSource for NatGatewayDataSource {
    async fn read(&self, attributes: &Attributes) -> ProviderResult<DataSourceResult> {
        let api = self
            .api
            .as_deref()
            .ok_or_else(|| ProviderError::not_supported_classic("data source", DATA_SOURCE_NAME))?;

        let mut matches = self.list_filtered(api, attributes).await?;
        validate_one_result(matches.len())?;
        let attrs = matches.remove(0);
        let id = optional_string(&attrs, "id").unwrap_or_default();
        Ok(DataSourceResult::new(id, attrs))
    }
}

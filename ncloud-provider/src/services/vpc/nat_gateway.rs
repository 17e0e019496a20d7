//! `ncloud_nat_gateway` resource (VPC only)

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ncloud_core::provider::{ProviderError, ProviderResult};
use ncloud_core::resource::Attributes;
use ncloud_core::schema::{AttributeSchema, AttributeType, ResourceSchema, Validation};

use crate::client::Clients;
use crate::client::vpc::{
    CreateNatGatewayInstanceRequest, DeleteNatGatewayInstanceRequest,
    GetNatGatewayInstanceListRequest, NatGatewayInstance, SetNatGatewayDescriptionRequest, VpcApi,
};
use crate::config::ProviderConfig;
use crate::resources::ManagedResource;
use crate::utils::{api_error, insert_opt, optional_string, required_string};

pub const RESOURCE_NAME: &str = "ncloud_nat_gateway";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_NAME)
        .with_description("NAT gateway in a VPC")
        .attribute(
            AttributeSchema::new("vpc_no", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("zone", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .computed()
                .force_new()
                .with_validation(Validation::StringLenBetween(3, 30))
                .with_validation(Validation::string_match(
                    "^[a-z]+[a-z0-9-]+[a-z0-9]$",
                    "Composed of lowercase alphabets, numbers, hyphen (-). Must start with an alphabetic character, and the last character can only be an English letter or number.",
                )),
        )
        .attribute(
            AttributeSchema::new("description", AttributeType::String)
                .computed()
                .with_validation(Validation::StringLenBetween(0, 1000)),
        )
        .attribute(
            AttributeSchema::new("subnet_no", AttributeType::String)
                .computed()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("private_ip", AttributeType::String)
                .computed()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("public_ip_no", AttributeType::String)
                .computed()
                .force_new(),
        )
        .attribute(AttributeSchema::new("nat_gateway_no", AttributeType::String).read_only())
        .attribute(AttributeSchema::new("public_ip", AttributeType::String).read_only())
        .attribute(AttributeSchema::new("subnet_name", AttributeType::String).read_only())
        .attribute(AttributeSchema::new("vpc_name", AttributeType::String).read_only())
}

#[derive(Debug, Clone, PartialEq)]
pub struct NatGatewayConfig {
    pub vpc_no: String,
    pub zone: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub subnet_no: Option<String>,
    pub private_ip: Option<String>,
    pub public_ip_no: Option<String>,
}

impl NatGatewayConfig {
    pub fn from_attributes(attrs: &Attributes) -> ProviderResult<Self> {
        Ok(Self {
            vpc_no: required_string(attrs, "vpc_no")?,
            zone: required_string(attrs, "zone")?,
            name: optional_string(attrs, "name"),
            description: optional_string(attrs, "description"),
            subnet_no: optional_string(attrs, "subnet_no"),
            private_ip: optional_string(attrs, "private_ip"),
            public_ip_no: optional_string(attrs, "public_ip_no"),
        })
    }
}

/// Attributes of a gateway as listed by the platform
pub fn nat_gateway_attributes(instance: &NatGatewayInstance) -> Attributes {
    let mut attrs = HashMap::new();
    let fields = [
        ("nat_gateway_no", &instance.nat_gateway_instance_no),
        ("name", &instance.nat_gateway_name),
        ("description", &instance.nat_gateway_description),
        ("public_ip", &instance.public_ip),
        ("vpc_no", &instance.vpc_no),
        ("vpc_name", &instance.vpc_name),
        ("zone", &instance.zone_code),
        ("subnet_no", &instance.subnet_no),
        ("subnet_name", &instance.subnet_name),
        ("private_ip", &instance.private_ip),
        ("public_ip_no", &instance.public_ip_instance_no),
    ];
    for (name, value) in fields {
        insert_opt(&mut attrs, name, value.clone());
    }
    attrs
}

/// VPC calls for NAT gateways
pub struct VpcNatGateway {
    api: Arc<dyn VpcApi>,
    region_code: String,
}

impl VpcNatGateway {
    pub fn new(api: Arc<dyn VpcApi>, region_code: impl Into<String>) -> Self {
        Self {
            api,
            region_code: region_code.into(),
        }
    }

    pub async fn create(&self, config: &NatGatewayConfig) -> ProviderResult<String> {
        let req = CreateNatGatewayInstanceRequest {
            region_code: self.region_code.clone(),
            vpc_no: config.vpc_no.clone(),
            zone_code: config.zone.clone(),
            nat_gateway_name: config.name.clone(),
            nat_gateway_description: config.description.clone(),
            subnet_no: config.subnet_no.clone(),
            private_ip: config.private_ip.clone(),
            public_ip_instance_no: config.public_ip_no.clone(),
        };
        let list = self
            .api
            .create_nat_gateway_instance(&req)
            .await
            .map_err(|e| api_error("createNatGatewayInstance", e))?;

        list.nat_gateway_instance_list
            .into_iter()
            .next()
            .and_then(|g| g.nat_gateway_instance_no)
            .ok_or_else(|| ProviderError::new("createNatGatewayInstance returned no instance"))
    }

    pub async fn get(&self, id: &str) -> ProviderResult<Option<NatGatewayInstance>> {
        let list = self
            .api
            .get_nat_gateway_instance_list(&GetNatGatewayInstanceListRequest {
                region_code: self.region_code.clone(),
                nat_gateway_instance_no_list: vec![id.to_string()],
                ..Default::default()
            })
            .await
            .map_err(|e| api_error("getNatGatewayInstanceList", e))?;
        Ok(list.nat_gateway_instance_list.into_iter().next())
    }

    pub async fn set_description(&self, id: &str, description: &str) -> ProviderResult<()> {
        self.api
            .set_nat_gateway_description(&SetNatGatewayDescriptionRequest {
                region_code: self.region_code.clone(),
                nat_gateway_instance_no: id.to_string(),
                nat_gateway_description: description.to_string(),
            })
            .await
            .map_err(|e| api_error("setNatGatewayDescription", e))
    }

    pub async fn delete(&self, id: &str) -> ProviderResult<()> {
        if self.get(id).await?.is_none() {
            return Ok(());
        }
        self.api
            .delete_nat_gateway_instance(&DeleteNatGatewayInstanceRequest {
                region_code: self.region_code.clone(),
                nat_gateway_instance_no: id.to_string(),
            })
            .await
            .map_err(|e| api_error("deleteNatGatewayInstance", e))
    }
}

pub struct NatGatewayResource {
    /// `None` under the classic account model
    backend: Option<VpcNatGateway>,
}

impl NatGatewayResource {
    pub fn new(config: &ProviderConfig, clients: &Clients) -> Self {
        let backend = config
            .support_vpc
            .then(|| VpcNatGateway::new(clients.vpc.clone(), &config.region));
        Self { backend }
    }

    fn backend(&self) -> ProviderResult<&VpcNatGateway> {
        self.backend
            .as_ref()
            .ok_or_else(|| ProviderError::not_supported_classic("resource", RESOURCE_NAME))
    }
}

#[async_trait]
impl ManagedResource for NatGatewayResource {
    async fn create(&self, attributes: &Attributes) -> ProviderResult<String> {
        let backend = self.backend()?;
        let config = NatGatewayConfig::from_attributes(attributes)?;
        backend.create(&config).await
    }

    async fn read(&self, identifier: &str, _known: &Attributes) -> ProviderResult<Option<Attributes>> {
        Ok(self
            .backend()?
            .get(identifier)
            .await?
            .as_ref()
            .map(nat_gateway_attributes))
    }

    async fn update(
        &self,
        identifier: &str,
        from: &Attributes,
        to: &Attributes,
    ) -> ProviderResult<()> {
        let backend = self.backend()?;
        let description = optional_string(to, "description").unwrap_or_default();
        if optional_string(from, "description").unwrap_or_default() == description {
            return Ok(());
        }
        backend.set_description(identifier, &description).await
    }

    async fn delete(&self, identifier: &str, _known: &Attributes) -> ProviderResult<()> {
        self.backend()?.delete(identifier).await
    }
}

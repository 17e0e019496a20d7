//! VPC API (`/vpc/v2`), NAT gateway operations

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{QueryApiClient, QueryParams};
use super::{ApiResult, CommonCode};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CreateNatGatewayInstanceRequest {
    pub region_code: String,
    pub vpc_no: String,
    pub zone_code: String,
    pub nat_gateway_name: Option<String>,
    pub nat_gateway_description: Option<String>,
    pub subnet_no: Option<String>,
    pub private_ip: Option<String>,
    pub public_ip_instance_no: Option<String>,
}

impl CreateNatGatewayInstanceRequest {
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .set("regionCode", &self.region_code)
            .set("vpcNo", &self.vpc_no)
            .set("zoneCode", &self.zone_code)
            .set_opt("natGatewayName", self.nat_gateway_name.as_ref())
            .set_opt("natGatewayDescription", self.nat_gateway_description.as_ref())
            .set_opt("subnetNo", self.subnet_no.as_ref())
            .set_opt("privateIp", self.private_ip.as_ref())
            .set_opt("publicIpInstanceNo", self.public_ip_instance_no.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GetNatGatewayInstanceListRequest {
    pub region_code: String,
    pub nat_gateway_instance_no_list: Vec<String>,
    pub nat_gateway_name: Option<String>,
    pub vpc_name: Option<String>,
}

impl GetNatGatewayInstanceListRequest {
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .set("regionCode", &self.region_code)
            .set_list(
                "natGatewayInstanceNoList",
                &self.nat_gateway_instance_no_list,
            )
            .set_opt("natGatewayName", self.nat_gateway_name.as_ref())
            .set_opt("vpcName", self.vpc_name.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SetNatGatewayDescriptionRequest {
    pub region_code: String,
    pub nat_gateway_instance_no: String,
    pub nat_gateway_description: String,
}

impl SetNatGatewayDescriptionRequest {
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .set("regionCode", &self.region_code)
            .set("natGatewayInstanceNo", &self.nat_gateway_instance_no)
            .set("natGatewayDescription", &self.nat_gateway_description)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeleteNatGatewayInstanceRequest {
    pub region_code: String,
    pub nat_gateway_instance_no: String,
}

impl DeleteNatGatewayInstanceRequest {
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .set("regionCode", &self.region_code)
            .set("natGatewayInstanceNo", &self.nat_gateway_instance_no)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatGatewayInstance {
    #[serde(default)]
    pub nat_gateway_instance_no: Option<String>,
    #[serde(default)]
    pub nat_gateway_name: Option<String>,
    #[serde(default)]
    pub nat_gateway_description: Option<String>,
    #[serde(default)]
    pub nat_gateway_instance_status: Option<CommonCode>,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub public_ip_instance_no: Option<String>,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub vpc_no: Option<String>,
    #[serde(default)]
    pub vpc_name: Option<String>,
    #[serde(default)]
    pub zone_code: Option<String>,
    #[serde(default)]
    pub subnet_no: Option<String>,
    #[serde(default)]
    pub subnet_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NatGatewayInstanceList {
    #[serde(default)]
    pub nat_gateway_instance_list: Vec<NatGatewayInstance>,
}

#[async_trait]
pub trait VpcApi: Send + Sync {
    async fn create_nat_gateway_instance(
        &self,
        req: &CreateNatGatewayInstanceRequest,
    ) -> ApiResult<NatGatewayInstanceList>;

    async fn get_nat_gateway_instance_list(
        &self,
        req: &GetNatGatewayInstanceListRequest,
    ) -> ApiResult<NatGatewayInstanceList>;

    async fn set_nat_gateway_description(
        &self,
        req: &SetNatGatewayDescriptionRequest,
    ) -> ApiResult<()>;

    async fn delete_nat_gateway_instance(
        &self,
        req: &DeleteNatGatewayInstanceRequest,
    ) -> ApiResult<()>;
}

pub struct HttpVpcApi {
    client: QueryApiClient,
}

impl HttpVpcApi {
    pub fn new(client: QueryApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VpcApi for HttpVpcApi {
    async fn create_nat_gateway_instance(
        &self,
        req: &CreateNatGatewayInstanceRequest,
    ) -> ApiResult<NatGatewayInstanceList> {
        self.client
            .call("createNatGatewayInstance", &req.to_params())
            .await
    }

    async fn get_nat_gateway_instance_list(
        &self,
        req: &GetNatGatewayInstanceListRequest,
    ) -> ApiResult<NatGatewayInstanceList> {
        self.client
            .call("getNatGatewayInstanceList", &req.to_params())
            .await
    }

    async fn set_nat_gateway_description(
        &self,
        req: &SetNatGatewayDescriptionRequest,
    ) -> ApiResult<()> {
        self.client
            .call::<serde_json::Value>("setNatGatewayDescription", &req.to_params())
            .await
            .map(|_| ())
    }

    async fn delete_nat_gateway_instance(
        &self,
        req: &DeleteNatGatewayInstanceRequest,
    ) -> ApiResult<()> {
        self.client
            .call::<serde_json::Value>("deleteNatGatewayInstance", &req.to_params())
            .await
            .map(|_| ())
    }
}

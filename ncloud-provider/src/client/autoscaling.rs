//! Classic auto scaling API (`/autoscaling/v2`)
//!
//! Classic addresses groups and policies by name.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{QueryApiClient, QueryParams};
use super::{ApiResult, CommonCode};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GetAutoScalingGroupListRequest {
    pub auto_scaling_group_name_list: Vec<String>,
}

impl GetAutoScalingGroupListRequest {
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new().set_list("autoScalingGroupNameList", &self.auto_scaling_group_name_list)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PutScalingPolicyRequest {
    pub auto_scaling_group_name: String,
    pub policy_name: String,
    pub adjustment_type_code: String,
    pub scaling_adjustment: i32,
    pub cooldown: Option<i32>,
    pub min_adjustment_step: Option<i32>,
}

impl PutScalingPolicyRequest {
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .set("autoScalingGroupName", &self.auto_scaling_group_name)
            .set("policyName", &self.policy_name)
            .set("adjustmentTypeCode", &self.adjustment_type_code)
            .set("scalingAdjustment", self.scaling_adjustment)
            .set_opt("cooldown", self.cooldown)
            .set_opt("minAdjustmentStep", self.min_adjustment_step)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GetAutoScalingPolicyListRequest {
    pub auto_scaling_group_name: String,
    pub policy_name_list: Vec<String>,
}

impl GetAutoScalingPolicyListRequest {
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .set("autoScalingGroupName", &self.auto_scaling_group_name)
            .set_list("policyNameList", &self.policy_name_list)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeletePolicyRequest {
    pub auto_scaling_group_name: String,
    pub policy_name: String,
}

impl DeletePolicyRequest {
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .set("autoScalingGroupName", &self.auto_scaling_group_name)
            .set("policyName", &self.policy_name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScalingGroup {
    #[serde(default)]
    pub auto_scaling_group_no: Option<String>,
    #[serde(default)]
    pub auto_scaling_group_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingPolicy {
    #[serde(default)]
    pub policy_name: Option<String>,
    #[serde(default)]
    pub auto_scaling_group_name: Option<String>,
    #[serde(default)]
    pub adjustment_type: Option<CommonCode>,
    #[serde(default)]
    pub scaling_adjustment: Option<i32>,
    #[serde(default)]
    pub cooldown: Option<i32>,
    #[serde(default)]
    pub min_adjustment_step: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScalingGroupList {
    #[serde(default)]
    pub auto_scaling_group_list: Vec<AutoScalingGroup>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingPolicyList {
    #[serde(default)]
    pub scaling_policy_list: Vec<ScalingPolicy>,
}

#[async_trait]
pub trait AutoScalingApi: Send + Sync {
    async fn get_auto_scaling_group_list(
        &self,
        req: &GetAutoScalingGroupListRequest,
    ) -> ApiResult<AutoScalingGroupList>;

    async fn put_scaling_policy(&self, req: &PutScalingPolicyRequest) -> ApiResult<()>;

    async fn get_auto_scaling_policy_list(
        &self,
        req: &GetAutoScalingPolicyListRequest,
    ) -> ApiResult<ScalingPolicyList>;

    async fn delete_policy(&self, req: &DeletePolicyRequest) -> ApiResult<()>;
}

pub struct HttpAutoScalingApi {
    client: QueryApiClient,
}

impl HttpAutoScalingApi {
    pub fn new(client: QueryApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AutoScalingApi for HttpAutoScalingApi {
    async fn get_auto_scaling_group_list(
        &self,
        req: &GetAutoScalingGroupListRequest,
    ) -> ApiResult<AutoScalingGroupList> {
        self.client
            .call("getAutoScalingGroupList", &req.to_params())
            .await
    }

    async fn put_scaling_policy(&self, req: &PutScalingPolicyRequest) -> ApiResult<()> {
        self.client
            .call::<serde_json::Value>("putScalingPolicy", &req.to_params())
            .await
            .map(|_| ())
    }

    async fn get_auto_scaling_policy_list(
        &self,
        req: &GetAutoScalingPolicyListRequest,
    ) -> ApiResult<ScalingPolicyList> {
        self.client
            .call("getAutoScalingPolicyList", &req.to_params())
            .await
    }

    async fn delete_policy(&self, req: &DeletePolicyRequest) -> ApiResult<()> {
        self.client
            .call::<serde_json::Value>("deletePolicy", &req.to_params())
            .await
            .map(|_| ())
    }
}

//! VPC auto scaling API (`/vautoscaling/v2`)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::http::{QueryApiClient, QueryParams};
use super::{ApiResult, CommonCode};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PutScalingPolicyRequest {
    pub region_code: String,
    pub auto_scaling_group_no: String,
    pub policy_name: String,
    pub adjustment_type_code: String,
    pub scaling_adjustment: i32,
    pub cool_down: Option<i32>,
    pub min_adjustment_step: Option<i32>,
}

impl PutScalingPolicyRequest {
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .set("regionCode", &self.region_code)
            .set("autoScalingGroupNo", &self.auto_scaling_group_no)
            .set("policyName", &self.policy_name)
            .set("adjustmentTypeCode", &self.adjustment_type_code)
            .set("scalingAdjustment", self.scaling_adjustment)
            .set_opt("coolDown", self.cool_down)
            .set_opt("minAdjustmentStep", self.min_adjustment_step)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GetAutoScalingPolicyListRequest {
    pub region_code: String,
    pub auto_scaling_group_no: String,
    pub policy_no_list: Vec<String>,
}

impl GetAutoScalingPolicyListRequest {
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .set("regionCode", &self.region_code)
            .set("autoScalingGroupNo", &self.auto_scaling_group_no)
            .set_list("policyNoList", &self.policy_no_list)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeleteScalingPolicyRequest {
    pub region_code: String,
    pub auto_scaling_group_no: String,
    pub policy_no: String,
}

impl DeleteScalingPolicyRequest {
    pub fn to_params(&self) -> QueryParams {
        QueryParams::new()
            .set("regionCode", &self.region_code)
            .set("autoScalingGroupNo", &self.auto_scaling_group_no)
            .set("policyNo", &self.policy_no)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingPolicy {
    #[serde(default)]
    pub policy_no: Option<String>,
    #[serde(default)]
    pub policy_name: Option<String>,
    #[serde(default)]
    pub auto_scaling_group_no: Option<String>,
    #[serde(default)]
    pub adjustment_type: Option<CommonCode>,
    #[serde(default)]
    pub scaling_adjustment: Option<i32>,
    #[serde(default)]
    pub cool_down: Option<i32>,
    #[serde(default)]
    pub min_adjustment_step: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScalingPolicyList {
    #[serde(default)]
    pub scaling_policy_list: Vec<ScalingPolicy>,
}

#[async_trait]
pub trait VautoScalingApi: Send + Sync {
    /// Create or overwrite a policy; the response lists the stored policy
    async fn put_scaling_policy(
        &self,
        req: &PutScalingPolicyRequest,
    ) -> ApiResult<ScalingPolicyList>;

    async fn get_auto_scaling_policy_list(
        &self,
        req: &GetAutoScalingPolicyListRequest,
    ) -> ApiResult<ScalingPolicyList>;

    async fn delete_scaling_policy(&self, req: &DeleteScalingPolicyRequest) -> ApiResult<()>;
}

pub struct HttpVautoScalingApi {
    client: QueryApiClient,
}

impl HttpVautoScalingApi {
    pub fn new(client: QueryApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl VautoScalingApi for HttpVautoScalingApi {
    async fn put_scaling_policy(
        &self,
        req: &PutScalingPolicyRequest,
    ) -> ApiResult<ScalingPolicyList> {
        self.client.call("putScalingPolicy", &req.to_params()).await
    }

    async fn get_auto_scaling_policy_list(
        &self,
        req: &GetAutoScalingPolicyListRequest,
    ) -> ApiResult<ScalingPolicyList> {
        self.client
            .call("getAutoScalingPolicyList", &req.to_params())
            .await
    }

    async fn delete_scaling_policy(&self, req: &DeleteScalingPolicyRequest) -> ApiResult<()> {
        self.client
            .call::<serde_json::Value>("deleteScalingPolicy", &req.to_params())
            .await
            .map(|_| ())
    }
}

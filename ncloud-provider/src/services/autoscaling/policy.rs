//! `ncloud_auto_scaling_policy`
//!
//! Classic accounts address the policy by name within a group that must first
//! be resolved from its number; VPC accounts address it by the policy number
//! the platform assigns on put.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ncloud_core::provider::{ProviderError, ProviderResult};
use ncloud_core::resource::{Attributes, Value};
use ncloud_core::schema::{AttributeSchema, AttributeType, ResourceSchema, Validation, types};

use crate::client::Clients;
use crate::client::autoscaling::{
    self, AutoScalingApi, DeletePolicyRequest, GetAutoScalingGroupListRequest,
    GetAutoScalingPolicyListRequest,
};
use crate::client::vautoscaling::{self, DeleteScalingPolicyRequest, VautoScalingApi};
use crate::config::ProviderConfig;
use crate::resources::ManagedResource;
use crate::utils::{api_error, insert_opt, optional_i32, required_i32, required_string};

pub const RESOURCE_NAME: &str = "ncloud_auto_scaling_policy";

pub fn schema() -> ResourceSchema {
    ResourceSchema::new(RESOURCE_NAME)
        .with_description("Scaling policy attached to an auto scaling group")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .force_new()
                .with_validation(Validation::StringLenBetween(1, 255))
                .with_validation(Validation::string_match(
                    "^[a-z]+[a-z0-9-]+[a-z0-9]$",
                    "Allows only lowercase letters(a-z), numbers, hyphen (-). Must start with an alphabetic character, must end with an English letter or number",
                )),
        )
        .attribute(
            AttributeSchema::new(
                "adjustment_type_code",
                AttributeType::one_of(&["CHANG", "EXACT", "PRCNT"]),
            )
            .required(),
        )
        .attribute(AttributeSchema::new("scaling_adjustment", types::int32()).required())
        .attribute(
            AttributeSchema::new("cooldown", AttributeType::Int)
                .computed()
                .with_validation(Validation::IntBetween(0, i32::MAX as i64)),
        )
        .attribute(
            AttributeSchema::new("min_adjustment_step", AttributeType::Int)
                .with_validation(Validation::IntBetween(1, i32::MAX as i64)),
        )
        .attribute(
            AttributeSchema::new("auto_scaling_group_no", AttributeType::String)
                .required()
                .force_new(),
        )
}

/// Desired policy, read once from the declared attributes
#[derive(Debug, Clone, PartialEq)]
pub struct AutoScalingPolicyConfig {
    pub name: String,
    pub adjustment_type_code: String,
    pub scaling_adjustment: i32,
    pub cooldown: Option<i32>,
    pub min_adjustment_step: Option<i32>,
    pub auto_scaling_group_no: String,
}

impl AutoScalingPolicyConfig {
    pub fn from_attributes(attrs: &Attributes) -> ProviderResult<Self> {
        Ok(Self {
            name: required_string(attrs, "name")?,
            adjustment_type_code: required_string(attrs, "adjustment_type_code")?,
            scaling_adjustment: required_i32(attrs, "scaling_adjustment")?,
            cooldown: optional_i32(attrs, "cooldown")?,
            min_adjustment_step: optional_i32(attrs, "min_adjustment_step")?,
            auto_scaling_group_no: required_string(attrs, "auto_scaling_group_no")?,
        })
    }
}

/// Policy as the platform reports it
#[derive(Debug, Clone, PartialEq)]
pub struct AutoScalingPolicy {
    pub name: String,
    pub adjustment_type_code: Option<String>,
    pub scaling_adjustment: Option<i32>,
    pub cooldown: Option<i32>,
    pub min_adjustment_step: Option<i32>,
    pub auto_scaling_group_no: String,
}

impl AutoScalingPolicy {
    pub fn into_attributes(self) -> Attributes {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String(self.name));
        attrs.insert(
            "auto_scaling_group_no".to_string(),
            Value::String(self.auto_scaling_group_no),
        );
        insert_opt(&mut attrs, "adjustment_type_code", self.adjustment_type_code);
        insert_opt(&mut attrs, "scaling_adjustment", self.scaling_adjustment);
        insert_opt(&mut attrs, "cooldown", self.cooldown);
        insert_opt(&mut attrs, "min_adjustment_step", self.min_adjustment_step);
        attrs
    }
}

/// Account-model specific calls
#[async_trait]
pub trait AutoScalingPolicyBackend: Send + Sync {
    /// Create or overwrite the policy, returning its identifier
    async fn put(&self, config: &AutoScalingPolicyConfig) -> ProviderResult<String>;

    async fn get(&self, id: &str, group_no: &str) -> ProviderResult<Option<AutoScalingPolicy>>;

    /// Missing group or policy counts as already deleted
    async fn delete(&self, id: &str, group_no: &str) -> ProviderResult<()>;
}

pub struct ClassicAutoScalingPolicy {
    api: Arc<dyn AutoScalingApi>,
}

impl ClassicAutoScalingPolicy {
    pub fn new(api: Arc<dyn AutoScalingApi>) -> Self {
        Self { api }
    }

    /// Classic policy calls take the group name, not its number
    async fn group_name(&self, group_no: &str) -> ProviderResult<Option<String>> {
        let list = self
            .api
            .get_auto_scaling_group_list(&GetAutoScalingGroupListRequest::default())
            .await
            .map_err(|e| api_error("getAutoScalingGroupList", e))?;
        Ok(list
            .auto_scaling_group_list
            .into_iter()
            .find(|g| g.auto_scaling_group_no.as_deref() == Some(group_no))
            .and_then(|g| g.auto_scaling_group_name))
    }

    async fn find(
        &self,
        group_name: &str,
        policy_name: &str,
    ) -> ProviderResult<Option<autoscaling::ScalingPolicy>> {
        let list = self
            .api
            .get_auto_scaling_policy_list(&GetAutoScalingPolicyListRequest {
                auto_scaling_group_name: group_name.to_string(),
                policy_name_list: vec![policy_name.to_string()],
            })
            .await
            .map_err(|e| api_error("getAutoScalingPolicyList", e))?;
        Ok(list.scaling_policy_list.into_iter().next())
    }
}

#[async_trait]
impl AutoScalingPolicyBackend for ClassicAutoScalingPolicy {
    async fn put(&self, config: &AutoScalingPolicyConfig) -> ProviderResult<String> {
        let group_name = self
            .group_name(&config.auto_scaling_group_no)
            .await?
            .ok_or_else(|| {
                ProviderError::new(format!(
                    "auto scaling group {} not found",
                    config.auto_scaling_group_no
                ))
            })?;

        let req = autoscaling::PutScalingPolicyRequest {
            auto_scaling_group_name: group_name,
            policy_name: config.name.clone(),
            adjustment_type_code: config.adjustment_type_code.clone(),
            scaling_adjustment: config.scaling_adjustment,
            cooldown: config.cooldown,
            min_adjustment_step: config.min_adjustment_step,
        };
        self.api
            .put_scaling_policy(&req)
            .await
            .map_err(|e| api_error("putScalingPolicy", e))?;

        Ok(config.name.clone())
    }

    async fn get(&self, id: &str, group_no: &str) -> ProviderResult<Option<AutoScalingPolicy>> {
        let Some(group_name) = self.group_name(group_no).await? else {
            return Ok(None);
        };
        let Some(policy) = self.find(&group_name, id).await? else {
            return Ok(None);
        };

        Ok(Some(AutoScalingPolicy {
            name: policy.policy_name.unwrap_or_else(|| id.to_string()),
            adjustment_type_code: policy.adjustment_type.and_then(|t| t.code),
            scaling_adjustment: policy.scaling_adjustment,
            cooldown: policy.cooldown,
            min_adjustment_step: policy.min_adjustment_step,
            auto_scaling_group_no: group_no.to_string(),
        }))
    }

    async fn delete(&self, id: &str, group_no: &str) -> ProviderResult<()> {
        let Some(group_name) = self.group_name(group_no).await? else {
            return Ok(());
        };
        if self.find(&group_name, id).await?.is_none() {
            return Ok(());
        }

        self.api
            .delete_policy(&DeletePolicyRequest {
                auto_scaling_group_name: group_name,
                policy_name: id.to_string(),
            })
            .await
            .map_err(|e| api_error("deletePolicy", e))
    }
}

pub struct VpcAutoScalingPolicy {
    api: Arc<dyn VautoScalingApi>,
    region_code: String,
}

impl VpcAutoScalingPolicy {
    pub fn new(api: Arc<dyn VautoScalingApi>, region_code: impl Into<String>) -> Self {
        Self {
            api,
            region_code: region_code.into(),
        }
    }
}

#[async_trait]
impl AutoScalingPolicyBackend for VpcAutoScalingPolicy {
    async fn put(&self, config: &AutoScalingPolicyConfig) -> ProviderResult<String> {
        let req = vautoscaling::PutScalingPolicyRequest {
            region_code: self.region_code.clone(),
            auto_scaling_group_no: config.auto_scaling_group_no.clone(),
            policy_name: config.name.clone(),
            adjustment_type_code: config.adjustment_type_code.clone(),
            scaling_adjustment: config.scaling_adjustment,
            cool_down: config.cooldown,
            min_adjustment_step: config.min_adjustment_step,
        };
        let list = self
            .api
            .put_scaling_policy(&req)
            .await
            .map_err(|e| api_error("putScalingPolicy", e))?;

        list.scaling_policy_list
            .into_iter()
            .next()
            .and_then(|p| p.policy_no)
            .ok_or_else(|| ProviderError::new("putScalingPolicy returned no policy"))
    }

    async fn get(&self, id: &str, group_no: &str) -> ProviderResult<Option<AutoScalingPolicy>> {
        let list = self
            .api
            .get_auto_scaling_policy_list(&vautoscaling::GetAutoScalingPolicyListRequest {
                region_code: self.region_code.clone(),
                auto_scaling_group_no: group_no.to_string(),
                policy_no_list: vec![id.to_string()],
            })
            .await
            .map_err(|e| api_error("getAutoScalingPolicyList", e))?;

        let Some(policy) = list.scaling_policy_list.into_iter().next() else {
            return Ok(None);
        };

        Ok(Some(AutoScalingPolicy {
            name: policy.policy_name.unwrap_or_default(),
            adjustment_type_code: policy.adjustment_type.and_then(|t| t.code),
            scaling_adjustment: policy.scaling_adjustment,
            cooldown: policy.cool_down,
            min_adjustment_step: policy.min_adjustment_step,
            auto_scaling_group_no: policy
                .auto_scaling_group_no
                .unwrap_or_else(|| group_no.to_string()),
        }))
    }

    async fn delete(&self, id: &str, group_no: &str) -> ProviderResult<()> {
        let Some(policy) = self.get(id, group_no).await? else {
            return Ok(());
        };

        self.api
            .delete_scaling_policy(&DeleteScalingPolicyRequest {
                region_code: self.region_code.clone(),
                auto_scaling_group_no: policy.auto_scaling_group_no,
                policy_no: id.to_string(),
            })
            .await
            .map_err(|e| api_error("deleteScalingPolicy", e))
    }
}

pub struct AutoScalingPolicyResource {
    backend: Box<dyn AutoScalingPolicyBackend>,
}

impl AutoScalingPolicyResource {
    pub fn new(config: &ProviderConfig, clients: &Clients) -> Self {
        let backend: Box<dyn AutoScalingPolicyBackend> = if config.support_vpc {
            Box::new(VpcAutoScalingPolicy::new(
                clients.vautoscaling.clone(),
                &config.region,
            ))
        } else {
            Box::new(ClassicAutoScalingPolicy::new(clients.autoscaling.clone()))
        };
        Self { backend }
    }
}

#[async_trait]
impl ManagedResource for AutoScalingPolicyResource {
    async fn create(&self, attributes: &Attributes) -> ProviderResult<String> {
        let config = AutoScalingPolicyConfig::from_attributes(attributes)?;
        self.backend.put(&config).await
    }

    async fn read(&self, identifier: &str, known: &Attributes) -> ProviderResult<Option<Attributes>> {
        let group_no = required_string(known, "auto_scaling_group_no")?;
        Ok(self
            .backend
            .get(identifier, &group_no)
            .await?
            .map(AutoScalingPolicy::into_attributes))
    }

    async fn update(
        &self,
        _identifier: &str,
        _from: &Attributes,
        to: &Attributes,
    ) -> ProviderResult<()> {
        let config = AutoScalingPolicyConfig::from_attributes(to)?;
        self.backend.put(&config).await.map(|_| ())
    }

    async fn delete(&self, identifier: &str, known: &Attributes) -> ProviderResult<()> {
        let group_no = required_string(known, "auto_scaling_group_no")?;
        self.backend.delete(identifier, &group_no).await
    }
}

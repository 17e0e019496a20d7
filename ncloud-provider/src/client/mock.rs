//! In-memory API families for tests
//!
//! Every call is appended to a shared log as `<family>.<action>`, so tests
//! can assert which account model a request was routed through.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::autoscaling::{
    self, AutoScalingApi, AutoScalingGroup, AutoScalingGroupList, DeletePolicyRequest,
    GetAutoScalingGroupListRequest, GetAutoScalingPolicyListRequest,
};
use super::sourcebuild::{
    Compute, DockerEngine, Os, Project, ProjectId, ProjectRequest, Runtime, RuntimeVersion,
    SourceBuildApi,
};
use super::vautoscaling::{self, DeleteScalingPolicyRequest, VautoScalingApi};
use super::vpc::{
    CreateNatGatewayInstanceRequest, DeleteNatGatewayInstanceRequest,
    GetNatGatewayInstanceListRequest, NatGatewayInstance, NatGatewayInstanceList,
    SetNatGatewayDescriptionRequest, VpcApi,
};
use super::{ApiError, ApiResult, Clients, CommonCode};

/// Cooldown the platform assigns when a policy omits it
pub const DEFAULT_COOLDOWN: i32 = 300;

type CallLog = Arc<Mutex<Vec<String>>>;

fn record(log: &CallLog, call: &str) {
    log.lock().unwrap().push(call.to_string());
}

fn not_found(message: &str) -> ApiError {
    ApiError::Api {
        status: 404,
        code: "404".to_string(),
        message: message.to_string(),
    }
}

pub struct MockAutoScaling {
    log: CallLog,
    pub groups: Mutex<Vec<AutoScalingGroup>>,
    /// (group name, policy name) -> policy
    pub policies: Mutex<BTreeMap<(String, String), autoscaling::ScalingPolicy>>,
    pub puts: Mutex<Vec<autoscaling::PutScalingPolicyRequest>>,
}

#[async_trait]
impl AutoScalingApi for MockAutoScaling {
    async fn get_auto_scaling_group_list(
        &self,
        _req: &GetAutoScalingGroupListRequest,
    ) -> ApiResult<AutoScalingGroupList> {
        record(&self.log, "autoscaling.getAutoScalingGroupList");
        Ok(AutoScalingGroupList {
            auto_scaling_group_list: self.groups.lock().unwrap().clone(),
        })
    }

    async fn put_scaling_policy(
        &self,
        req: &autoscaling::PutScalingPolicyRequest,
    ) -> ApiResult<()> {
        record(&self.log, "autoscaling.putScalingPolicy");
        self.puts.lock().unwrap().push(req.clone());
        let policy = autoscaling::ScalingPolicy {
            policy_name: Some(req.policy_name.clone()),
            auto_scaling_group_name: Some(req.auto_scaling_group_name.clone()),
            adjustment_type: Some(CommonCode::new(&req.adjustment_type_code)),
            scaling_adjustment: Some(req.scaling_adjustment),
            cooldown: Some(req.cooldown.unwrap_or(DEFAULT_COOLDOWN)),
            min_adjustment_step: req.min_adjustment_step,
        };
        self.policies.lock().unwrap().insert(
            (req.auto_scaling_group_name.clone(), req.policy_name.clone()),
            policy,
        );
        Ok(())
    }

    async fn get_auto_scaling_policy_list(
        &self,
        req: &GetAutoScalingPolicyListRequest,
    ) -> ApiResult<autoscaling::ScalingPolicyList> {
        record(&self.log, "autoscaling.getAutoScalingPolicyList");
        let policies = self.policies.lock().unwrap();
        let scaling_policy_list = policies
            .iter()
            .filter(|((group, name), _)| {
                *group == req.auto_scaling_group_name
                    && (req.policy_name_list.is_empty() || req.policy_name_list.contains(name))
            })
            .map(|(_, p)| p.clone())
            .collect();
        Ok(autoscaling::ScalingPolicyList {
            scaling_policy_list,
        })
    }

    async fn delete_policy(&self, req: &DeletePolicyRequest) -> ApiResult<()> {
        record(&self.log, "autoscaling.deletePolicy");
        self.policies
            .lock()
            .unwrap()
            .remove(&(req.auto_scaling_group_name.clone(), req.policy_name.clone()))
            .map(|_| ())
            .ok_or_else(|| not_found("policy not found"))
    }
}

pub struct MockVautoScaling {
    log: CallLog,
    next_no: Mutex<u64>,
    pub policies: Mutex<Vec<vautoscaling::ScalingPolicy>>,
    pub puts: Mutex<Vec<vautoscaling::PutScalingPolicyRequest>>,
}

#[async_trait]
impl VautoScalingApi for MockVautoScaling {
    async fn put_scaling_policy(
        &self,
        req: &vautoscaling::PutScalingPolicyRequest,
    ) -> ApiResult<vautoscaling::ScalingPolicyList> {
        record(&self.log, "vautoscaling.putScalingPolicy");
        self.puts.lock().unwrap().push(req.clone());

        let mut policies = self.policies.lock().unwrap();
        let existing = policies.iter().position(|p| {
            p.auto_scaling_group_no.as_deref() == Some(req.auto_scaling_group_no.as_str())
                && p.policy_name.as_deref() == Some(req.policy_name.as_str())
        });
        let policy_no = match existing {
            Some(i) => policies.remove(i).policy_no.unwrap_or_default(),
            None => {
                let mut next = self.next_no.lock().unwrap();
                *next += 1;
                next.to_string()
            }
        };
        let policy = vautoscaling::ScalingPolicy {
            policy_no: Some(policy_no),
            policy_name: Some(req.policy_name.clone()),
            auto_scaling_group_no: Some(req.auto_scaling_group_no.clone()),
            adjustment_type: Some(CommonCode::new(&req.adjustment_type_code)),
            scaling_adjustment: Some(req.scaling_adjustment),
            cool_down: Some(req.cool_down.unwrap_or(DEFAULT_COOLDOWN)),
            min_adjustment_step: req.min_adjustment_step,
        };
        policies.push(policy.clone());
        Ok(vautoscaling::ScalingPolicyList {
            scaling_policy_list: vec![policy],
        })
    }

    async fn get_auto_scaling_policy_list(
        &self,
        req: &vautoscaling::GetAutoScalingPolicyListRequest,
    ) -> ApiResult<vautoscaling::ScalingPolicyList> {
        record(&self.log, "vautoscaling.getAutoScalingPolicyList");
        let scaling_policy_list = self
            .policies
            .lock()
            .unwrap()
            .iter()
            .filter(|p| {
                p.auto_scaling_group_no.as_deref() == Some(req.auto_scaling_group_no.as_str())
                    && (req.policy_no_list.is_empty()
                        || p.policy_no
                            .as_ref()
                            .is_some_and(|no| req.policy_no_list.contains(no)))
            })
            .cloned()
            .collect();
        Ok(vautoscaling::ScalingPolicyList {
            scaling_policy_list,
        })
    }

    async fn delete_scaling_policy(&self, req: &DeleteScalingPolicyRequest) -> ApiResult<()> {
        record(&self.log, "vautoscaling.deleteScalingPolicy");
        let mut policies = self.policies.lock().unwrap();
        let before = policies.len();
        policies.retain(|p| p.policy_no.as_deref() != Some(req.policy_no.as_str()));
        if policies.len() == before {
            return Err(not_found("policy not found"));
        }
        Ok(())
    }
}

pub struct MockVpc {
    log: CallLog,
    next_no: Mutex<u64>,
    pub gateways: Mutex<Vec<NatGatewayInstance>>,
    pub creates: Mutex<Vec<CreateNatGatewayInstanceRequest>>,
}

#[async_trait]
impl VpcApi for MockVpc {
    async fn create_nat_gateway_instance(
        &self,
        req: &CreateNatGatewayInstanceRequest,
    ) -> ApiResult<NatGatewayInstanceList> {
        record(&self.log, "vpc.createNatGatewayInstance");
        self.creates.lock().unwrap().push(req.clone());

        let no = {
            let mut next = self.next_no.lock().unwrap();
            *next += 1;
            *next
        };
        let gateway = NatGatewayInstance {
            nat_gateway_instance_no: Some(format!("{}", 1000 + no)),
            nat_gateway_name: Some(
                req.nat_gateway_name
                    .clone()
                    .unwrap_or_else(|| format!("nat-{}", no)),
            ),
            nat_gateway_description: Some(
                req.nat_gateway_description.clone().unwrap_or_default(),
            ),
            nat_gateway_instance_status: Some(CommonCode::new("RUN")),
            public_ip: Some(format!("203.0.113.{}", no)),
            public_ip_instance_no: Some(
                req.public_ip_instance_no
                    .clone()
                    .unwrap_or_else(|| format!("{}", 2000 + no)),
            ),
            private_ip: Some(
                req.private_ip
                    .clone()
                    .unwrap_or_else(|| format!("10.0.0.{}", no)),
            ),
            vpc_no: Some(req.vpc_no.clone()),
            vpc_name: Some(format!("vpc-{}", req.vpc_no)),
            zone_code: Some(req.zone_code.clone()),
            subnet_no: Some(req.subnet_no.clone().unwrap_or_else(|| "3000".to_string())),
            subnet_name: Some("nat-subnet".to_string()),
        };
        self.gateways.lock().unwrap().push(gateway.clone());
        Ok(NatGatewayInstanceList {
            nat_gateway_instance_list: vec![gateway],
        })
    }

    async fn get_nat_gateway_instance_list(
        &self,
        req: &GetNatGatewayInstanceListRequest,
    ) -> ApiResult<NatGatewayInstanceList> {
        record(&self.log, "vpc.getNatGatewayInstanceList");
        let nat_gateway_instance_list = self
            .gateways
            .lock()
            .unwrap()
            .iter()
            .filter(|g| {
                (req.nat_gateway_instance_no_list.is_empty()
                    || g.nat_gateway_instance_no
                        .as_ref()
                        .is_some_and(|no| req.nat_gateway_instance_no_list.contains(no)))
                    && req
                        .nat_gateway_name
                        .as_ref()
                        .is_none_or(|name| g.nat_gateway_name.as_ref() == Some(name))
                    && req
                        .vpc_name
                        .as_ref()
                        .is_none_or(|name| g.vpc_name.as_ref() == Some(name))
            })
            .cloned()
            .collect();
        Ok(NatGatewayInstanceList {
            nat_gateway_instance_list,
        })
    }

    async fn set_nat_gateway_description(
        &self,
        req: &SetNatGatewayDescriptionRequest,
    ) -> ApiResult<()> {
        record(&self.log, "vpc.setNatGatewayDescription");
        let mut gateways = self.gateways.lock().unwrap();
        let gateway = gateways
            .iter_mut()
            .find(|g| g.nat_gateway_instance_no.as_ref() == Some(&req.nat_gateway_instance_no))
            .ok_or_else(|| not_found("nat gateway not found"))?;
        gateway.nat_gateway_description = Some(req.nat_gateway_description.clone());
        Ok(())
    }

    async fn delete_nat_gateway_instance(
        &self,
        req: &DeleteNatGatewayInstanceRequest,
    ) -> ApiResult<()> {
        record(&self.log, "vpc.deleteNatGatewayInstance");
        let mut gateways = self.gateways.lock().unwrap();
        let before = gateways.len();
        gateways.retain(|g| g.nat_gateway_instance_no.as_ref() != Some(&req.nat_gateway_instance_no));
        if gateways.len() == before {
            return Err(not_found("nat gateway not found"));
        }
        Ok(())
    }
}

pub struct MockSourceBuild {
    log: CallLog,
    family: &'static str,
    next_id: Mutex<i64>,
    pub projects: Mutex<BTreeMap<i64, Project>>,
    pub requests: Mutex<Vec<ProjectRequest>>,
}

impl MockSourceBuild {
    fn record(&self, action: &str) {
        record(&self.log, &format!("{}.{}", self.family, action));
    }

    fn parse_id(project_id: &str) -> ApiResult<i64> {
        project_id
            .parse()
            .map_err(|_| not_found("project not found"))
    }
}

#[async_trait]
impl SourceBuildApi for MockSourceBuild {
    async fn create_project(&self, req: &ProjectRequest) -> ApiResult<ProjectId> {
        self.record("createProject");
        self.requests.lock().unwrap().push(req.clone());
        let id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        let project = apply_request(
            Project {
                id,
                ..Default::default()
            },
            req,
        );
        self.projects.lock().unwrap().insert(id, project);
        Ok(ProjectId { id })
    }

    async fn get_project(&self, project_id: &str) -> ApiResult<Project> {
        self.record("getProject");
        let id = Self::parse_id(project_id)?;
        self.projects
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("project not found"))
    }

    async fn update_project(&self, project_id: &str, req: &ProjectRequest) -> ApiResult<ProjectId> {
        self.record("updateProject");
        self.requests.lock().unwrap().push(req.clone());
        let id = Self::parse_id(project_id)?;
        let mut projects = self.projects.lock().unwrap();
        let current = projects
            .remove(&id)
            .ok_or_else(|| not_found("project not found"))?;
        projects.insert(id, apply_request(current, req));
        Ok(ProjectId { id })
    }

    async fn delete_project(&self, project_id: &str) -> ApiResult<()> {
        self.record("deleteProject");
        let id = Self::parse_id(project_id)?;
        self.projects
            .lock()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("project not found"))
    }

    async fn get_computes(&self) -> ApiResult<Vec<Compute>> {
        self.record("getComputes");
        Ok(vec![
            Compute {
                id: 1,
                cpu: Some(2),
                mem: Some(4),
            },
            Compute {
                id: 2,
                cpu: Some(4),
                mem: Some(8),
            },
        ])
    }

    async fn get_os(&self) -> ApiResult<Vec<Os>> {
        self.record("getOs");
        Ok(vec![Os {
            id: 1,
            name: Some("ubuntu".to_string()),
            version: Some("16.04".to_string()),
            archi: Some("x64".to_string()),
        }])
    }

    async fn get_runtimes(&self, os_id: i64) -> ApiResult<Vec<Runtime>> {
        self.record("getRuntimes");
        if os_id != 1 {
            return Ok(Vec::new());
        }
        Ok(vec![
            Runtime {
                id: 1,
                name: Some("java".to_string()),
                version: None,
            },
            Runtime {
                id: 2,
                name: Some("python".to_string()),
                version: None,
            },
        ])
    }

    async fn get_runtime_versions(
        &self,
        os_id: i64,
        runtime_id: i64,
    ) -> ApiResult<Vec<RuntimeVersion>> {
        self.record("getRuntimeVersions");
        if os_id != 1 || runtime_id != 1 {
            return Ok(Vec::new());
        }
        Ok(vec![
            RuntimeVersion {
                id: 1,
                name: Some("openjdk-8".to_string()),
            },
            RuntimeVersion {
                id: 2,
                name: Some("openjdk-11".to_string()),
            },
        ])
    }

    async fn get_docker_engines(&self) -> ApiResult<Vec<DockerEngine>> {
        self.record("getDockerEngines");
        Ok(vec![DockerEngine {
            enabled: false,
            id: Some(1),
            name: Some("Docker:18.09.1".to_string()),
        }])
    }
}

/// Store a request the way the platform does, filling computed details
fn apply_request(mut project: Project, req: &ProjectRequest) -> Project {
    if let Some(name) = &req.name {
        project.name = name.clone();
    }
    project.description = req.description.clone();
    project.source = req.source.clone();
    project.env = req.env.clone();
    project.env.compute.cpu = Some(2);
    project.env.compute.mem = Some(4);
    if let Some(os) = project.env.platform.config.os.as_mut() {
        os.name = Some("ubuntu".to_string());
    }
    if let Some(docker) = project.env.docker.as_mut()
        && docker.id.is_some()
    {
        docker.name = Some("Docker:18.09.1".to_string());
    }
    project.cmd = req.cmd.clone();
    project.artifact = req.artifact.clone();
    project.linked = req.linked.clone();
    project
}

/// All mock families sharing one call log
pub struct Mocks {
    log: CallLog,
    pub autoscaling: Arc<MockAutoScaling>,
    pub vautoscaling: Arc<MockVautoScaling>,
    pub vpc: Arc<MockVpc>,
    pub sourcebuild: Arc<MockSourceBuild>,
    pub vsourcebuild: Arc<MockSourceBuild>,
}

impl Default for Mocks {
    fn default() -> Self {
        Self::new()
    }
}

impl Mocks {
    pub fn new() -> Self {
        let log: CallLog = Arc::default();
        let sourcebuild = |family| {
            Arc::new(MockSourceBuild {
                log: log.clone(),
                family,
                next_id: Mutex::new(0),
                projects: Mutex::default(),
                requests: Mutex::default(),
            })
        };
        Self {
            autoscaling: Arc::new(MockAutoScaling {
                log: log.clone(),
                groups: Mutex::default(),
                policies: Mutex::default(),
                puts: Mutex::default(),
            }),
            vautoscaling: Arc::new(MockVautoScaling {
                log: log.clone(),
                next_no: Mutex::new(5000),
                policies: Mutex::default(),
                puts: Mutex::default(),
            }),
            vpc: Arc::new(MockVpc {
                log: log.clone(),
                next_no: Mutex::new(0),
                gateways: Mutex::default(),
                creates: Mutex::default(),
            }),
            sourcebuild: sourcebuild("sourcebuild"),
            vsourcebuild: sourcebuild("vsourcebuild"),
            log,
        }
    }

    /// Register a classic auto scaling group
    pub fn with_classic_group(self, no: &str, name: &str) -> Self {
        self.autoscaling.groups.lock().unwrap().push(AutoScalingGroup {
            auto_scaling_group_no: Some(no.to_string()),
            auto_scaling_group_name: Some(name.to_string()),
        });
        self
    }

    pub fn clients(&self) -> Clients {
        Clients {
            autoscaling: self.autoscaling.clone(),
            vautoscaling: self.vautoscaling.clone(),
            vpc: self.vpc.clone(),
            sourcebuild: self.sourcebuild.clone(),
            vsourcebuild: self.vsourcebuild.clone(),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Whether any call went to `family`
    pub fn touched(&self, family: &str) -> bool {
        let prefix = format!("{}.", family);
        self.calls().iter().any(|c| c.starts_with(&prefix))
    }
}

//! SourceBuild REST API
//!
//! Classic and VPC accounts use the same request shapes against different
//! endpoints, so one trait serves both families.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::ApiResult;
use super::http::RestApiClient;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub repository: String,
    #[serde(default)]
    pub branch: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Source {
    #[serde(rename = "type")]
    pub source_type: String,
    pub config: SourceConfig,
}

/// Compute flavour; also an entry of `GET /env/compute`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compute {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mem: Option<i64>,
}

/// Build image OS; also an entry of `GET /env/os`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Os {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archi: Option<String>,
}

/// Entry of `GET /env/os/{os}/runtime/{runtime}/version`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeVersion {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Build runtime; `version` is absent in the runtime listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Runtime {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<RuntimeVersion>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<Os>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<Runtime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    #[serde(rename = "type")]
    pub platform_type: String,
    pub config: PlatformConfig,
}

/// Docker engine setting; also an entry of `GET /env/docker`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DockerEngine {
    #[serde(rename = "use", default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Env {
    pub compute: Compute,
    pub platform: Platform,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerEngine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env_vars: Vec<EnvVar>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cmd {
    #[serde(default)]
    pub pre: Vec<String>,
    #[serde(default)]
    pub build: Vec<String>,
    #[serde(default)]
    pub post: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArtifactStorage {
    #[serde(default)]
    pub bucket: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    #[serde(rename = "use", default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<ArtifactStorage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Linked {
    #[serde(rename = "CloudLogAnalytics", default)]
    pub cloud_log_analytics: bool,
    #[serde(rename = "FileSafer", default)]
    pub file_safer: bool,
}

/// Body of `POST /project` and `PATCH /project/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source: Source,
    pub env: Env,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<Cmd>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked: Option<Linked>,
}

/// Project as returned by `GET /project/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub source: Source,
    pub env: Env,
    #[serde(default)]
    pub cmd: Option<Cmd>,
    #[serde(default)]
    pub artifact: Option<Artifact>,
    #[serde(default)]
    pub linked: Option<Linked>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectId {
    pub id: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ComputeList {
    #[serde(default)]
    compute: Vec<Compute>,
}

#[derive(Debug, Default, Deserialize)]
struct OsList {
    #[serde(default)]
    os: Vec<Os>,
}

#[derive(Debug, Default, Deserialize)]
struct RuntimeList {
    #[serde(default)]
    runtime: Vec<Runtime>,
}

#[derive(Debug, Default, Deserialize)]
struct RuntimeVersionList {
    #[serde(default)]
    version: Vec<RuntimeVersion>,
}

#[derive(Debug, Default, Deserialize)]
struct DockerEngineList {
    #[serde(default)]
    docker: Vec<DockerEngine>,
}

#[async_trait]
pub trait SourceBuildApi: Send + Sync {
    async fn create_project(&self, req: &ProjectRequest) -> ApiResult<ProjectId>;
    async fn get_project(&self, project_id: &str) -> ApiResult<Project>;
    async fn update_project(&self, project_id: &str, req: &ProjectRequest) -> ApiResult<ProjectId>;
    async fn delete_project(&self, project_id: &str) -> ApiResult<()>;

    async fn get_computes(&self) -> ApiResult<Vec<Compute>>;
    async fn get_os(&self) -> ApiResult<Vec<Os>>;
    async fn get_runtimes(&self, os_id: i64) -> ApiResult<Vec<Runtime>>;
    async fn get_runtime_versions(
        &self,
        os_id: i64,
        runtime_id: i64,
    ) -> ApiResult<Vec<RuntimeVersion>>;
    async fn get_docker_engines(&self) -> ApiResult<Vec<DockerEngine>>;
}

pub struct HttpSourceBuildApi {
    client: RestApiClient,
}

impl HttpSourceBuildApi {
    pub fn new(client: RestApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceBuildApi for HttpSourceBuildApi {
    async fn create_project(&self, req: &ProjectRequest) -> ApiResult<ProjectId> {
        self.client.post("/project", req).await
    }

    async fn get_project(&self, project_id: &str) -> ApiResult<Project> {
        self.client.get(&format!("/project/{}", project_id)).await
    }

    async fn update_project(&self, project_id: &str, req: &ProjectRequest) -> ApiResult<ProjectId> {
        self.client
            .patch(&format!("/project/{}", project_id), req)
            .await
    }

    async fn delete_project(&self, project_id: &str) -> ApiResult<()> {
        self.client
            .delete(&format!("/project/{}", project_id))
            .await
    }

    async fn get_computes(&self) -> ApiResult<Vec<Compute>> {
        let list: ComputeList = self.client.get("/env/compute").await?;
        Ok(list.compute)
    }

    async fn get_os(&self) -> ApiResult<Vec<Os>> {
        let list: OsList = self.client.get("/env/os").await?;
        Ok(list.os)
    }

    async fn get_runtimes(&self, os_id: i64) -> ApiResult<Vec<Runtime>> {
        let list: RuntimeList = self
            .client
            .get(&format!("/env/os/{}/runtime", os_id))
            .await?;
        Ok(list.runtime)
    }

    async fn get_runtime_versions(
        &self,
        os_id: i64,
        runtime_id: i64,
    ) -> ApiResult<Vec<RuntimeVersion>> {
        let list: RuntimeVersionList = self
            .client
            .get(&format!("/env/os/{}/runtime/{}/version", os_id, runtime_id))
            .await?;
        Ok(list.version)
    }

    async fn get_docker_engines(&self) -> ApiResult<Vec<DockerEngine>> {
        let list: DockerEngineList = self.client.get("/env/docker").await?;
        Ok(list.docker)
    }
}

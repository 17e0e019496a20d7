//! `ncloud_sourcebuild_project` resource
//!
//! Nested blocks map onto the SourceBuild project body:
//!
//! ```text
//! source { type, config { repository_name, branch } }
//! env {
//!   compute { id }
//!   platform { type, config { os { id }, runtime { id, version { id } } } }
//!   docker_engine { use, id }
//!   timeout
//!   env_var [{ key, value }]
//! }
//! cmd { pre_build[], build[], post_build[] }
//! artifact { use, storage_bucket, path, filename, backup }
//! linked { cloud_log_analytics, file_safer }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ncloud_core::provider::ProviderResult;
use ncloud_core::resource::{Attributes, Value};
use ncloud_core::schema::{AttributeSchema, AttributeType, ResourceSchema, Validation, types};

use crate::client::Clients;
use crate::client::sourcebuild::{
    Artifact, ArtifactStorage, Cmd, Compute, DockerEngine, Env, EnvVar, Linked, Os, Platform,
    PlatformConfig, Project, ProjectRequest, Runtime, RuntimeVersion, Source, SourceBuildApi,
    SourceConfig,
};
use crate::config::ProviderConfig;
use crate::resources::ManagedResource;
use crate::utils::{
    api_error, block, blocks, insert_opt, map_value, optional_bool, optional_int,
    optional_string, required_block, required_int, required_string, string_list,
};

pub const RESOURCE_NAME: &str = "ncloud_sourcebuild_project";

fn id_block(extra: Vec<AttributeSchema>) -> AttributeType {
    let mut attributes = vec![AttributeSchema::new("id", AttributeType::Int).required()];
    attributes.extend(extra);
    AttributeType::Object(attributes)
}

fn computed_string(name: &str) -> AttributeSchema {
    AttributeSchema::new(name, AttributeType::String).read_only()
}

pub fn schema() -> ResourceSchema {
    let source = AttributeType::Object(vec![
        AttributeSchema::new(
            "type",
            AttributeType::one_of(&["SourceCommit", "GitHub", "Bitbucket"]),
        )
        .required(),
        AttributeSchema::new(
            "config",
            AttributeType::Object(vec![
                AttributeSchema::new("repository_name", AttributeType::String).required(),
                AttributeSchema::new("branch", AttributeType::String).required(),
            ]),
        )
        .required(),
    ]);

    let platform = AttributeType::Object(vec![
        AttributeSchema::new("type", AttributeType::one_of(&["SourceBuild"])).required(),
        AttributeSchema::new(
            "config",
            AttributeType::Object(vec![
                AttributeSchema::new(
                    "os",
                    id_block(vec![
                        computed_string("name"),
                        computed_string("version"),
                        computed_string("archi"),
                    ]),
                )
                .required(),
                AttributeSchema::new(
                    "runtime",
                    id_block(vec![
                        computed_string("name"),
                        AttributeSchema::new("version", id_block(vec![computed_string("name")]))
                            .required(),
                    ]),
                )
                .required(),
            ]),
        )
        .required(),
    ]);

    let env = AttributeType::Object(vec![
        AttributeSchema::new(
            "compute",
            id_block(vec![
                AttributeSchema::new("cpu", AttributeType::Int).read_only(),
                AttributeSchema::new("mem", AttributeType::Int).read_only(),
            ]),
        )
        .required(),
        AttributeSchema::new("platform", platform).required(),
        AttributeSchema::new(
            "docker_engine",
            AttributeType::Object(vec![
                AttributeSchema::new("use", AttributeType::Bool).required(),
                AttributeSchema::new("id", AttributeType::Int),
                computed_string("name"),
            ]),
        ),
        AttributeSchema::new("timeout", AttributeType::Int)
            .computed()
            .with_validation(Validation::IntBetween(5, 540)),
        AttributeSchema::new(
            "env_var",
            AttributeType::list_of_objects(vec![
                AttributeSchema::new("key", AttributeType::String).required(),
                AttributeSchema::new("value", AttributeType::String).required(),
            ]),
        ),
    ]);

    let cmd = AttributeType::Object(vec![
        AttributeSchema::new("pre_build", types::string_list()),
        AttributeSchema::new("build", types::string_list()),
        AttributeSchema::new("post_build", types::string_list()),
    ]);

    let artifact = AttributeType::Object(vec![
        AttributeSchema::new("use", AttributeType::Bool).required(),
        AttributeSchema::new("storage_bucket", AttributeType::String),
        AttributeSchema::new("path", AttributeType::String),
        AttributeSchema::new("filename", AttributeType::String),
        AttributeSchema::new("backup", AttributeType::Bool),
    ]);

    let linked = AttributeType::Object(vec![
        AttributeSchema::new("cloud_log_analytics", AttributeType::Bool),
        AttributeSchema::new("file_safer", AttributeType::Bool),
    ]);

    ResourceSchema::new(RESOURCE_NAME)
        .with_description("SourceBuild project")
        .attribute(
            AttributeSchema::new("name", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("description", AttributeType::String))
        .attribute(AttributeSchema::new("source", source).required())
        .attribute(AttributeSchema::new("env", env).required())
        .attribute(AttributeSchema::new("cmd", cmd).computed())
        .attribute(AttributeSchema::new("artifact", artifact).computed())
        .attribute(AttributeSchema::new("linked", linked).computed())
        .attribute(AttributeSchema::new("project_no", AttributeType::String).read_only())
}

/// Request body from declared attributes. `name` is only sent on create.
pub fn project_request(attrs: &Attributes, include_name: bool) -> ProviderResult<ProjectRequest> {
    let name = required_string(attrs, "name")?;

    let source = required_block(attrs, "source")?;
    let source_config = required_block(source, "config")?;

    let env = required_block(attrs, "env")?;
    let compute = required_block(env, "compute")?;
    let platform = required_block(env, "platform")?;
    let platform_config = required_block(platform, "config")?;
    let os = required_block(platform_config, "os")?;
    let runtime = required_block(platform_config, "runtime")?;
    let runtime_version = required_block(runtime, "version")?;

    let env_vars = blocks(env, "env_var")
        .into_iter()
        .map(|var| {
            Ok(EnvVar {
                key: required_string(var, "key")?,
                value: required_string(var, "value")?,
            })
        })
        .collect::<ProviderResult<Vec<_>>>()?;

    let docker = block(env, "docker_engine").map(|docker| DockerEngine {
        enabled: optional_bool(docker, "use").unwrap_or(false),
        id: optional_int(docker, "id"),
        name: None,
    });

    let cmd = block(attrs, "cmd").map(|cmd| Cmd {
        pre: string_list(cmd, "pre_build"),
        build: string_list(cmd, "build"),
        post: string_list(cmd, "post_build"),
    });

    let artifact = block(attrs, "artifact").map(|artifact| {
        let bucket = optional_string(artifact, "storage_bucket");
        Artifact {
            enabled: optional_bool(artifact, "use").unwrap_or(false),
            storage: bucket.map(|bucket| ArtifactStorage {
                bucket,
                path: optional_string(artifact, "path").unwrap_or_default(),
                filename: optional_string(artifact, "filename").unwrap_or_default(),
            }),
            backup: optional_bool(artifact, "backup"),
        }
    });

    let linked = block(attrs, "linked").map(|linked| Linked {
        cloud_log_analytics: optional_bool(linked, "cloud_log_analytics").unwrap_or(false),
        file_safer: optional_bool(linked, "file_safer").unwrap_or(false),
    });

    Ok(ProjectRequest {
        name: include_name.then_some(name),
        description: optional_string(attrs, "description"),
        source: Source {
            source_type: required_string(source, "type")?,
            config: SourceConfig {
                repository: required_string(source_config, "repository_name")?,
                branch: required_string(source_config, "branch")?,
            },
        },
        env: Env {
            compute: Compute {
                id: required_int(compute, "id")?,
                cpu: None,
                mem: None,
            },
            platform: Platform {
                platform_type: required_string(platform, "type")?,
                config: PlatformConfig {
                    os: Some(Os {
                        id: required_int(os, "id")?,
                        ..Default::default()
                    }),
                    runtime: Some(Runtime {
                        id: required_int(runtime, "id")?,
                        name: None,
                        version: Some(RuntimeVersion {
                            id: required_int(runtime_version, "id")?,
                            name: None,
                        }),
                    }),
                },
            },
            docker,
            timeout: optional_int(env, "timeout"),
            env_vars,
        },
        cmd,
        artifact,
        linked,
    })
}

fn strings(values: &[String]) -> Value {
    Value::List(values.iter().map(|v| Value::from(v.as_str())).collect())
}

/// Attributes of a project as the platform reports it
pub fn project_attributes(project: &Project) -> Attributes {
    let mut attrs = HashMap::new();
    attrs.insert("project_no".to_string(), Value::String(project.id.to_string()));
    attrs.insert("name".to_string(), Value::String(project.name.clone()));
    insert_opt(&mut attrs, "description", project.description.clone());

    attrs.insert(
        "source".to_string(),
        map_value([
            ("type", Value::from(project.source.source_type.as_str())),
            (
                "config",
                map_value([
                    (
                        "repository_name",
                        Value::from(project.source.config.repository.as_str()),
                    ),
                    ("branch", Value::from(project.source.config.branch.as_str())),
                ]),
            ),
        ]),
    );

    let compute = &project.env.compute;
    let mut compute_attrs = HashMap::from([("id".to_string(), Value::Int(compute.id))]);
    insert_opt(&mut compute_attrs, "cpu", compute.cpu);
    insert_opt(&mut compute_attrs, "mem", compute.mem);

    let mut platform_config = HashMap::new();
    if let Some(os) = &project.env.platform.config.os {
        let mut os_attrs = HashMap::from([("id".to_string(), Value::Int(os.id))]);
        insert_opt(&mut os_attrs, "name", os.name.clone());
        insert_opt(&mut os_attrs, "version", os.version.clone());
        insert_opt(&mut os_attrs, "archi", os.archi.clone());
        platform_config.insert("os".to_string(), Value::Map(os_attrs));
    }
    if let Some(runtime) = &project.env.platform.config.runtime {
        let mut runtime_attrs = HashMap::from([("id".to_string(), Value::Int(runtime.id))]);
        insert_opt(&mut runtime_attrs, "name", runtime.name.clone());
        if let Some(version) = &runtime.version {
            let mut version_attrs = HashMap::from([("id".to_string(), Value::Int(version.id))]);
            insert_opt(&mut version_attrs, "name", version.name.clone());
            runtime_attrs.insert("version".to_string(), Value::Map(version_attrs));
        }
        platform_config.insert("runtime".to_string(), Value::Map(runtime_attrs));
    }

    let mut env = HashMap::from([
        ("compute".to_string(), Value::Map(compute_attrs)),
        (
            "platform".to_string(),
            map_value([
                (
                    "type",
                    Value::from(project.env.platform.platform_type.as_str()),
                ),
                ("config", Value::Map(platform_config)),
            ]),
        ),
    ]);
    if let Some(docker) = &project.env.docker {
        let mut docker_attrs = HashMap::from([("use".to_string(), Value::Bool(docker.enabled))]);
        insert_opt(&mut docker_attrs, "id", docker.id);
        insert_opt(&mut docker_attrs, "name", docker.name.clone());
        env.insert("docker_engine".to_string(), Value::Map(docker_attrs));
    }
    insert_opt(&mut env, "timeout", project.env.timeout);
    if !project.env.env_vars.is_empty() {
        let vars = project
            .env
            .env_vars
            .iter()
            .map(|var| {
                map_value([
                    ("key", Value::from(var.key.as_str())),
                    ("value", Value::from(var.value.as_str())),
                ])
            })
            .collect();
        env.insert("env_var".to_string(), Value::List(vars));
    }
    attrs.insert("env".to_string(), Value::Map(env));

    if let Some(cmd) = &project.cmd {
        attrs.insert(
            "cmd".to_string(),
            map_value([
                ("pre_build", strings(&cmd.pre)),
                ("build", strings(&cmd.build)),
                ("post_build", strings(&cmd.post)),
            ]),
        );
    }

    if let Some(artifact) = &project.artifact {
        let mut artifact_attrs =
            HashMap::from([("use".to_string(), Value::Bool(artifact.enabled))]);
        if let Some(storage) = &artifact.storage {
            artifact_attrs.insert(
                "storage_bucket".to_string(),
                Value::from(storage.bucket.as_str()),
            );
            artifact_attrs.insert("path".to_string(), Value::from(storage.path.as_str()));
            artifact_attrs.insert(
                "filename".to_string(),
                Value::from(storage.filename.as_str()),
            );
        }
        insert_opt(&mut artifact_attrs, "backup", artifact.backup);
        attrs.insert("artifact".to_string(), Value::Map(artifact_attrs));
    }

    if let Some(linked) = &project.linked {
        attrs.insert(
            "linked".to_string(),
            map_value([
                ("cloud_log_analytics", Value::Bool(linked.cloud_log_analytics)),
                ("file_safer", Value::Bool(linked.file_safer)),
            ]),
        );
    }

    attrs
}

/// Project lookup shared by the resource and its data source.
/// A 404 means the project does not exist.
pub async fn find_project(
    api: &dyn SourceBuildApi,
    project_id: &str,
) -> ProviderResult<Option<Project>> {
    match api.get_project(project_id).await {
        Ok(project) => Ok(Some(project)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(api_error("getProject", e)),
    }
}

/// SourceBuild client of the configured account model
pub fn sourcebuild_api(config: &ProviderConfig, clients: &Clients) -> Arc<dyn SourceBuildApi> {
    if config.support_vpc {
        clients.vsourcebuild.clone()
    } else {
        clients.sourcebuild.clone()
    }
}

pub struct SourceBuildProjectResource {
    api: Arc<dyn SourceBuildApi>,
}

impl SourceBuildProjectResource {
    pub fn new(config: &ProviderConfig, clients: &Clients) -> Self {
        Self {
            api: sourcebuild_api(config, clients),
        }
    }
}

#[async_trait]
impl ManagedResource for SourceBuildProjectResource {
    async fn create(&self, attributes: &Attributes) -> ProviderResult<String> {
        let req = project_request(attributes, true)?;
        let created = self
            .api
            .create_project(&req)
            .await
            .map_err(|e| api_error("createProject", e))?;
        Ok(created.id.to_string())
    }

    async fn read(&self, identifier: &str, _known: &Attributes) -> ProviderResult<Option<Attributes>> {
        Ok(find_project(self.api.as_ref(), identifier)
            .await?
            .as_ref()
            .map(project_attributes))
    }

    async fn update(
        &self,
        identifier: &str,
        _from: &Attributes,
        to: &Attributes,
    ) -> ProviderResult<()> {
        let req = project_request(to, false)?;
        self.api
            .update_project(identifier, &req)
            .await
            .map(|_| ())
            .map_err(|e| api_error("updateProject", e))
    }

    async fn delete(&self, identifier: &str, _known: &Attributes) -> ProviderResult<()> {
        match self.api.delete_project(identifier).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(api_error("deleteProject", e)),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::client::mock::Mocks;
    use ncloud_core::schema::TypeError;

    /// Minimal valid project declaration
    pub(crate) fn declared() -> Attributes {
        HashMap::from([
            ("name".to_string(), Value::from("build-web")),
            (
                "source".to_string(),
                map_value([
                    ("type", Value::from("SourceCommit")),
                    (
                        "config",
                        map_value([
                            ("repository_name", Value::from("web")),
                            ("branch", Value::from("master")),
                        ]),
                    ),
                ]),
            ),
            (
                "env".to_string(),
                map_value([
                    ("compute", map_value([("id", Value::Int(1))])),
                    (
                        "platform",
                        map_value([
                            ("type", Value::from("SourceBuild")),
                            (
                                "config",
                                map_value([
                                    ("os", map_value([("id", Value::Int(1))])),
                                    (
                                        "runtime",
                                        map_value([
                                            ("id", Value::Int(1)),
                                            ("version", map_value([("id", Value::Int(2))])),
                                        ]),
                                    ),
                                ]),
                            ),
                        ]),
                    ),
                ]),
            ),
        ])
    }

    fn resource(mocks: &Mocks, support_vpc: bool) -> SourceBuildProjectResource {
        SourceBuildProjectResource::new(&ProviderConfig::new("KR", support_vpc), &mocks.clients())
    }

    fn nested<'a>(attrs: &'a Attributes, path: &[&str]) -> &'a Value {
        let (last, parents) = path.split_last().unwrap();
        let mut current = attrs;
        for key in parents {
            current = current[*key].as_map().unwrap();
        }
        &current[*last]
    }

    #[test]
    fn schema_accepts_declaration_and_rejects_computed_nested_fields() {
        let schema = schema();
        assert!(schema.validate(&declared()).is_ok());

        let mut with_cpu = declared();
        let mut env = with_cpu["env"].as_map().unwrap().clone();
        env.insert(
            "compute".to_string(),
            map_value([("id", Value::Int(1)), ("cpu", Value::Int(4))]),
        );
        with_cpu.insert("env".to_string(), Value::Map(env));

        let errors = schema.validate(&with_cpu).unwrap_err();
        assert_eq!(errors.len(), 1);
        let TypeError::Attribute { name, inner } = &errors[0] else {
            panic!("expected env error, got {:?}", errors[0]);
        };
        assert_eq!(name, "env");
        let TypeError::Attribute { name, inner } = inner.as_ref() else {
            panic!("expected compute error, got {:?}", inner);
        };
        assert_eq!(name, "compute");
        assert!(matches!(inner.as_ref(), TypeError::ReadOnly { name } if name == "cpu"));
    }

    #[test]
    fn request_carries_only_declared_sections() {
        let req = project_request(&declared(), true).unwrap();
        assert_eq!(req.name.as_deref(), Some("build-web"));
        assert_eq!(req.source.config.repository, "web");
        assert_eq!(req.env.compute.id, 1);
        assert_eq!(
            req.env.platform.config.runtime.unwrap().version.unwrap().id,
            2
        );
        assert!(req.description.is_none());
        assert!(req.env.docker.is_none());
        assert!(req.env.timeout.is_none());
        assert!(req.cmd.is_none());
        assert!(req.artifact.is_none());

        assert!(project_request(&declared(), false).unwrap().name.is_none());
    }

    #[tokio::test]
    async fn create_then_read_returns_declaration_plus_computed() {
        let mocks = Mocks::new();
        let resource = resource(&mocks, false);
        let mut config = declared();
        config.insert(
            "cmd".to_string(),
            map_value([("build", Value::List(vec![Value::from("make")]))]),
        );

        let id = resource.create(&config).await.unwrap();
        let state = resource.read(&id, &config).await.unwrap().unwrap();

        assert_eq!(state["project_no"], Value::from(id.as_str()));
        assert_eq!(state["name"], Value::from("build-web"));
        assert_eq!(
            nested(&state, &["source", "config", "repository_name"]),
            &Value::from("web")
        );
        assert_eq!(
            nested(&state, &["env", "platform", "config", "runtime", "version", "id"]),
            &Value::Int(2)
        );
        assert_eq!(nested(&state, &["env", "compute", "cpu"]), &Value::Int(2));
        assert_eq!(
            nested(&state, &["cmd", "build"]),
            &Value::List(vec![Value::from("make")])
        );
        assert!(mocks.touched("sourcebuild"));
        assert!(!mocks.touched("vsourcebuild"));
    }

    #[tokio::test]
    async fn vpc_uses_vpc_endpoint_family() {
        let mocks = Mocks::new();
        resource(&mocks, true).create(&declared()).await.unwrap();
        assert!(mocks.touched("vsourcebuild"));
        assert!(!mocks.touched("sourcebuild"));
    }

    #[tokio::test]
    async fn update_patches_without_name() {
        let mocks = Mocks::new();
        let resource = resource(&mocks, true);
        let from = declared();
        let id = resource.create(&from).await.unwrap();

        let mut to = from.clone();
        to.insert("description".to_string(), Value::from("nightly"));
        resource.update(&id, &from, &to).await.unwrap();

        let patch = mocks.vsourcebuild.requests.lock().unwrap()[1].clone();
        assert!(patch.name.is_none());
        let state = resource.read(&id, &to).await.unwrap().unwrap();
        assert_eq!(state["description"], Value::from("nightly"));
        assert_eq!(state["name"], Value::from("build-web"));
    }

    #[tokio::test]
    async fn missing_project_reads_none_and_deletes_cleanly() {
        let mocks = Mocks::new();
        let resource = resource(&mocks, false);
        assert_eq!(resource.read("77", &declared()).await.unwrap(), None);
        resource.delete("77", &declared()).await.unwrap();
    }
}

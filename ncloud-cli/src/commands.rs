use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use colored::Colorize;
use tracing::{info, warn};

use ncloud_core::differ::{create_plan, destroy_plan};
use ncloud_core::effect::Effect;
use ncloud_core::interpreter::{ApplyResult, EffectOutcome, Interpreter, InterpreterConfig};
use ncloud_core::plan::Plan;
use ncloud_core::provider::{Provider, ResourceType};
use ncloud_core::resource::{Resource, ResourceId, State};
use ncloud_core::schema::ResourceSchema;
use ncloud_provider::resources::{data_source_types, resource_types};
use ncloud_provider::{Credentials, NcloudProvider, ProviderConfig};
use ncloud_state::{ResourceState, StateBackend, StateFile, create_backend};

use crate::display::{format_effect, print_attributes, print_plan, print_schema};
use crate::manifest::Manifest;

/// API keys given on the command line (or through their environment variables)
#[derive(Debug, Default, Clone)]
pub struct KeyOverride {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}

fn load_manifest(file: &Path) -> Result<Manifest, String> {
    Manifest::load(file).map_err(|e| e.to_string())
}

fn provider_config(manifest: &Manifest, keys: &KeyOverride) -> Result<ProviderConfig, String> {
    let config = ProviderConfig::from_attributes(&manifest.provider)
        .map_err(|e| format!("Provider configuration: {}", e))?;
    match (&keys.access_key, &keys.secret_key) {
        (Some(access), Some(secret)) => Ok(config.with_credentials(Credentials::new(access, secret))),
        (None, None) => Ok(config),
        _ => Err("--access-key and --secret-key must be given together".to_string()),
    }
}

fn build_provider(config: ProviderConfig) -> Result<NcloudProvider, String> {
    info!(
        region = %config.region,
        account_model = config.account_model(),
        site = %config.site,
        "configuring provider"
    );
    NcloudProvider::from_config(config).map_err(|e| format!("Provider configuration: {}", e))
}

fn schemas_by_type(types: Vec<Box<dyn ResourceType>>) -> HashMap<String, ResourceSchema> {
    types
        .into_iter()
        .map(|t| (t.name().to_string(), t.schema()))
        .collect()
}

/// Check every declaration against its schema without touching the network
fn validate_resources(manifest: &Manifest) -> Result<(), String> {
    let resource_schemas = schemas_by_type(resource_types());
    let data_schemas = schemas_by_type(data_source_types());
    let mut all_errors = Vec::new();

    for resource in &manifest.resources {
        let (kind, schemas) = if resource.is_data_source() {
            ("data source", &data_schemas)
        } else {
            ("resource type", &resource_schemas)
        };
        match schemas.get(&resource.id.resource_type) {
            None => all_errors.push(format!(
                "{}: unknown {} '{}'",
                resource.id, kind, resource.id.resource_type
            )),
            Some(schema) => {
                if let Err(errors) = schema.validate(&resource.attributes) {
                    all_errors.extend(errors.iter().map(|e| format!("{}: {}", resource.id, e)));
                }
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(format!("Validation failed:\n  {}", all_errors.join("\n  ")))
    }
}

/// Refuse to mix resources of different account models or regions in one state
fn check_state_scope(state: &mut StateFile, config: &ProviderConfig) -> Result<(), String> {
    if !state.resources.is_empty() {
        if state.support_vpc != config.support_vpc {
            let recorded = if state.support_vpc { "vpc" } else { "classic" };
            return Err(format!(
                "State was recorded for the {} account model, but the provider is configured for {}",
                recorded,
                config.account_model()
            ));
        }
        if let Some(region) = &state.region
            && region != &config.region
        {
            return Err(format!(
                "State was recorded for region {}, but the provider is configured for {}",
                region, config.region
            ));
        }
    }
    state.region = Some(config.region.clone());
    state.support_vpc = config.support_vpc;
    Ok(())
}

/// Re-read every recorded resource. Resources that disappeared are dropped
/// from the state file; the rest get their latest attributes.
async fn refresh<P: Provider>(
    provider: &P,
    state: &mut StateFile,
) -> Result<HashMap<ResourceId, State>, String> {
    let mut current = HashMap::new();

    for recorded in state.states() {
        let Some(identifier) = recorded.identifier.as_deref() else {
            warn!(resource = %recorded.id, "recorded resource has no identifier, forgetting it");
            state.remove_resource(&recorded.id);
            continue;
        };

        let fresh = provider
            .read(&recorded.id, identifier, &recorded.attributes)
            .await
            .map_err(|e| format!("Failed to read state: {}", e))?;

        if fresh.exists {
            state.record(&fresh);
            current.insert(fresh.id.clone(), fresh);
        } else {
            info!(resource = %recorded.id, identifier, "resource no longer exists");
            state.remove_resource(&recorded.id);
        }
    }

    Ok(current)
}

/// Fold the outcome of an apply into the state file
fn record_outcomes(state: &mut StateFile, result: &ApplyResult) {
    for outcome in result.outcomes.iter().flatten() {
        match outcome {
            EffectOutcome::Created { state: s }
            | EffectOutcome::Updated { state: s }
            | EffectOutcome::Replaced { state: s } => state.record(s),
            EffectOutcome::Deleted { id } => {
                state.remove_resource(id);
            }
            EffectOutcome::Read { .. } | EffectOutcome::Skipped { .. } => {}
        }
    }
}

fn confirm(question: &str, action: &str) -> Result<bool, String> {
    println!("{}", question.yellow().bold());
    println!("  {}", action.yellow());
    print!("\n  Enter a value: ");
    std::io::stdout().flush().map_err(|e| e.to_string())?;

    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(|e| e.to_string())?;
    println!();
    Ok(input.trim() == "yes")
}

async fn execute(provider: NcloudProvider, plan: &Plan) -> ApplyResult {
    let interpreter = Interpreter::new(provider).with_config(InterpreterConfig {
        dry_run: false,
        continue_on_error: true,
    });
    let result = interpreter.apply(plan).await;

    for (effect, outcome) in plan.effects().iter().zip(&result.outcomes) {
        match outcome {
            Ok(_) => println!("  {} {}", "✓".green(), format_effect(effect)),
            Err(e) => println!("  {} {} - {}", "✗".red(), format_effect(effect), e),
        }
    }
    println!();
    result
}

async fn write_state_if_changed(
    backend: &dyn StateBackend,
    state: &mut StateFile,
    before: &[ResourceState],
) -> Result<(), String> {
    if state.resources.as_slice() == before && state.serial > 0 {
        return Ok(());
    }
    state.increment_serial();
    backend
        .write_state(state)
        .await
        .map_err(|e| format!("Failed to write state: {}", e))
}

/// Run `body` while holding the state lock, releasing it afterwards even on failure
async fn locked<F, Fut>(backend: &dyn StateBackend, operation: &str, body: F) -> Result<(), String>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<(), String>>,
{
    let lock = backend
        .acquire_lock(operation)
        .await
        .map_err(|e| e.to_string())?;

    let result = body().await;

    if let Err(e) = backend.release_lock(&lock).await {
        warn!(lock_id = %lock.id, error = %e, "failed to release state lock");
        if result.is_ok() {
            return Err(format!("Failed to release state lock: {}", e));
        }
    }
    result
}

pub fn run_validate(file: &Path) -> Result<(), String> {
    let manifest = load_manifest(file)?;
    let config = ProviderConfig::from_attributes(&manifest.provider)
        .map_err(|e| format!("Provider configuration: {}", e))?;

    println!("{}", "Validating...".cyan());

    validate_resources(&manifest)?;

    println!(
        "{}",
        format!(
            "✓ {} declarations validated successfully ({} account model, region {}).",
            manifest.resources.len(),
            config.account_model(),
            config.region
        )
        .green()
        .bold()
    );

    for resource in &manifest.resources {
        let kind = if resource.is_data_source() { "data" } else { "resource" };
        println!("  • {} {}", kind, resource.id);
    }

    Ok(())
}

pub async fn run_plan(file: &Path, keys: &KeyOverride) -> Result<(), String> {
    let manifest = load_manifest(file)?;
    validate_resources(&manifest)?;
    let config = provider_config(&manifest, keys)?;

    let backend = create_backend(&manifest.backend).map_err(|e| e.to_string())?;
    let mut state = backend
        .read_state()
        .await
        .map_err(|e| e.to_string())?
        .unwrap_or_default();
    check_state_scope(&mut state, &config)?;

    let provider = build_provider(config)?;
    let current = refresh(&provider, &mut state).await?;
    let plan = create_plan(
        &manifest.resources,
        &current,
        &schemas_by_type(provider.resource_types()),
    );

    print_plan(&plan);
    Ok(())
}

pub async fn run_apply(file: &Path, auto_approve: bool, keys: &KeyOverride) -> Result<(), String> {
    let manifest = load_manifest(file)?;
    validate_resources(&manifest)?;
    let config = provider_config(&manifest, keys)?;
    let backend = create_backend(&manifest.backend).map_err(|e| e.to_string())?;
    let backend: &dyn StateBackend = &*backend;

    locked(backend, "apply", || async move {
        let mut state = backend
            .read_state()
            .await
            .map_err(|e| e.to_string())?
            .unwrap_or_default();
        let before = state.resources.clone();
        check_state_scope(&mut state, &config)?;

        let provider = build_provider(config)?;
        let current = refresh(&provider, &mut state).await?;
        let plan = create_plan(
            &manifest.resources,
            &current,
            &schemas_by_type(provider.resource_types()),
        );

        print_plan(&plan);
        if plan.mutation_count() == 0 {
            return write_state_if_changed(backend, &mut state, &before).await;
        }
        println!();

        if !auto_approve
            && !confirm(
                "Do you want to perform these actions?",
                "Only 'yes' will be accepted to approve.",
            )?
        {
            println!("{}", "Apply cancelled.".yellow());
            return write_state_if_changed(backend, &mut state, &before).await;
        }

        println!("{}", "Applying changes...".cyan().bold());
        println!();

        let result = execute(provider, &plan).await;
        record_outcomes(&mut state, &result);
        write_state_if_changed(backend, &mut state, &before).await?;

        if result.is_success() {
            let applied = plan.effects().iter().filter(|e| e.is_mutating()).count();
            println!(
                "{}",
                format!("Apply complete! {} changes applied.", applied)
                    .green()
                    .bold()
            );
            Ok(())
        } else {
            Err(format!(
                "Apply failed. {} succeeded, {} failed.",
                result.success_count, result.failure_count
            ))
        }
    })
    .await
}

pub async fn run_destroy(file: &Path, auto_approve: bool, keys: &KeyOverride) -> Result<(), String> {
    let manifest = load_manifest(file)?;
    let config = provider_config(&manifest, keys)?;
    let backend = create_backend(&manifest.backend).map_err(|e| e.to_string())?;
    let backend: &dyn StateBackend = &*backend;

    locked(backend, "destroy", || async move {
        let mut state = backend
            .read_state()
            .await
            .map_err(|e| e.to_string())?
            .unwrap_or_default();
        let before = state.resources.clone();
        check_state_scope(&mut state, &config)?;

        let provider = build_provider(config)?;
        refresh(&provider, &mut state).await?;

        let plan = destroy_plan(&state.states());
        if plan.is_empty() {
            println!("{}", "No resources to destroy.".green());
            return write_state_if_changed(backend, &mut state, &before).await;
        }

        println!("{}", "Destroy Plan:".red().bold());
        println!();
        for effect in plan.effects() {
            if let Effect::Delete(s) = effect {
                println!("  {} {}", "-".red().bold(), s.id);
            }
        }
        println!();
        println!("Plan: {} to destroy.", plan.effects().len().to_string().red());
        println!();

        if !auto_approve
            && !confirm(
                "Do you really want to destroy all resources?",
                "This action cannot be undone. Type 'yes' to confirm.",
            )?
        {
            println!("{}", "Destroy cancelled.".yellow());
            return write_state_if_changed(backend, &mut state, &before).await;
        }

        println!("{}", "Destroying resources...".red().bold());
        println!();

        let result = execute(provider, &plan).await;
        record_outcomes(&mut state, &result);
        write_state_if_changed(backend, &mut state, &before).await?;

        if result.is_success() {
            println!(
                "{}",
                format!("Destroy complete! {} resources destroyed.", result.success_count)
                    .green()
                    .bold()
            );
            Ok(())
        } else {
            Err(format!(
                "Destroy failed. {} succeeded, {} failed.",
                result.success_count, result.failure_count
            ))
        }
    })
    .await
}

fn parse_address(address: &str) -> Result<ResourceId, String> {
    match address.split_once('.') {
        Some((resource_type, name)) if !resource_type.is_empty() && !name.is_empty() => {
            Ok(ResourceId::new(resource_type, name))
        }
        _ => Err(format!(
            "Invalid resource address '{}', expected <type>.<name>",
            address
        )),
    }
}

/// Read an existing remote resource and record it under its manifest name.
/// The declared attributes are passed along so adapters can resolve parents.
async fn import_resource<P: Provider>(
    provider: &P,
    state: &mut StateFile,
    resource: &Resource,
    identifier: &str,
) -> Result<State, String> {
    if state.find_resource(&resource.id).is_some() {
        return Err(format!("{} is already managed", resource.id));
    }

    let imported = provider
        .read(&resource.id, identifier, &resource.attributes)
        .await
        .map_err(|e| format!("Failed to read state: {}", e))?;
    if !imported.exists {
        return Err(format!(
            "Cannot import {}: no resource with identifier {}",
            resource.id, identifier
        ));
    }

    state.record(&imported);
    Ok(imported)
}

pub async fn run_import(
    file: &Path,
    address: &str,
    identifier: &str,
    keys: &KeyOverride,
) -> Result<(), String> {
    let manifest = load_manifest(file)?;
    validate_resources(&manifest)?;
    let id = parse_address(address)?;
    let resource = manifest
        .managed()
        .find(|r| r.id == id)
        .cloned()
        .ok_or_else(|| format!("{} is not declared in {}", id, file.display()))?;

    let config = provider_config(&manifest, keys)?;
    let backend = create_backend(&manifest.backend).map_err(|e| e.to_string())?;
    let backend: &dyn StateBackend = &*backend;

    locked(backend, "import", || async move {
        let mut state = backend
            .read_state()
            .await
            .map_err(|e| e.to_string())?
            .unwrap_or_default();
        check_state_scope(&mut state, &config)?;

        let provider = build_provider(config)?;
        let imported = import_resource(&provider, &mut state, &resource, identifier).await?;

        state.increment_serial();
        backend
            .write_state(&state)
            .await
            .map_err(|e| format!("Failed to write state: {}", e))?;

        print_attributes(&imported.id.to_string(), &imported.attributes);
        println!();
        println!("{}", format!("Import complete! {} imported.", resource.id).green().bold());
        Ok(())
    })
    .await
}

/// Remove a lock left behind by an interrupted run
pub async fn run_force_unlock(file: &Path, lock_id: &str) -> Result<(), String> {
    let manifest = load_manifest(file)?;
    let backend = create_backend(&manifest.backend).map_err(|e| e.to_string())?;
    backend
        .force_unlock(lock_id)
        .await
        .map_err(|e| e.to_string())?;
    println!("{}", format!("Lock {} removed.", lock_id).green().bold());
    Ok(())
}

/// Evaluate the manifest's data sources and print what they resolve to
pub async fn run_query(file: &Path, keys: &KeyOverride) -> Result<(), String> {
    let manifest = load_manifest(file)?;
    validate_resources(&manifest)?;

    let data_sources: Vec<_> = manifest.data_sources().collect();
    if data_sources.is_empty() {
        println!("{}", "No data sources declared.".yellow());
        return Ok(());
    }

    let provider = build_provider(provider_config(&manifest, keys)?)?;
    for resource in data_sources {
        let state = provider
            .read_data_source(resource)
            .await
            .map_err(|e| e.to_string())?;
        let mut attributes = state.attributes;
        if let Some(identifier) = state.identifier {
            attributes.insert("id".to_string(), identifier.into());
        }
        print_attributes(&resource.id.to_string(), &attributes);
        println!();
    }
    Ok(())
}

pub fn run_schema(type_name: Option<&str>) -> Result<(), String> {
    let resources = resource_types();
    let data_sources = data_source_types();

    match type_name {
        None => {
            for t in &resources {
                print_schema("resource", &t.schema());
            }
            for t in &data_sources {
                print_schema("data", &t.schema());
            }
            Ok(())
        }
        Some(name) => {
            let mut found = false;
            for t in resources.iter().filter(|t| t.name() == name) {
                print_schema("resource", &t.schema());
                found = true;
            }
            for t in data_sources.iter().filter(|t| t.name() == name) {
                print_schema("data", &t.schema());
                found = true;
            }
            if found {
                Ok(())
            } else {
                Err(format!("Unknown type '{}'", name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncloud_core::provider::{BoxFuture, ProviderError, ProviderResult};
    use ncloud_core::resource::{Attributes, Value};
    use std::sync::Mutex;

    /// Answers reads from a fixed set of identifiers and remembers the
    /// attributes each read was given
    struct StubProvider {
        existing: Vec<&'static str>,
        known: Mutex<Vec<Attributes>>,
    }

    impl StubProvider {
        fn with(existing: Vec<&'static str>) -> Self {
            Self {
                existing,
                known: Mutex::new(Vec::new()),
            }
        }
    }

    fn unused<T: Send + 'static>() -> BoxFuture<'static, ProviderResult<T>> {
        Box::pin(async { Err(ProviderError::new("not used here")) })
    }

    impl Provider for StubProvider {
        fn name(&self) -> &'static str {
            "stub"
        }

        fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
            vec![]
        }

        fn data_source_types(&self) -> Vec<Box<dyn ResourceType>> {
            vec![]
        }

        fn read(
            &self,
            id: &ResourceId,
            identifier: &str,
            known: &Attributes,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            self.known.lock().unwrap().push(known.clone());
            let state = if self.existing.iter().any(|e| *e == identifier) {
                let mut attributes = known.clone();
                attributes.insert("policy_no".to_string(), Value::from(identifier));
                State::existing(id.clone(), attributes).with_identifier(identifier)
            } else {
                State::not_found(id.clone())
            };
            Box::pin(async move { Ok(state) })
        }

        fn create(&self, _: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            unused()
        }

        fn update(
            &self,
            _: &ResourceId,
            _: &str,
            _: &State,
            _: &Resource,
        ) -> BoxFuture<'_, ProviderResult<State>> {
            unused()
        }

        fn delete(&self, _: &ResourceId, _: &str, _: &Attributes) -> BoxFuture<'_, ProviderResult<()>> {
            unused()
        }

        fn read_data_source(&self, _: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
            unused()
        }
    }

    fn declared_policy() -> Resource {
        Resource::new("ncloud_auto_scaling_policy", "scale-out")
            .with_attribute("adjustment_type_code", "PRCNT")
            .with_attribute("scaling_adjustment", 10i64)
            .with_attribute("auto_scaling_group_no", "7")
    }

    fn manifest(text: &str) -> Manifest {
        text.parse().unwrap()
    }

    fn policy_state(identifier: &str) -> State {
        State::existing(
            ResourceId::new("ncloud_auto_scaling_policy", "scale-out"),
            HashMap::from([("scaling_adjustment".to_string(), Value::Int(10))]),
        )
        .with_identifier(identifier)
    }

    #[test]
    fn unknown_types_fail_validation() {
        let m = manifest("[[resource]]\ntype = \"ncloud_server\"\nname = \"web\"\n");
        let err = validate_resources(&m).unwrap_err();
        assert!(err.contains("ncloud_server.web: unknown resource type 'ncloud_server'"));
    }

    #[test]
    fn schema_errors_name_the_resource() {
        let m = manifest(
            "[[resource]]\ntype = \"ncloud_nat_gateway\"\nname = \"gw\"\nzone = \"KR-1\"\n",
        );
        let err = validate_resources(&m).unwrap_err();
        assert!(err.starts_with("Validation failed:"));
        assert!(err.contains("ncloud_nat_gateway.gw:"));
    }

    #[test]
    fn data_sources_are_checked_against_data_source_schemas() {
        let m = manifest("[[data]]\ntype = \"ncloud_sourcebuild_project_os\"\nname = \"os\"\n");
        assert!(validate_resources(&m).is_ok());

        let m = manifest(
            "[[resource]]\ntype = \"ncloud_sourcebuild_project_os\"\nname = \"os\"\n",
        );
        assert!(validate_resources(&m).is_err());
    }

    #[test]
    fn key_flags_override_and_must_be_paired() {
        let m = manifest("[provider]\nregion = \"KR\"\n");
        let keys = KeyOverride {
            access_key: Some("AK".to_string()),
            secret_key: Some("SK".to_string()),
        };
        let config = provider_config(&m, &keys).unwrap();
        assert_eq!(config.credentials, Some(Credentials::new("AK", "SK")));

        let half = KeyOverride {
            access_key: Some("AK".to_string()),
            secret_key: None,
        };
        assert!(provider_config(&m, &half).is_err());
    }

    #[test]
    fn state_scope_is_stamped_then_enforced() {
        let mut state = StateFile::new();
        let vpc = ProviderConfig::new("KR", true);
        check_state_scope(&mut state, &vpc).unwrap();
        assert_eq!(state.region.as_deref(), Some("KR"));
        assert!(state.support_vpc);

        state.record(&policy_state("5001"));
        let classic = ProviderConfig::new("KR", false);
        let err = check_state_scope(&mut state, &classic).unwrap_err();
        assert!(err.contains("vpc account model"));

        let other_region = ProviderConfig::new("JPN", true);
        assert!(check_state_scope(&mut state, &other_region).is_err());
    }

    #[test]
    fn outcomes_update_the_state_file() {
        let mut state = StateFile::new();
        state.record(&policy_state("5001"));
        let gateway = State::existing(ResourceId::new("ncloud_nat_gateway", "gw"), HashMap::new())
            .with_identifier("77");

        let result = ApplyResult {
            outcomes: vec![
                Ok(EffectOutcome::Created {
                    state: gateway.clone(),
                }),
                Ok(EffectOutcome::Deleted {
                    id: ResourceId::new("ncloud_auto_scaling_policy", "scale-out"),
                }),
                Err(ProviderError::new("boom")),
            ],
            success_count: 2,
            failure_count: 1,
        };
        record_outcomes(&mut state, &result);

        assert_eq!(state.resources.len(), 1);
        let recorded = state.find_resource(&gateway.id).unwrap();
        assert_eq!(recorded.identifier.as_deref(), Some("77"));
    }

    #[tokio::test]
    async fn state_is_only_rewritten_when_it_changes() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ncloud_state::LocalBackend::with_path(dir.path().join("s.json"));

        let mut state = StateFile::new();
        write_state_if_changed(&backend, &mut state, &[]).await.unwrap();
        assert_eq!(state.serial, 1);

        let before = state.resources.clone();
        write_state_if_changed(&backend, &mut state, &before).await.unwrap();
        assert_eq!(state.serial, 1);

        state.record(&policy_state("5001"));
        write_state_if_changed(&backend, &mut state, &before).await.unwrap();
        assert_eq!(state.serial, 2);
        assert_eq!(backend.read_state().await.unwrap().unwrap().resources.len(), 1);
    }

    #[tokio::test]
    async fn lock_is_released_when_the_body_fails() {
        let dir = tempfile::tempdir().unwrap();
        let backend = ncloud_state::LocalBackend::with_path(dir.path().join("s.json"));

        let result = locked(&backend, "apply", || async { Err("boom".to_string()) }).await;
        assert_eq!(result.unwrap_err(), "boom");

        let lock = backend.acquire_lock("apply").await.unwrap();
        backend.release_lock(&lock).await.unwrap();
    }

    #[test]
    fn schema_lookup_rejects_unknown_types() {
        assert!(run_schema(Some("ncloud_nat_gateway")).is_ok());
        assert!(run_schema(Some("ncloud_sourcebuild_project_os")).is_ok());
        assert_eq!(
            run_schema(Some("ncloud_server")).unwrap_err(),
            "Unknown type 'ncloud_server'"
        );
    }

    #[test]
    fn addresses_split_on_the_first_dot() {
        assert_eq!(
            parse_address("ncloud_nat_gateway.egress.kr1").unwrap(),
            ResourceId::new("ncloud_nat_gateway", "egress.kr1")
        );
        assert!(parse_address("ncloud_nat_gateway").is_err());
        assert!(parse_address(".egress").is_err());
        assert!(parse_address("ncloud_nat_gateway.").is_err());
    }

    #[tokio::test]
    async fn import_records_the_read_state() {
        let provider = StubProvider::with(vec!["5001"]);
        let mut state = StateFile::new();
        let resource = declared_policy();

        let imported = import_resource(&provider, &mut state, &resource, "5001")
            .await
            .unwrap();
        assert_eq!(imported.identifier.as_deref(), Some("5001"));

        // the group number reaches the adapter through the declared attributes
        let known = provider.known.lock().unwrap();
        assert_eq!(known[0]["auto_scaling_group_no"], Value::from("7"));

        let recorded = state.find_resource(&resource.id).unwrap();
        assert_eq!(recorded.identifier.as_deref(), Some("5001"));
        assert_eq!(recorded.attributes["policy_no"], serde_json::json!("5001"));
    }

    #[tokio::test]
    async fn import_of_a_missing_resource_fails_without_recording() {
        let provider = StubProvider::with(vec![]);
        let mut state = StateFile::new();

        let err = import_resource(&provider, &mut state, &declared_policy(), "404")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            "Cannot import ncloud_auto_scaling_policy.scale-out: no resource with identifier 404"
        );
        assert!(state.resources.is_empty());
    }

    #[tokio::test]
    async fn import_refuses_resources_already_in_state() {
        let provider = StubProvider::with(vec!["5001"]);
        let mut state = StateFile::new();
        state.record(&policy_state("5001"));

        let err = import_resource(&provider, &mut state, &declared_policy(), "5001")
            .await
            .unwrap_err();
        assert!(err.ends_with("is already managed"));
        assert!(provider.known.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn force_unlock_removes_a_stale_lock() {
        let dir = tempfile::tempdir().unwrap();
        let state_path = dir.path().join("s.json");
        let manifest_path = dir.path().join("ncloud.toml");
        std::fs::write(
            &manifest_path,
            format!("[backend]\npath = {:?}\n", state_path.display().to_string()),
        )
        .unwrap();

        let backend = ncloud_state::LocalBackend::with_path(&state_path);
        let stale = backend.acquire_lock("apply").await.unwrap();

        assert!(run_force_unlock(&manifest_path, "not-the-lock").await.is_err());
        run_force_unlock(&manifest_path, &stale.id).await.unwrap();

        let lock = backend.acquire_lock("apply").await.unwrap();
        backend.release_lock(&lock).await.unwrap();
    }
}

//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the desired state declared in the manifest with the current
//! state read through the Provider, and generates the Effects (Plan) needed
//! to converge.

use std::collections::{HashMap, HashSet};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Attributes, Resource, ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// A changed attribute cannot be updated in place
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
///
/// Declared attributes are compared against the current values. An omitted
/// attribute only counts when the schema marks it optional and not computed;
/// values the platform fills in for omitted computed attributes never cause a
/// change.
pub fn diff(desired: &Resource, current: &State, schema: Option<&ResourceSchema>) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes, schema);

    if changed.is_empty() {
        return Diff::NoChange(desired.id.clone());
    }

    let forces_new = schema.is_some_and(|s| changed.iter().any(|name| s.is_force_new(name)));
    if forces_new {
        Diff::Replace {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between desired and current state
fn find_changed_attributes(
    desired: &Attributes,
    current: &Attributes,
    schema: Option<&ResourceSchema>,
) -> Vec<String> {
    let mut changed: Vec<String> = desired
        .iter()
        .filter(|(key, desired_value)| {
            !current
                .get(*key)
                .is_some_and(|current_value| matches_declared(desired_value, current_value))
        })
        .map(|(key, _)| key.clone())
        .collect();

    // Removed from the manifest: the remote value has to be cleared
    if let Some(schema) = schema {
        changed.extend(
            current
                .keys()
                .filter(|key| !desired.contains_key(*key))
                .filter(|key| schema.get(key).is_some_and(|a| a.optional && !a.computed))
                .cloned(),
        );
    }
    changed.sort();
    changed
}

/// Whether `current` agrees with everything declared in `desired`.
///
/// Maps may carry extra computed keys on the current side.
fn matches_declared(desired: &Value, current: &Value) -> bool {
    match (desired, current) {
        (Value::Map(d), Value::Map(c)) => d
            .iter()
            .all(|(k, dv)| c.get(k).is_some_and(|cv| matches_declared(dv, cv))),
        (Value::List(d), Value::List(c)) => {
            d.len() == c.len() && d.iter().zip(c).all(|(dv, cv)| matches_declared(dv, cv))
        }
        _ => desired == current,
    }
}

/// Compute Diff for multiple resources and generate a Plan
///
/// Data sources become Read effects. States without a desired counterpart
/// are deleted after every other effect.
pub fn create_plan(
    desired: &[Resource],
    current_states: &HashMap<ResourceId, State>,
    schemas: &HashMap<String, ResourceSchema>,
) -> Plan {
    let mut plan = Plan::new();

    for resource in desired.iter().filter(|r| r.is_data_source()) {
        plan.add(Effect::Read(resource.clone()));
    }

    for resource in desired.iter().filter(|r| !r.is_data_source()) {
        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        let d = diff(resource, &current, schemas.get(&resource.id.resource_type));

        match d {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update { id, from, to, .. } => plan.add(Effect::Update { id, from, to }),
            Diff::Replace { id, from, to, .. } => plan.add(Effect::Replace { id, from, to }),
            Diff::NoChange(_) => {}
        }
    }

    let declared: HashSet<&ResourceId> = desired.iter().map(|r| &r.id).collect();
    let mut orphans: Vec<&State> = current_states
        .values()
        .filter(|s| s.exists && !declared.contains(&s.id))
        .collect();
    orphans.sort_by(|a, b| a.id.to_string().cmp(&b.id.to_string()));
    for state in orphans {
        plan.add(Effect::Delete(state.clone()));
    }

    plan
}

/// Plan deleting every existing state, in reverse declaration order
pub fn destroy_plan(states: &[State]) -> Plan {
    let mut plan = Plan::new();
    for state in states.iter().rev().filter(|s| s.exists) {
        plan.add(Effect::Delete(state.clone()));
    }
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeSchema, AttributeType};

    fn policy_schema() -> ResourceSchema {
        ResourceSchema::new("ncloud_auto_scaling_policy")
            .attribute(AttributeSchema::new("name", AttributeType::String).force_new())
            .attribute(AttributeSchema::new("scaling_adjustment", AttributeType::Int))
            .attribute(AttributeSchema::new("cooldown", AttributeType::Int).computed())
            .attribute(AttributeSchema::new("min_adjustment_step", AttributeType::Int))
    }

    fn existing(name: &str, adjustment: i64) -> State {
        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::from(name));
        attrs.insert("scaling_adjustment".to_string(), Value::Int(adjustment));
        attrs.insert("cooldown".to_string(), Value::Int(300));
        State::existing(ResourceId::new("ncloud_auto_scaling_policy", "p"), attrs)
            .with_identifier("1001")
    }

    #[test]
    fn diff_create_when_not_exists() {
        let desired = Resource::new("ncloud_auto_scaling_policy", "p");
        let current = State::not_found(desired.id.clone());

        let result = diff(&desired, &current, Some(&policy_schema()));
        assert!(matches!(result, Diff::Create(_)));
    }

    #[test]
    fn diff_ignores_computed_values_not_declared() {
        let desired = Resource::new("ncloud_auto_scaling_policy", "p")
            .with_attribute("name", "scale-out")
            .with_attribute("scaling_adjustment", 10i64);

        let result = diff(&desired, &existing("scale-out", 10), Some(&policy_schema()));
        assert!(matches!(result, Diff::NoChange(_)));
    }

    #[test]
    fn diff_update_when_mutable_attribute_differs() {
        let desired = Resource::new("ncloud_auto_scaling_policy", "p")
            .with_attribute("name", "scale-out")
            .with_attribute("scaling_adjustment", 20i64);

        match diff(&desired, &existing("scale-out", 10), Some(&policy_schema())) {
            Diff::Update {
                changed_attributes, ..
            } => assert_eq!(changed_attributes, vec!["scaling_adjustment".to_string()]),
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn diff_update_when_optional_attribute_is_removed() {
        let desired = Resource::new("ncloud_auto_scaling_policy", "p")
            .with_attribute("name", "scale-out")
            .with_attribute("scaling_adjustment", 10i64);
        let mut current = existing("scale-out", 10);
        current
            .attributes
            .insert("min_adjustment_step".to_string(), Value::Int(2));

        match diff(&desired, &current, Some(&policy_schema())) {
            Diff::Update {
                changed_attributes, ..
            } => assert_eq!(changed_attributes, vec!["min_adjustment_step".to_string()]),
            other => panic!("Expected Update, got {:?}", other),
        }

        // Without a schema nothing tells optional from computed
        assert!(matches!(
            diff(&desired, &current, None),
            Diff::NoChange(_)
        ));
    }

    #[test]
    fn diff_replace_when_force_new_attribute_differs() {
        let desired = Resource::new("ncloud_auto_scaling_policy", "p")
            .with_attribute("name", "scale-in")
            .with_attribute("scaling_adjustment", 10i64);

        let result = diff(&desired, &existing("scale-out", 10), Some(&policy_schema()));
        assert!(matches!(result, Diff::Replace { .. }));
    }

    #[test]
    fn nested_computed_keys_do_not_cause_changes() {
        let mut declared = HashMap::new();
        declared.insert("id".to_string(), Value::Int(1));
        let mut read_back = declared.clone();
        read_back.insert("cpu".to_string(), Value::Int(2));

        assert!(matches_declared(
            &Value::Map(declared.clone()),
            &Value::Map(read_back.clone())
        ));
        assert!(!matches_declared(
            &Value::Map(read_back),
            &Value::Map(declared)
        ));
        assert!(!matches_declared(
            &Value::List(vec![Value::from("a")]),
            &Value::List(vec![Value::from("a"), Value::from("b")])
        ));
    }

    #[test]
    fn create_plan_from_resources() {
        let resources = vec![
            Resource::new("ncloud_nat_gateway", "new"),
            Resource::new("ncloud_auto_scaling_policy", "p")
                .with_attribute("name", "scale-out")
                .with_attribute("scaling_adjustment", 5i64),
            Resource::new("ncloud_nat_gateway", "lookup").with_read_only(true),
        ];

        let mut current_states = HashMap::new();
        current_states.insert(
            ResourceId::new("ncloud_auto_scaling_policy", "p"),
            existing("scale-out", 10),
        );
        let orphan_id = ResourceId::new("ncloud_nat_gateway", "old");
        current_states.insert(
            orphan_id.clone(),
            State::existing(orphan_id, HashMap::new()).with_identifier("77"),
        );

        let mut schemas = HashMap::new();
        schemas.insert("ncloud_auto_scaling_policy".to_string(), policy_schema());

        let plan = create_plan(&resources, &current_states, &schemas);

        assert_eq!(plan.effects().len(), 4);
        assert!(matches!(plan.effects()[0], Effect::Read(_)));
        assert!(matches!(plan.effects()[1], Effect::Create(_)));
        assert!(matches!(plan.effects()[2], Effect::Update { .. }));
        assert!(matches!(&plan.effects()[3], Effect::Delete(s) if s.id.name == "old"));
    }

    #[test]
    fn destroy_plan_reverses_order() {
        let a = State::existing(ResourceId::new("t", "a"), HashMap::new()).with_identifier("1");
        let b = State::existing(ResourceId::new("t", "b"), HashMap::new()).with_identifier("2");
        let plan = destroy_plan(&[a, b]);
        assert_eq!(plan.effects()[0].id().name, "b");
        assert_eq!(plan.effects()[1].id().name, "a");
    }
}

//! State file structures for persisting managed resources

use std::collections::HashMap;

use ncloud_core::resource::{Attributes, ResourceId, State, Value};
use serde::{Deserialize, Serialize};

/// The main state file structure that persists to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// State file format version
    pub version: u32,
    /// Monotonically increasing number for each state modification
    pub serial: u64,
    /// Unique identifier for this state lineage (prevents accidental overwrites)
    pub lineage: String,
    /// Version of ncloud that last modified this state
    pub ncloud_version: String,
    /// Region and account model the resources were created under
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub support_vpc: bool,
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage: uuid::Uuid::new_v4().to_string(),
            ncloud_version: env!("CARGO_PKG_VERSION").to_string(),
            region: None,
            support_vpc: false,
            resources: Vec::new(),
        }
    }

    /// Increment serial and stamp the current version before a write
    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.ncloud_version = env!("CARGO_PKG_VERSION").to_string();
    }

    pub fn find_resource(&self, id: &ResourceId) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == id.resource_type && r.name == id.name)
    }

    /// Record the observed state of a resource. A state that no longer
    /// exists drops the entry.
    pub fn record(&mut self, state: &State) {
        if !state.exists {
            self.remove_resource(&state.id);
            return;
        }
        let entry = ResourceState::from_state(state);
        match self
            .resources
            .iter_mut()
            .find(|r| r.resource_type == entry.resource_type && r.name == entry.name)
        {
            Some(existing) => *existing = entry,
            None => self.resources.push(entry),
        }
    }

    pub fn remove_resource(&mut self, id: &ResourceId) -> Option<ResourceState> {
        let pos = self
            .resources
            .iter()
            .position(|r| r.resource_type == id.resource_type && r.name == id.name)?;
        Some(self.resources.remove(pos))
    }

    /// Recorded resources as core states
    pub fn states(&self) -> Vec<State> {
        self.resources.iter().map(ResourceState::to_state).collect()
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// State of a single managed resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Resource type (e.g., "ncloud_nat_gateway")
    pub resource_type: String,
    /// Name given in the manifest
    pub name: String,
    /// Platform-assigned identifier
    pub identifier: Option<String>,
    /// Last-read attributes as JSON values
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ResourceState {
    pub fn from_state(state: &State) -> Self {
        Self {
            resource_type: state.id.resource_type.clone(),
            name: state.id.name.clone(),
            identifier: state.identifier.clone(),
            attributes: state
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        }
    }

    pub fn to_state(&self) -> State {
        let attributes: Attributes = self
            .attributes
            .iter()
            .filter_map(|(k, v)| json_to_value(v).map(|v| (k.clone(), v)))
            .collect();
        let state = State::existing(
            ResourceId::new(self.resource_type.clone(), self.name.clone()),
            attributes,
        );
        match &self.identifier {
            Some(identifier) => state.with_identifier(identifier.clone()),
            None => state,
        }
    }
}

pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Int(n) => serde_json::Value::from(*n),
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
    }
}

/// Convert JSON back into a value. `null` and fractional numbers have no
/// counterpart and are dropped.
pub fn json_to_value(value: &serde_json::Value) -> Option<Value> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(Value::String(s.clone())),
        serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
        serde_json::Value::Number(n) => n.as_i64().map(Value::Int),
        serde_json::Value::Array(items) => {
            Some(Value::List(items.iter().filter_map(json_to_value).collect()))
        }
        serde_json::Value::Object(map) => Some(Value::Map(
            map.iter()
                .filter_map(|(k, v)| json_to_value(v).map(|v| (k.clone(), v)))
                .collect(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway_state(description: &str) -> State {
        let mut attributes = HashMap::new();
        attributes.insert("description".to_string(), Value::from(description));
        attributes.insert("vpc_no".to_string(), Value::from("100"));
        State::existing(ResourceId::new("ncloud_nat_gateway", "egress"), attributes)
            .with_identifier("1001")
    }

    #[test]
    fn new_state_file_is_empty() {
        let state = StateFile::new();
        assert_eq!(state.version, StateFile::CURRENT_VERSION);
        assert_eq!(state.serial, 0);
        assert!(!state.lineage.is_empty());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn record_upserts_and_drops_missing() {
        let mut file = StateFile::new();
        file.record(&gateway_state("a"));
        file.record(&gateway_state("b"));
        assert_eq!(file.resources.len(), 1);
        assert_eq!(
            file.resources[0].attributes["description"],
            serde_json::json!("b")
        );

        file.record(&State::not_found(ResourceId::new("ncloud_nat_gateway", "egress")));
        assert!(file.resources.is_empty());
    }

    #[test]
    fn nested_values_survive_a_state_round_trip() {
        let mut attributes = HashMap::new();
        attributes.insert(
            "env".to_string(),
            Value::Map(HashMap::from([
                ("timeout".to_string(), Value::Int(60)),
                (
                    "env_var".to_string(),
                    Value::List(vec![Value::Map(HashMap::from([(
                        "key".to_string(),
                        Value::from("STAGE"),
                    )]))]),
                ),
            ])),
        );
        let state = State::existing(ResourceId::new("ncloud_sourcebuild_project", "web"), attributes)
            .with_identifier("7");

        let mut file = StateFile::new();
        file.record(&state);
        let json = serde_json::to_string_pretty(&file).unwrap();
        let restored: StateFile = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.states(), vec![state]);
    }

    #[test]
    fn nulls_are_dropped() {
        assert_eq!(json_to_value(&serde_json::Value::Null), None);
        assert_eq!(
            json_to_value(&serde_json::json!({"a": null, "b": 1})),
            Some(Value::Map(HashMap::from([("b".to_string(), Value::Int(1))])))
        );
    }
}

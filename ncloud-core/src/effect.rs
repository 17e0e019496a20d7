//! Effect - A side effect the interpreter performs against a Provider

use crate::resource::{Resource, ResourceId, State};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Evaluate a data source
    Read(Resource),
    /// Create a resource that does not exist yet
    Create(Resource),
    /// Change a resource in place
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
    },
    /// Delete then recreate because a ForceNew attribute changed
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
    },
    /// Delete a resource that is no longer declared
    Delete(State),
}

impl Effect {
    pub fn id(&self) -> &ResourceId {
        match self {
            Effect::Read(r) | Effect::Create(r) => &r.id,
            Effect::Update { id, .. } | Effect::Replace { id, .. } => id,
            Effect::Delete(state) => &state.id,
        }
    }

    /// Whether this Effect changes anything on the platform
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }
}

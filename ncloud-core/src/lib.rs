//! NCloud Core
//!
//! Resource model, schema validation, data source filtering and the
//! plan/apply machinery shared by the NCloud provider and its CLI.

pub mod differ;
pub mod effect;
pub mod filter;
pub mod interpreter;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod schema;

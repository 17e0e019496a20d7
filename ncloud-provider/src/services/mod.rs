//! Resource adapters and data sources, grouped by NCloud service

pub mod autoscaling;
pub mod devtools;
pub mod vpc;

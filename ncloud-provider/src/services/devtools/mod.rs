//! Developer tools: SourceBuild projects and their build-environment lookups

pub mod sourcebuild_env;
pub mod sourcebuild_project;
pub mod sourcebuild_project_data_source;

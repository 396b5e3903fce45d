// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Project configuration
//!
//! Defaults for the CLI, loaded from `.stagegraph.yaml` in the project
//! directory. Command-line flags take precedence over anything set here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::pipeline::PIPELINE_FILE_NAME;
use crate::StagegraphError;

/// Name of the project configuration file
pub const CONFIG_FILE_NAME: &str = ".stagegraph.yaml";

/// Configuration from .stagegraph.yaml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProjectConfig {
    /// Pipeline identifier used in generated names
    #[serde(default = "default_pipeline")]
    pub pipeline: String,

    /// Build identifier used in generated names
    #[serde(default = "default_build")]
    pub build: String,

    /// Namespace of the emitted descriptors
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Output format for `compile`
    #[serde(default)]
    pub output: OutputFormat,

    /// Pipeline definition, relative to the project directory
    #[serde(default = "default_pipeline_file")]
    pub pipeline_file: PathBuf,
}

fn default_pipeline() -> String {
    "pipeline".to_string()
}

fn default_build() -> String {
    "1".to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_pipeline_file() -> PathBuf {
    PathBuf::from(PIPELINE_FILE_NAME)
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            pipeline: default_pipeline(),
            build: default_build(),
            namespace: default_namespace(),
            output: OutputFormat::default(),
            pipeline_file: default_pipeline_file(),
        }
    }
}

/// Serialization of compiled descriptors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Multi-document YAML: the pipeline, then each task
    #[default]
    Yaml,
    /// A single JSON object with `pipeline` and `tasks`
    Json,
}

impl ProjectConfig {
    /// Load from file; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, StagegraphError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| StagegraphError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        // An empty file is a valid, empty configuration
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| StagegraphError::InvalidConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load from project directory (looks for .stagegraph.yaml)
    pub fn load_from_project(project_root: &Path) -> Result<Self, StagegraphError> {
        Self::load(&project_root.join(CONFIG_FILE_NAME))
    }

    /// Pipeline definition path resolved against the project directory
    pub fn pipeline_path(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.pipeline_file)
    }
}

/// Generate a commented .stagegraph.yaml
pub fn generate_default_config() -> String {
    format!(
        r#"# stagegraph project configuration
# Command-line flags override these values.

pipeline: {pipeline}
build: "{build}"
namespace: {namespace}

# yaml or json
output: yaml

pipeline_file: {file}
"#,
        pipeline = default_pipeline(),
        build = default_build(),
        namespace = default_namespace(),
        file = PIPELINE_FILE_NAME,
    )
}

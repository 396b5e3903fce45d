// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Pipeline definition structures
//!
//! Defines the schema for Jenkinsfile.yaml files: a root with an agent,
//! environment and options, and a tree of stages that are either a list of
//! steps, a sequential list of nested stages, or a parallel list of them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Default file name of a pipeline definition
pub const PIPELINE_FILE_NAME: &str = "Jenkinsfile.yaml";

/// Pipeline definition from Jenkinsfile.yaml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDefinition {
    /// Definition format version, `v<major>.<minor>`
    #[serde(default)]
    pub api_version: String,

    /// Agent inherited by every stage that does not set its own
    #[serde(default, skip_serializing_if = "Agent::is_empty")]
    pub agent: Agent,

    /// Environment visible to every stage
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvVar>,

    #[serde(default, skip_serializing_if = "RootOptions::is_empty")]
    pub options: RootOptions,

    /// Top-level stages, run in order
    #[serde(default)]
    pub stages: Vec<Stage>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post: Vec<Post>,
}

impl PipelineDefinition {
    /// Load a pipeline definition from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, crate::StagegraphError> {
        if !path.exists() {
            return Err(crate::StagegraphError::PipelineNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::StagegraphError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            }
        })?;

        Self::from_yaml(&content)
    }

    /// Parse a pipeline definition from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, crate::StagegraphError> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Serialize the definition back to YAML
    pub fn to_yaml(&self) -> Result<String, crate::StagegraphError> {
        serde_yaml::to_string(self).map_err(Into::into)
    }
}

/// Where a stage's steps run: a labelled node or a container image
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Agent {
    pub fn image(image: &str) -> Self {
        Self {
            label: None,
            image: Some(image.to_string()),
        }
    }

    /// An agent with nothing specified, meaning "inherit from the parent".
    /// Empty strings count as unset.
    pub fn is_empty(&self) -> bool {
        is_blank(&self.label) && is_blank(&self.image)
    }

    /// This agent if it specifies anything, otherwise `parent`
    pub fn or_inherit<'a>(&'a self, parent: &'a Agent) -> &'a Agent {
        if self.is_empty() {
            parent
        } else {
            self
        }
    }

    /// Image to run steps in; empty for label-only agents
    pub fn image_or_default(&self) -> String {
        self.image.clone().unwrap_or_default()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// A name/value environment entry as written in the definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

impl EnvVar {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Time units accepted by a timeout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeoutUnit {
    pub const ALL: [TimeoutUnit; 4] = [Self::Seconds, Self::Minutes, Self::Hours, Self::Days];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seconds => "seconds",
            Self::Minutes => "minutes",
            Self::Hours => "hours",
            Self::Days => "days",
        }
    }
}

impl std::str::FromStr for TimeoutUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|u| u.as_str() == s)
            .ok_or_else(|| format!("Unknown time unit: {}", s))
    }
}

impl std::fmt::Display for TimeoutUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Timeout as written; the unit is checked by the validator so a bad unit
/// is reported with its field path rather than as a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeout {
    #[serde(default)]
    pub time: i64,

    #[serde(default)]
    pub unit: String,
}

impl Timeout {
    pub fn is_empty(&self) -> bool {
        self.time == 0 && self.unit.is_empty()
    }
}

/// Options allowed at the top level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Timeout>,

    #[serde(default, skip_serializing_if = "is_zero")]
    pub retry: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl RootOptions {
    pub fn is_empty(&self) -> bool {
        self.timeout.as_ref().map_or(true, Timeout::is_empty) && self.retry == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stash {
    #[serde(default)]
    pub name: String,

    /// Glob of files to stash
    #[serde(default)]
    pub files: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unstash {
    #[serde(default)]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

/// Options allowed on a stage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageOptions {
    #[serde(flatten)]
    pub root: RootOptions,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stash: Option<Stash>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unstash: Option<Unstash>,

    /// Named workspace: unset inherits, `"empty"` starts fresh
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
}

impl StageOptions {
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
            && self.stash.is_none()
            && self.unstash.is_none()
            && self.workspace.is_none()
    }
}

/// A single step: either a shell command or a named reusable step
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,

    /// Only allowed with `command`
    #[serde(default, rename = "args", skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,

    /// Sub-directory of the workspace, only allowed with `command`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,

    /// Only allowed with `step`
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Agent::is_empty")]
    pub agent: Agent,
}

impl Step {
    pub fn command(command: &str, args: &[&str]) -> Self {
        Self {
            command: Some(command.to_string()),
            arguments: args.iter().map(|a| a.to_string()).collect(),
            ..Default::default()
        }
    }
}

/// A named unit of pipeline configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,

    #[serde(default, skip_serializing_if = "Agent::is_empty")]
    pub agent: Agent,

    #[serde(default, skip_serializing_if = "StageOptions::is_empty")]
    pub options: StageOptions,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment: Vec<EnvVar>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<Step>,

    /// Nested stages run one after another
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stages: Vec<Stage>,

    /// Nested stages run side by side
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parallel: Vec<Stage>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post: Vec<Post>,
}

impl Stage {
    /// Leaf stage running the given steps
    pub fn with_steps(name: &str, steps: Vec<Step>) -> Self {
        Self {
            name: name.to_string(),
            steps,
            ..Default::default()
        }
    }

    /// Composite stage running `stages` in order
    pub fn sequential(name: &str, stages: Vec<Stage>) -> Self {
        Self {
            name: name.to_string(),
            stages,
            ..Default::default()
        }
    }

    /// Composite stage running `stages` side by side
    pub fn parallel(name: &str, stages: Vec<Stage>) -> Self {
        Self {
            name: name.to_string(),
            parallel: stages,
            ..Default::default()
        }
    }

    /// Set the stage's workspace option
    pub fn in_workspace(mut self, workspace: &str) -> Self {
        self.options.workspace = Some(workspace.to_string());
        self
    }
}

/// When a post section runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostCondition {
    Success,
    Failure,
    Always,
}

/// Actions to run after a stage or the whole pipeline completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub condition: PostCondition,

    #[serde(default)]
    pub actions: Vec<PostAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostAction {
    pub name: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

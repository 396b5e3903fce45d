// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Task descriptor: one isolated execution unit per leaf stage

use serde::{Deserialize, Serialize};

use super::{ObjectMeta, ResourceType, API_VERSION, ORDERING_RESOURCE, WORKSPACE_RESOURCE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: TaskSpec,
}

impl Task {
    /// Empty task with the standard workspace and ordering resources wired in.
    ///
    /// `workspace_path` is the checkout target for the workspace input; only
    /// the first task of a pipeline gets one.
    pub fn new(name: String, namespace: &str, workspace_path: Option<&str>) -> Self {
        let mut workspace = TaskResource::new(WORKSPACE_RESOURCE, ResourceType::Git);
        workspace.target_path = workspace_path.map(str::to_string);

        Self {
            api_version: API_VERSION.to_string(),
            kind: "Task".to_string(),
            metadata: ObjectMeta {
                name,
                namespace: namespace.to_string(),
            },
            spec: TaskSpec {
                inputs: TaskResources {
                    resources: vec![
                        workspace,
                        TaskResource::new(ORDERING_RESOURCE, ResourceType::Image),
                    ],
                },
                outputs: TaskResources {
                    resources: vec![
                        TaskResource::new(WORKSPACE_RESOURCE, ResourceType::Git),
                        TaskResource::new(ORDERING_RESOURCE, ResourceType::Image),
                    ],
                },
                steps: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Target path of the workspace input, if this task performs the checkout
    pub fn workspace_path(&self) -> Option<&str> {
        self.spec
            .inputs
            .resources
            .iter()
            .find(|r| r.name == WORKSPACE_RESOURCE)
            .and_then(|r| r.target_path.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub inputs: TaskResources,
    pub outputs: TaskResources,
    pub steps: Vec<Container>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResources {
    pub resources: Vec<TaskResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResource {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
}

impl TaskResource {
    pub fn new(name: &str, resource_type: ResourceType) -> Self {
        Self {
            name: name.to_string(),
            resource_type,
            target_path: None,
        }
    }
}

/// A single step of a task, run as one container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub image: String,
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVar>,
}

/// A resolved environment variable on a container
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Pipeline descriptor: task references plus their resource dependency edges

use serde::{Deserialize, Serialize};

use super::{
    ObjectMeta, ResourceType, API_VERSION, COMMON_WORKSPACE_RESOURCE, ORDERING_RESOURCE,
    WORKSPACE_RESOURCE,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: PipelineSpec,
}

impl Pipeline {
    /// Empty pipeline declaring the shared workspace and ordering resources
    pub fn new(name: String, namespace: &str) -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: "Pipeline".to_string(),
            metadata: ObjectMeta {
                name,
                namespace: namespace.to_string(),
            },
            spec: PipelineSpec {
                resources: vec![
                    PipelineDeclaredResource {
                        name: COMMON_WORKSPACE_RESOURCE.to_string(),
                        resource_type: ResourceType::Git,
                    },
                    PipelineDeclaredResource {
                        name: ORDERING_RESOURCE.to_string(),
                        resource_type: ResourceType::Image,
                    },
                ],
                tasks: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Find the pipeline task referencing the given task name
    pub fn task_for(&self, task_name: &str) -> Option<&PipelineTask> {
        self.spec.tasks.iter().find(|t| t.task_ref.name == task_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub resources: Vec<PipelineDeclaredResource>,
    pub tasks: Vec<PipelineTask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDeclaredResource {
    pub name: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
}

/// A task's place in the pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineTask {
    pub name: String,
    pub task_ref: TaskRef,
    pub resources: PipelineTaskResources,
}

impl PipelineTask {
    /// Pipeline task whose workspace comes from `workspace_from` and which
    /// runs after every task in `ordering_from`.
    pub fn new(
        name: String,
        task_name: String,
        workspace_from: Vec<String>,
        ordering_from: Vec<String>,
    ) -> Self {
        Self {
            name,
            task_ref: TaskRef { name: task_name },
            resources: PipelineTaskResources {
                inputs: vec![
                    PipelineTaskInputResource {
                        name: WORKSPACE_RESOURCE.to_string(),
                        resource: COMMON_WORKSPACE_RESOURCE.to_string(),
                        from: workspace_from,
                    },
                    PipelineTaskInputResource {
                        name: ORDERING_RESOURCE.to_string(),
                        resource: ORDERING_RESOURCE.to_string(),
                        from: ordering_from,
                    },
                ],
                outputs: vec![
                    PipelineTaskOutputResource {
                        name: WORKSPACE_RESOURCE.to_string(),
                        resource: COMMON_WORKSPACE_RESOURCE.to_string(),
                    },
                    PipelineTaskOutputResource {
                        name: ORDERING_RESOURCE.to_string(),
                        resource: ORDERING_RESOURCE.to_string(),
                    },
                ],
            },
        }
    }

    /// Tasks whose output workspace this task receives
    pub fn workspace_providers(&self) -> &[String] {
        self.input_from(WORKSPACE_RESOURCE)
    }

    /// Tasks that must finish before this one starts
    pub fn ordering_providers(&self) -> &[String] {
        self.input_from(ORDERING_RESOURCE)
    }

    fn input_from(&self, input: &str) -> &[String] {
        self.resources
            .inputs
            .iter()
            .find(|r| r.name == input)
            .map(|r| r.from.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineTaskResources {
    pub inputs: Vec<PipelineTaskInputResource>,
    pub outputs: Vec<PipelineTaskOutputResource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineTaskInputResource {
    pub name: String,
    pub resource: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineTaskOutputResource {
    pub name: String,
    pub resource: String,
}

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Declarative descriptors emitted by the compiler
//!
//! These mirror the build-pipeline `Task` and `Pipeline` resources closely
//! enough to be applied as-is; nothing here talks to a cluster.

mod pipeline;
mod task;

pub use pipeline::*;
pub use task::*;

use serde::{Deserialize, Serialize};

/// API version stamped on every emitted descriptor
pub const API_VERSION: &str = "pipeline.knative.dev/v1alpha1";

/// Name of the workspace resource on tasks and pipeline tasks
pub const WORKSPACE_RESOURCE: &str = "workspace";

/// Name of the pipeline-level resource that carries the workspace
pub const COMMON_WORKSPACE_RESOURCE: &str = "common-workspace";

/// Resource used purely to force ordering between tasks
pub const ORDERING_RESOURCE: &str = "temp-ordering-resource";

/// Name and namespace of an emitted object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    pub namespace: String,
}

/// Kind of a declared resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Git,
    Image,
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Git => write!(f, "git"),
            Self::Image => write!(f, "image"),
        }
    }
}

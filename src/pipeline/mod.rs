// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Pipeline definitions and their compilation
//!
//! A definition is validated, its stages are transformed into tasks, the
//! tasks' workspace and ordering dependencies are resolved, and the result
//! is assembled into a pipeline descriptor plus one task per leaf stage.

mod assemble;
mod definition;
mod env;
mod graph;
mod label;
mod resolve;
mod transform;
mod validation;

pub use assemble::{assemble, compile, compile_with, CompiledPipeline};
pub use definition::*;
pub use env::{root_env, scoped_env};
pub use graph::{Dependency, PipelineGraph};
pub use label::{mangle, MAX_LABEL_LENGTH};
pub use resolve::{resolve, WorkspaceSearch};
pub use transform::{
    transform, StageId, StageKind, StageTree, TransformContext, TransformedStage, CHECKOUT_PATH,
    DEFAULT_WORKSPACE, FRESH_WORKSPACE,
};
pub use validation::PipelineValidator;

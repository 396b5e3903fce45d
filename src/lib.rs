// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! # stagegraph - Declarative Pipeline Compiler
//!
//! `stagegraph` compiles a declarative, Jenkinsfile-style stage tree into a
//! flat set of isolated tasks plus a pipeline descriptor that wires them
//! together through workspace and ordering resources.
//!
//! ## Features
//!
//! - **Validation** - Every error points at the exact field that caused it
//! - **Nested and parallel stages** - Arbitrary sequential/parallel nesting
//! - **Named workspaces** - Hand a workspace to any later stage
//! - **Graph views** - Text, DOT and Mermaid renderings of the task graph
//!
//! ## Quick Start
//!
//! ```bash
//! # Write an example Jenkinsfile.yaml
//! stagegraph init
//!
//! # Check it
//! stagegraph validate
//!
//! # Emit the pipeline and tasks
//! stagegraph compile --pipeline my-app --build 42
//! ```
//!
//! ## Library use
//!
//! ```no_run
//! use stagegraph::{compile, PipelineDefinition};
//!
//! let definition = PipelineDefinition::from_file("Jenkinsfile.yaml".as_ref())?;
//! let compiled = compile(&definition, "my-app", "42", "ci", "")?;
//! println!("{}", compiled.to_yaml()?);
//! # Ok::<(), stagegraph::StagegraphError>(())
//! ```

pub mod cli;
pub mod config;
pub mod crd;
pub mod errors;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use errors::{StagegraphError, StagegraphResult};
pub use pipeline::{compile, compile_with, CompiledPipeline, PipelineDefinition, Stage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

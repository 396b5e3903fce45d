// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Error types
//!
//! Compilation either succeeds completely or fails with one of these
//! errors. Validation failures carry field paths; features that are parsed
//! but cannot be compiled yet surface as [`UnsupportedFeature`] kinds whose
//! messages are stable and safe to match on.

mod field;
mod recovery;

pub use field::{FieldError, FieldPath, PathSegment, ValidationError};
pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for stagegraph operations
pub type StagegraphResult<T> = Result<T, StagegraphError>;

/// Features that parse and validate but are rejected by the compiler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum UnsupportedFeature {
    #[error("post on stages not yet supported")]
    StagePost,

    #[error("Timeout on stage not yet supported")]
    StageTimeout,

    #[error("Retry on stage not yet supported")]
    StageRetry,

    #[error("Stash on stage not yet supported")]
    StageStash,

    #[error("Unstash on stage not yet supported")]
    StageUnstash,

    #[error("options at top level not yet supported")]
    RootOptions,

    #[error("post at top level not yet supported")]
    RootPost,

    #[error("syntactic sugar steps not yet supported")]
    SyntacticSugarStep,

    /// Only reachable when compiling a definition that skipped validation
    #[error("no steps, sequential stages, or parallel stages")]
    EmptyStage,
}

/// Main error type for stagegraph
#[derive(Error, Debug, Diagnostic)]
pub enum StagegraphError {
    // ─────────────────────────────────────────────────────────────────────────
    // Compilation Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{0}")]
    #[diagnostic(
        code(stagegraph::invalid_pipeline),
        help("Fix the fields listed above and run 'stagegraph validate' again")
    )]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    #[diagnostic(
        code(stagegraph::unsupported_feature),
        help("Remove this setting from the pipeline definition; it cannot be compiled yet")
    )]
    Unsupported(#[from] UnsupportedFeature),

    #[error("Circular dependency detected between tasks: {}", tasks.join(" → "))]
    #[diagnostic(
        code(stagegraph::circular_dependency),
        help("The pipeline descriptor was edited by hand; regenerate it with 'stagegraph compile'")
    )]
    CircularDependency { tasks: Vec<String> },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline file not found: {path}")]
    #[diagnostic(
        code(stagegraph::pipeline_not_found),
        help("Create a pipeline with 'stagegraph init' or pass the file path explicitly")
    )]
    PipelineNotFound { path: PathBuf },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(stagegraph::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(stagegraph::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    #[error("Invalid configuration in '{path}': {reason}")]
    #[diagnostic(code(stagegraph::invalid_config))]
    InvalidConfig { path: PathBuf, reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(stagegraph::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(stagegraph::yaml_error))]
    Yaml {
        message: String,
        line: Option<usize>,
        column: Option<usize>,
    },

    #[error("JSON error: {message}")]
    #[diagnostic(code(stagegraph::json_error))]
    Json { message: String },
}

impl From<std::io::Error> for StagegraphError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for StagegraphError {
    fn from(e: serde_yaml::Error) -> Self {
        let location = e.location();
        Self::Yaml {
            message: e.to_string(),
            line: location.as_ref().map(|l| l.line()),
            column: location.as_ref().map(|l| l.column()),
        }
    }
}

impl From<serde_json::Error> for StagegraphError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<FieldError> for StagegraphError {
    fn from(e: FieldError) -> Self {
        Self::Validation(e.into())
    }
}

impl StagegraphError {
    /// The unsupported feature behind this error, if that is what it is
    pub fn unsupported_feature(&self) -> Option<UnsupportedFeature> {
        match self {
            Self::Unsupported(feature) => Some(*feature),
            _ => None,
        }
    }

    /// A recovery suggestion for the CLI to print alongside the error
    pub fn suggestion(&self) -> Option<RecoverySuggestion> {
        match self {
            Self::Validation(e) => Some(RecoverySuggestion::fix_validation(e)),
            Self::Unsupported(feature) => Some(RecoverySuggestion::remove_unsupported(*feature)),
            Self::PipelineNotFound { path } => Some(RecoverySuggestion::create_pipeline(path)),
            Self::Yaml { line, column, .. } => {
                Some(RecoverySuggestion::fix_yaml_syntax(*line, *column))
            }
            _ => None,
        }
    }
}

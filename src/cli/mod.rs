// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for stagegraph.

pub mod compile;
pub mod graph;
pub mod init;
pub mod validate;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{OutputFormat, ProjectConfig};
use crate::pipeline::PipelineDefinition;
use crate::StagegraphError;

/// Pipeline compiler
///
/// Compile declarative Jenkinsfile.yaml pipelines into Task and Pipeline
/// descriptors.
#[derive(Parser, Debug)]
#[clap(
    name = "stagegraph",
    version,
    about = "Compile declarative stage pipelines into task graph descriptors",
    long_about = None,
    after_help = "Examples:\n\
        stagegraph init                          Write an example Jenkinsfile.yaml\n\
        stagegraph validate                      Check the pipeline definition\n\
        stagegraph compile --build 42            Emit the pipeline and its tasks\n\
        stagegraph graph --format mermaid        Show the task graph\n\n\
        See 'stagegraph <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Project configuration file (default: .stagegraph.yaml)
    #[clap(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write an example pipeline definition
    Init {
        /// Overwrite existing files
        #[clap(short, long)]
        force: bool,
    },

    /// Validate a pipeline definition
    Validate {
        /// Pipeline definition (default: Jenkinsfile.yaml)
        file: Option<PathBuf>,
    },

    /// Compile a pipeline definition into descriptors
    Compile {
        /// Pipeline definition (default: Jenkinsfile.yaml)
        file: Option<PathBuf>,

        /// Pipeline identifier
        #[clap(long = "pipeline", value_name = "ID")]
        pipeline_id: Option<String>,

        /// Build identifier
        #[clap(long = "build", value_name = "ID")]
        build_id: Option<String>,

        /// Namespace of the emitted descriptors
        #[clap(short, long)]
        namespace: Option<String>,

        /// Name suffix (random if not given)
        #[clap(long)]
        suffix: Option<String>,

        /// Output format
        #[clap(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Write to a file instead of stdout
        #[clap(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Show the compiled task graph
    Graph {
        /// Pipeline definition (default: Jenkinsfile.yaml)
        file: Option<PathBuf>,

        /// Output format
        #[clap(short, long, value_enum, default_value_t = GraphFormat::Text)]
        format: GraphFormat,
    },
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
}

/// Project settings shared by the command handlers
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: ProjectConfig,
}

impl Project {
    /// Load the project configuration from `root`, or from an explicit file
    pub fn load(root: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(miette::miette!(
                        "Configuration file not found: {}",
                        path.display()
                    ));
                }
                ProjectConfig::load(path)?
            }
            None => ProjectConfig::load_from_project(root)?,
        };

        debug!(?config, "loaded project configuration");

        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    /// The pipeline definition to use: explicit path, else the configured one
    pub fn pipeline_path(&self, file: Option<PathBuf>) -> PathBuf {
        file.unwrap_or_else(|| self.config.pipeline_path(&self.root))
    }
}

/// Load the project from the current directory
pub(crate) fn current_project(config_path: Option<&Path>) -> Result<Project> {
    let cwd = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
    Project::load(&cwd, config_path)
}

/// Parse a pipeline definition, printing a recovery hint on failure
pub(crate) fn load_definition(path: &Path) -> Result<PipelineDefinition> {
    PipelineDefinition::from_file(path).map_err(|e| {
        print_suggestion(&e);
        e.into()
    })
}

/// Print the recovery suggestion for `error`, if it has one
pub(crate) fn print_suggestion(error: &StagegraphError) {
    if let Some(suggestion) = error.suggestion() {
        eprintln!();
        eprintln!("{}", suggestion.to_string().yellow());
    }
}

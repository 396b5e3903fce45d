// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Graph command - visualize the compiled task graph

use miette::Result;
use std::path::PathBuf;

use super::{current_project, load_definition, print_suggestion, GraphFormat};
use crate::pipeline::{compile, PipelineGraph};

/// Run the graph command
pub async fn run(
    file: Option<PathBuf>,
    format: GraphFormat,
    config: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    let project = current_project(config.as_deref())?;
    let path = project.pipeline_path(file);
    let definition = load_definition(&path)?;

    // Fixed suffix so repeated runs draw the same graph
    let config = &project.config;
    let compiled = compile(&definition, &config.pipeline, &config.build, &config.namespace, "graph")
        .map_err(|e| {
            print_suggestion(&e);
            e
        })?;

    let graph = PipelineGraph::from_pipeline(&compiled.pipeline);

    let output = match format {
        GraphFormat::Text => graph.to_text()?,
        GraphFormat::Dot => graph.to_dot(),
        GraphFormat::Mermaid => graph.to_mermaid(),
    };

    print!("{}", output);

    if verbose {
        eprintln!(
            "{} task(s) in {}",
            graph.task_count(),
            compiled.pipeline.name()
        );
    }

    Ok(())
}

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Compile command - emit pipeline and task descriptors

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;
use tracing::info;

use super::{current_project, load_definition, print_suggestion};
use crate::config::OutputFormat;
use crate::pipeline::{compile, CompiledPipeline};
use crate::StagegraphError;

/// Arguments of the compile command; unset values come from the project
/// configuration
#[derive(Debug, Clone, Default)]
pub struct CompileArgs {
    pub file: Option<PathBuf>,
    pub pipeline_id: Option<String>,
    pub build_id: Option<String>,
    pub namespace: Option<String>,
    pub suffix: Option<String>,
    pub format: Option<OutputFormat>,
    pub output: Option<PathBuf>,
}

/// Run the compile command
pub async fn run(args: CompileArgs, config: Option<PathBuf>, verbose: bool) -> Result<()> {
    let project = current_project(config.as_deref())?;
    let path = project.pipeline_path(args.file);
    let definition = load_definition(&path)?;

    let config = project.config;
    let pipeline_id = args.pipeline_id.unwrap_or(config.pipeline);
    let build_id = args.build_id.unwrap_or(config.build);
    let namespace = args.namespace.unwrap_or(config.namespace);
    let suffix = args.suffix.unwrap_or_default();
    let format = args.format.unwrap_or(config.output);

    let compiled = compile(&definition, &pipeline_id, &build_id, &namespace, &suffix)
        .map_err(|e| {
            print_suggestion(&e);
            e
        })?;

    let rendered = render(&compiled, format)?;

    match args.output {
        Some(output) => {
            tokio::fs::write(&output, &rendered)
                .await
                .map_err(|e| StagegraphError::FileWriteError {
                    path: output.clone(),
                    error: e.to_string(),
                })?;

            info!(path = %output.display(), "wrote compiled pipeline");
            eprintln!(
                "  {} Wrote {} with {} task(s) to {}",
                "✓".green(),
                compiled.pipeline.name().cyan(),
                compiled.tasks.len(),
                output.display()
            );
        }
        None => print!("{}", rendered),
    }

    if verbose {
        eprintln!();
        eprintln!("{}:", "Tasks".bold());
        for pt in &compiled.pipeline.spec.tasks {
            eprintln!("  {} {}", "→".blue(), pt.task_ref.name);
        }
    }

    Ok(())
}

fn render(compiled: &CompiledPipeline, format: OutputFormat) -> Result<String, StagegraphError> {
    match format {
        OutputFormat::Yaml => compiled.to_yaml(),
        OutputFormat::Json => compiled.to_json().map(|mut json| {
            json.push('\n');
            json
        }),
    }
}

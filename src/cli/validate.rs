// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Validate command - check a pipeline definition

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::{current_project, load_definition};
use crate::pipeline::{compile, PipelineDefinition, PipelineValidator, Stage};
use crate::utils::{print_error, print_section, print_success, print_warning};

/// Run the validate command
pub async fn run(file: Option<PathBuf>, config: Option<PathBuf>, verbose: bool) -> Result<()> {
    let project = current_project(config.as_deref())?;
    let path = project.pipeline_path(file);

    println!("{}", "Validating pipeline...".bold());
    println!();

    let definition = match load_definition(&path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("  {} Failed to parse {}", "✗".red(), path.display());
            eprintln!();
            return Err(e);
        }
    };

    print_success("Pipeline file is valid YAML");

    if let Err(errors) = PipelineValidator::validate(&definition) {
        print_section("Errors");
        for error in errors.iter() {
            for field in &error.paths {
                print_error(&format!("{}: {}", field.to_string().cyan(), error.message));
            }
        }
        println!();
        return Err(miette::miette!(
            "Pipeline validation failed with {} error(s)",
            errors.len()
        ));
    }

    print_success("Pipeline structure is valid");

    // Valid definitions can still use settings the compiler rejects
    let config = &project.config;
    let warning = compile(&definition, &config.pipeline, &config.build, &config.namespace, "check")
        .err()
        .and_then(|e| e.unsupported_feature());

    if let Some(feature) = &warning {
        print_section("Warnings");
        print_warning(&feature.to_string());
    }

    if verbose {
        print_section("Pipeline summary");
        println!("  API version: {}", definition.api_version);
        for line in stage_outline(&definition) {
            println!("  {}", line);
        }
    }

    println!();
    if warning.is_some() {
        println!("{}", "Pipeline is valid but cannot be compiled yet.".yellow().bold());
    } else {
        println!("{}", "Pipeline is valid!".green().bold());
    }

    Ok(())
}

/// Indented outline of the stage tree
fn stage_outline(definition: &PipelineDefinition) -> Vec<String> {
    fn walk(stage: &Stage, indent: usize, out: &mut Vec<String>) {
        let detail = if !stage.steps.is_empty() {
            format!("{} step(s)", stage.steps.len())
        } else if !stage.parallel.is_empty() {
            "parallel".to_string()
        } else {
            "sequential".to_string()
        };
        let workspace = stage
            .options
            .workspace
            .as_deref()
            .map(|w| format!(" [workspace: {}]", w))
            .unwrap_or_default();

        out.push(format!("{}- {} ({}){}", "  ".repeat(indent), stage.name, detail, workspace));

        for nested in stage.stages.iter().chain(&stage.parallel) {
            walk(nested, indent + 1, out);
        }
    }

    let mut out = Vec::new();
    for stage in &definition.stages {
        walk(stage, 0, &mut out);
    }
    out
}

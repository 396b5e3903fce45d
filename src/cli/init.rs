// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Init command - write an example pipeline definition

use colored::Colorize;
use miette::Result;
use std::path::Path;

use crate::config::{generate_default_config, CONFIG_FILE_NAME};
use crate::pipeline::PIPELINE_FILE_NAME;
use crate::utils::print_success;
use crate::StagegraphError;

/// Run the init command
pub async fn run(force: bool, verbose: bool) -> Result<()> {
    println!("{}", "Initializing stagegraph project...".bold());
    println!();

    let pipeline_path = Path::new(PIPELINE_FILE_NAME);
    if pipeline_path.exists() && !force {
        return Err(miette::miette!(
            "{} already exists. Use --force to overwrite.",
            PIPELINE_FILE_NAME
        ));
    }

    let pipeline_content = generate_example_pipeline();
    write_file(pipeline_path, &pipeline_content).await?;
    print_success(&format!("Created {}", PIPELINE_FILE_NAME));

    let config_path = Path::new(CONFIG_FILE_NAME);
    if !config_path.exists() || force {
        write_file(config_path, &generate_default_config()).await?;
        print_success(&format!("Created {}", CONFIG_FILE_NAME));
    }

    println!();
    println!("{}", "Project initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to define your stages", PIPELINE_FILE_NAME.cyan());
    println!("  2. Run {} to check it", "stagegraph validate".cyan());
    println!("  3. Run {} to emit the descriptors", "stagegraph compile".cyan());
    println!();

    if verbose {
        println!("{}", "Generated pipeline:".dimmed());
        println!("{}", "─".repeat(50).dimmed());
        println!("{}", pipeline_content.dimmed());
    }

    Ok(())
}

async fn write_file(path: &Path, content: &str) -> Result<(), StagegraphError> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| StagegraphError::FileWriteError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
}

fn generate_example_pipeline() -> String {
    r#"# stagegraph pipeline definition
apiVersion: v0.1

agent:
  image: alpine:3

environment:
  - name: CI
    value: "true"

stages:
  - name: Build
    steps:
      - command: make
        args: ["build"]

  - name: Checks
    parallel:
      - name: Unit Tests
        steps:
          - command: make
            args: ["test"]
      - name: Lint
        agent:
          image: golangci/golangci-lint
        steps:
          - command: golangci-lint
            args: ["run"]

  # A named workspace is handed to the next stage using the same name
  - name: Package
    options:
      workspace: release
    steps:
      - command: make
        args: ["package"]
"#
    .to_string()
}

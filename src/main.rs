// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! stagegraph - declarative pipeline compiler
//!
//! Compile Jenkinsfile.yaml stage trees into task graph descriptors.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stagegraph::cli::{compile::CompileArgs, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "stagegraph=debug"
    } else {
        "stagegraph=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Init { force } => stagegraph::cli::init::run(force, cli.verbose).await,
        Commands::Validate { file } => {
            stagegraph::cli::validate::run(file, cli.config, cli.verbose).await
        }
        Commands::Compile {
            file,
            pipeline_id,
            build_id,
            namespace,
            suffix,
            format,
            output,
        } => {
            let args = CompileArgs {
                file,
                pipeline_id,
                build_id,
                namespace,
                suffix,
                format,
                output,
            };
            stagegraph::cli::compile::run(args, cli.config, cli.verbose).await
        }
        Commands::Graph { file, format } => {
            stagegraph::cli::graph::run(file, format, cli.config, cli.verbose).await
        }
    }
}

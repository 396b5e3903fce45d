// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

use std::path::Path;

use super::{UnsupportedFeature, ValidationError};

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest creating a pipeline file
    pub fn create_pipeline(path: &Path) -> Self {
        Self {
            action: "Create a pipeline definition".into(),
            steps: vec![
                format!("No pipeline definition found at {}", path.display()),
                "Generate an example or pass the path of an existing file".into(),
            ],
            commands: vec![
                "# Write an example Jenkinsfile.yaml:".into(),
                "stagegraph init".into(),
                "".into(),
                "# Or point at an existing file:".into(),
                "stagegraph validate path/to/Jenkinsfile.yaml".into(),
            ],
        }
    }

    /// Suggest fixing invalid YAML
    pub fn fix_yaml_syntax(line: Option<usize>, column: Option<usize>) -> Self {
        let location = match (line, column) {
            (Some(l), Some(c)) => format!(" at line {}, column {}", l, c),
            (Some(l), None) => format!(" at line {}", l),
            _ => String::new(),
        };

        Self {
            action: format!("Fix YAML syntax error{}", location),
            steps: vec![
                "Check for common YAML issues:".into(),
                "  • Incorrect indentation (use spaces, not tabs)".into(),
                "  • A stage with 'steps', 'stages' and 'parallel' keys misplaced".into(),
                "  • Unquoted special characters in commands or args".into(),
                "  • Environment entries that are not {name, value} pairs".into(),
            ],
            commands: vec![],
        }
    }

    /// Point at every field that failed validation
    pub fn fix_validation(error: &ValidationError) -> Self {
        let steps = error
            .iter()
            .flat_map(|e| {
                e.paths
                    .iter()
                    .map(move |p| format!("{}: {}", p, e.message))
            })
            .collect();

        Self {
            action: format!("Fix {} invalid field(s)", error.len()),
            steps,
            commands: vec![
                "# Re-check after editing:".into(),
                "stagegraph validate".into(),
            ],
        }
    }

    /// Explain how to get past a setting the compiler rejects
    pub fn remove_unsupported(feature: UnsupportedFeature) -> Self {
        let step = match feature {
            UnsupportedFeature::StagePost | UnsupportedFeature::RootPost => {
                "Remove the 'post' section; post conditions cannot be compiled into tasks yet"
            }
            UnsupportedFeature::StageTimeout
            | UnsupportedFeature::StageRetry
            | UnsupportedFeature::StageStash
            | UnsupportedFeature::StageUnstash => {
                "Remove timeout, retry, stash and unstash from the stage 'options'; only 'workspace' is compiled"
            }
            UnsupportedFeature::RootOptions => {
                "Remove the top-level 'options' section; root timeout and retry cannot be compiled yet"
            }
            UnsupportedFeature::SyntacticSugarStep => {
                "Replace 'step:' entries with 'command:' steps"
            }
            UnsupportedFeature::EmptyStage => {
                "Give the stage 'steps', 'stages' or 'parallel'"
            }
        };

        Self {
            action: format!("Rework the pipeline: {}", feature),
            steps: vec![step.into()],
            commands: vec![],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Pipeline validation
//!
//! Validates a pipeline definition before compilation. Structural checks
//! stop at the first failure; the stage name uniqueness check runs over the
//! whole tree and reports every collision.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use tracing::debug;

use crate::errors::{FieldError, FieldPath, ValidationError};
use crate::pipeline::label::{mangle, MAX_LABEL_LENGTH};
use crate::pipeline::transform::{pipeline_task_name, task_name, TransformContext};
use crate::pipeline::{
    Agent, PipelineDefinition, RootOptions, Stage, StageOptions, Step, Timeout, TimeoutUnit,
};

static API_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^v\d+\.\d+").expect("apiVersion pattern is valid"));

static HAS_ASCII_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]").expect("stage name pattern is valid"));

static SUFFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+$").expect("suffix pattern is valid"));

/// Pipeline validator
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate a pipeline definition
    pub fn validate(definition: &PipelineDefinition) -> Result<(), ValidationError> {
        debug!(stages = definition.stages.len(), "validating pipeline definition");

        Self::validate_structure(definition)?;
        Self::validate_unique_names(definition)
    }

    fn validate_structure(definition: &PipelineDefinition) -> Result<(), FieldError> {
        validate_api_version(&definition.api_version)?;
        validate_agent(&definition.agent).map_err(|e| e.via_field("agent"))?;
        validate_stages(&definition.stages, &definition.agent)?;
        validate_root_options(&definition.options).map_err(|e| e.via_field("options"))
    }

    /// Stage names must stay distinct once turned into labels: `Build` and
    /// `build` are the same task as far as the cluster is concerned
    fn validate_unique_names(definition: &PipelineDefinition) -> Result<(), ValidationError> {
        let stages = named_stages(definition);
        into_result(distinct_by(&stages, |stage| {
            mangle(&stage.name, "").trim_end_matches('-').to_string()
        }))
    }

    /// Check the names a compilation with `ctx` would generate.
    ///
    /// Long names sharing a prefix only collide once the pipeline and build
    /// ids are prepended, so this runs with the final context.
    pub fn validate_task_names(
        definition: &PipelineDefinition,
        ctx: &TransformContext<'_>,
    ) -> Result<(), ValidationError> {
        let leaves: Vec<_> = named_stages(definition)
            .into_iter()
            .filter(|(stage, _)| !stage.steps.is_empty())
            .collect();

        let mut errors = distinct_by(&leaves, |stage| task_name(ctx, &stage.name));
        if errors.is_empty() {
            errors = distinct_by(&leaves, |stage| pipeline_task_name(&stage.name, ctx.suffix));
        }
        into_result(errors)
    }

    /// A caller-supplied name suffix must be usable inside a DNS label
    pub fn validate_suffix(suffix: &str) -> Result<(), ValidationError> {
        if SUFFIX.is_match(suffix) && suffix.len() <= MAX_LABEL_LENGTH - 2 {
            Ok(())
        } else {
            Err(FieldError::new(
                format!(
                    "Invalid suffix '{}': must be 1 to {} lowercase letters or digits",
                    suffix,
                    MAX_LABEL_LENGTH - 2
                ),
                "suffix",
            )
            .into())
        }
    }
}

/// Every stage with the path of its `name` field, parents before children
fn named_stages(definition: &PipelineDefinition) -> Vec<(&Stage, FieldPath)> {
    fn collect<'a>(
        stages: &'a [Stage],
        field: &str,
        parent: &FieldPath,
        out: &mut Vec<(&'a Stage, FieldPath)>,
    ) {
        for (i, stage) in stages.iter().enumerate() {
            let path = parent.index(field, i);
            out.push((stage, path.child("name")));
            collect(&stage.stages, "stages", &path, out);
            collect(&stage.parallel, "parallel", &path, out);
        }
    }

    let mut out = Vec::new();
    collect(&definition.stages, "stages", &FieldPath::default(), &mut out);
    out
}

/// One error per group of stages sharing a key, in first-seen order
fn distinct_by(
    stages: &[(&Stage, FieldPath)],
    key: impl Fn(&Stage) -> String,
) -> Vec<FieldError> {
    let mut groups: Vec<(String, Vec<&str>, Vec<FieldPath>)> = Vec::new();
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for (stage, path) in stages {
        let label = key(stage);
        let idx = *by_key.entry(label.clone()).or_insert_with(|| {
            groups.push((label, Vec::new(), Vec::new()));
            groups.len() - 1
        });
        groups[idx].1.push(&stage.name);
        groups[idx].2.push(path.clone());
    }

    groups
        .into_iter()
        .filter(|(_, names, _)| names.len() > 1)
        .map(|(label, names, paths)| {
            let message = if names.iter().all(|n| *n == names[0]) {
                format!(
                    "Stage names must be unique: '{}' is used more than once",
                    names[0]
                )
            } else {
                let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
                format!(
                    "Stage names must map to distinct task names: {} all become '{}'",
                    quoted.join(", "),
                    label
                )
            };
            FieldError { message, paths }
        })
        .collect()
}

fn into_result(errors: Vec<FieldError>) -> Result<(), ValidationError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError { errors })
    }
}

fn validate_api_version(api_version: &str) -> Result<(), FieldError> {
    if API_VERSION.is_match(api_version) {
        Ok(())
    } else {
        Err(FieldError::new(
            "Invalid apiVersion format: must be 'v(digits).(digits)'",
            "apiVersion",
        ))
    }
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

fn validate_agent(agent: &Agent) -> Result<(), FieldError> {
    // Blank agents inherit, so only "both set" can be wrong here
    if is_set(&agent.label) && is_set(&agent.image) {
        return Err(FieldError::multiple_one_of(&["label", "image"]));
    }

    Ok(())
}

fn validate_stages(stages: &[Stage], parent_agent: &Agent) -> Result<(), FieldError> {
    if stages.is_empty() {
        return Err(FieldError::missing_field("stages"));
    }

    for (i, stage) in stages.iter().enumerate() {
        validate_stage(stage, parent_agent).map_err(|e| e.via_field_index("stages", i))?;
    }

    Ok(())
}

fn validate_stage(stage: &Stage, parent_agent: &Agent) -> Result<(), FieldError> {
    const BODY_FIELDS: [&str; 3] = ["steps", "stages", "parallel"];

    let populated = [
        !stage.steps.is_empty(),
        !stage.stages.is_empty(),
        !stage.parallel.is_empty(),
    ]
    .into_iter()
    .filter(|set| *set)
    .count();

    if populated == 0 {
        return Err(FieldError::missing_one_of(&BODY_FIELDS));
    }

    if !HAS_ASCII_LETTER.is_match(&stage.name) {
        return Err(FieldError::new(
            "Stage name must contain at least one ASCII letter",
            "name",
        ));
    }

    validate_agent(&stage.agent).map_err(|e| e.via_field("agent"))?;

    let agent = stage.agent.or_inherit(parent_agent);
    if agent.is_empty() {
        return Err(FieldError::new(
            "No agent specified for stage or for its parent(s)",
            "agent",
        ));
    }

    if populated > 1 {
        return Err(FieldError::multiple_one_of(&BODY_FIELDS));
    }

    for (i, step) in stage.steps.iter().enumerate() {
        validate_step(step).map_err(|e| e.via_field_index("steps", i))?;
    }

    for (i, nested) in stage.stages.iter().enumerate() {
        validate_stage(nested, agent).map_err(|e| e.via_field_index("stages", i))?;
    }

    for (i, branch) in stage.parallel.iter().enumerate() {
        validate_stage(branch, agent).map_err(|e| e.via_field_index("parallel", i))?;
    }

    validate_stage_options(&stage.options).map_err(|e| e.via_field("options"))
}

fn validate_step(step: &Step) -> Result<(), FieldError> {
    let has_command = is_set(&step.command);
    let has_step = is_set(&step.step);

    match (has_command, has_step) {
        (false, false) => return Err(FieldError::missing_one_of(&["command", "step"])),
        (true, true) => return Err(FieldError::multiple_one_of(&["command", "step"])),
        _ => {}
    }

    if has_command && !step.options.is_empty() {
        return Err(FieldError::new("Cannot set options for a command", "options"));
    }

    if has_step && !step.arguments.is_empty() {
        return Err(FieldError::new(
            "Cannot set command-line arguments for a step",
            "args",
        ));
    }

    validate_agent(&step.agent).map_err(|e| e.via_field("agent"))
}

fn validate_root_options(options: &RootOptions) -> Result<(), FieldError> {
    if let Some(timeout) = options.timeout.as_ref().filter(|t| !t.is_empty()) {
        validate_timeout(timeout).map_err(|e| e.via_field("timeout"))?;
    }

    if options.retry < 0 {
        return Err(FieldError::new("Retry count cannot be negative", "retry"));
    }

    Ok(())
}

fn validate_stage_options(options: &StageOptions) -> Result<(), FieldError> {
    if let Some(stash) = options.stash.as_ref().filter(|s| **s != Default::default()) {
        if stash.name.is_empty() {
            return Err(FieldError::new("The stash name must be provided", "name").via_field("stash"));
        }
        if stash.files.is_empty() {
            return Err(FieldError::new("files to stash must be provided", "files").via_field("stash"));
        }
    }

    if let Some(unstash) = options.unstash.as_ref().filter(|u| **u != Default::default()) {
        if unstash.name.is_empty() {
            return Err(
                FieldError::new("The unstash name must be provided", "name").via_field("unstash"),
            );
        }
    }

    if options.workspace.as_deref() == Some("") {
        return Err(FieldError::new(
            "The workspace name must be unspecified or non-empty",
            "workspace",
        ));
    }

    validate_root_options(&options.root)
}

fn validate_timeout(timeout: &Timeout) -> Result<(), FieldError> {
    if timeout.unit.parse::<TimeoutUnit>().is_err() {
        let valid: Vec<&str> = TimeoutUnit::ALL.iter().map(TimeoutUnit::as_str).collect();
        return Err(FieldError::new(
            format!(
                "{} is not a valid time unit. Valid time units are {}",
                timeout.unit,
                valid.join(", ")
            ),
            "unit",
        ));
    }

    if timeout.time < 1 {
        return Err(FieldError::new("Timeout must be greater than zero", "time"));
    }

    Ok(())
}

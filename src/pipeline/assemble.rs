// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Pipeline assembly and the `compile` entry point

use rand::RngCore;
use serde::Serialize;
use tracing::{debug, info};

use crate::crd::{Pipeline, Task};
use crate::errors::{StagegraphResult, UnsupportedFeature};
use crate::pipeline::resolve::resolve;
use crate::pipeline::transform::{transform, StageTree, TransformContext};
use crate::pipeline::{PipelineDefinition, PipelineValidator};

/// Number of random bytes in a generated suffix
const SUFFIX_BYTES: usize = 3;

/// The output of a successful compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledPipeline {
    pub pipeline: Pipeline,
    /// One task per leaf stage, in depth-first order
    pub tasks: Vec<Task>,
}

impl CompiledPipeline {
    /// The pipeline followed by every task, as a multi-document YAML stream
    pub fn to_yaml(&self) -> StagegraphResult<String> {
        let mut out = serde_yaml::to_string(&self.pipeline)?;
        for task in &self.tasks {
            out.push_str("---\n");
            out.push_str(&serde_yaml::to_string(task)?);
        }
        Ok(out)
    }

    /// `{"pipeline": ..., "tasks": [...]}`
    pub fn to_json(&self) -> StagegraphResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}

/// Collect the resolved leaves of `tree` into descriptors
pub fn assemble(tree: &StageTree<'_>, ctx: &TransformContext<'_>) -> CompiledPipeline {
    let mut pipeline = Pipeline::new(
        format!("{}-build-{}-{}", ctx.pipeline_id, ctx.build_id, ctx.suffix),
        ctx.namespace,
    );
    let mut tasks = Vec::new();

    for leaf in tree.leaves() {
        let node = tree.node(leaf);
        if let Some(task) = node.task() {
            tasks.push(task.clone());
        }
        if let Some(pipeline_task) = &node.pipeline_task {
            pipeline.spec.tasks.push(pipeline_task.clone());
        }
    }

    CompiledPipeline { pipeline, tasks }
}

/// Compile a pipeline definition, generating a suffix if `suffix` is empty.
///
/// A given suffix must be lowercase alphanumeric so every generated name
/// stays a DNS label.
pub fn compile(
    definition: &PipelineDefinition,
    pipeline_id: &str,
    build_id: &str,
    namespace: &str,
    suffix: &str,
) -> StagegraphResult<CompiledPipeline> {
    compile_with(
        definition,
        pipeline_id,
        build_id,
        namespace,
        suffix,
        &mut rand::thread_rng(),
    )
}

/// [`compile`] with an explicit random source for suffix generation
pub fn compile_with<R: RngCore + ?Sized>(
    definition: &PipelineDefinition,
    pipeline_id: &str,
    build_id: &str,
    namespace: &str,
    suffix: &str,
    rng: &mut R,
) -> StagegraphResult<CompiledPipeline> {
    PipelineValidator::validate(definition)?;
    if !suffix.is_empty() {
        PipelineValidator::validate_suffix(suffix)?;
    }

    if !definition.post.is_empty() {
        return Err(UnsupportedFeature::RootPost.into());
    }
    if !definition.options.is_empty() {
        return Err(UnsupportedFeature::RootOptions.into());
    }

    let suffix = if suffix.is_empty() {
        generate_suffix(rng)
    } else {
        suffix.to_string()
    };

    let ctx = TransformContext {
        pipeline_id,
        build_id,
        namespace,
        suffix: &suffix,
    };
    PipelineValidator::validate_task_names(definition, &ctx)?;

    let mut tree = transform(definition, &ctx)?;
    debug!(nodes = tree.len(), "transformed stage tree");

    resolve(&mut tree, &suffix);
    let compiled = assemble(&tree, &ctx);

    info!(
        pipeline = %compiled.pipeline.name(),
        tasks = compiled.tasks.len(),
        "compiled pipeline"
    );

    Ok(compiled)
}

/// Short lowercase hex string
fn generate_suffix<R: RngCore + ?Sized>(rng: &mut R) -> String {
    let mut bytes = [0u8; SUFFIX_BYTES];
    rng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::EnvVar;
    use crate::errors::StagegraphError;
    use rand::rngs::mock::StepRng;

    fn compile_yaml(yaml: &str) -> StagegraphResult<CompiledPipeline> {
        let definition = PipelineDefinition::from_yaml(yaml)?;
        compile(&definition, "somepipeline", "somebuild", "somenamespace", "abcd")
    }

    fn unsupported(result: StagegraphResult<CompiledPipeline>) -> UnsupportedFeature {
        result
            .expect_err("expected compilation to fail")
            .unsupported_feature()
            .expect("expected an unsupported feature")
    }

    #[test]
    fn test_simple_pipeline() {
        let compiled = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: A Working Stage
    steps:
      - command: echo
        args:
          - hello
          - world
"#,
        )
        .unwrap();

        assert_eq!(compiled.pipeline.name(), "somepipeline-build-somebuild-abcd");
        assert_eq!(compiled.pipeline.metadata.namespace, "somenamespace");
        assert_eq!(compiled.pipeline.spec.resources.len(), 2);

        assert_eq!(compiled.tasks.len(), 1);
        let task = &compiled.tasks[0];
        assert_eq!(task.name(), "somepipeline-build-somebuild-stage-a-working-stage-abcd");
        assert_eq!(task.workspace_path(), Some("workspace"));
        assert_eq!(task.spec.steps[0].name, "stage-a-working-stage-step-0-abcd");
        assert_eq!(task.spec.steps[0].args, vec!["hello", "world"]);

        let pt = &compiled.pipeline.spec.tasks[0];
        assert_eq!(pt.task_ref.name, task.name());
        assert!(pt.workspace_providers().is_empty());
        assert!(pt.ordering_providers().is_empty());
    }

    #[test]
    fn test_multiple_stages() {
        let compiled = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: A Working Stage
    steps:
      - command: echo
        args: ['hello', 'world']
  - name: Another stage
    steps:
      - command: echo
        args: ['again']
"#,
        )
        .unwrap();

        let first = "somepipeline-build-somebuild-stage-a-working-stage-abcd";
        let second = "somepipeline-build-somebuild-stage-another-stage-abcd";

        let names: Vec<&str> = compiled.tasks.iter().map(Task::name).collect();
        assert_eq!(names, vec![first, second]);
        assert_eq!(compiled.tasks[1].workspace_path(), None);

        let pt = compiled.pipeline.task_for(second).unwrap();
        assert_eq!(pt.name, "another-stage-abcd");
        assert_eq!(pt.workspace_providers(), [first.to_string()]);
        assert_eq!(pt.ordering_providers(), [first.to_string()]);
    }

    #[test]
    fn test_nested_stages() {
        let compiled = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: Parent Stage
    stages:
      - name: A Working Stage
        steps:
          - command: echo
            args: ['hello', 'world']
      - name: Another stage
        steps:
          - command: echo
            args: ['again']
"#,
        )
        .unwrap();

        assert_eq!(compiled.tasks.len(), 2);
        assert_eq!(compiled.tasks[0].workspace_path(), Some("workspace"));
        assert_eq!(compiled.tasks[1].workspace_path(), None);

        let pt = &compiled.pipeline.spec.tasks[1];
        assert_eq!(pt.workspace_providers(), [compiled.tasks[0].name().to_string()]);
        assert_eq!(pt.ordering_providers(), [compiled.tasks[0].name().to_string()]);
    }

    #[test]
    fn test_parallel_stages() {
        let compiled = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: First
    steps:
      - command: make
  - name: Checks
    parallel:
      - name: Lint
        steps:
          - command: lint
      - name: Test
        steps:
          - command: test
  - name: Publish
    steps:
      - command: publish
"#,
        )
        .unwrap();

        let names: Vec<String> = compiled.tasks.iter().map(|t| t.name().to_string()).collect();
        let publish = compiled.pipeline.spec.tasks.last().unwrap();
        assert_eq!(publish.ordering_providers(), &names[1..3]);
        assert_eq!(publish.workspace_providers(), &names[0..1]);
    }

    #[test]
    fn test_environment_at_top_and_in_stage() {
        let compiled = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
environment:
  - name: SOME_VAR
    value: A value for the env var
stages:
  - name: A stage with environment
    environment:
      - name: SOME_OTHER_VAR
        value: A value for the other env var
    steps:
      - command: echo
        args: ['hello', '${SOME_OTHER_VAR}']
"#,
        )
        .unwrap();

        let task = &compiled.tasks[0];
        assert_eq!(task.name(), "somepipeline-build-somebuild-stage-a-stage-with-environmen-abcd");
        assert_eq!(
            task.spec.steps[0].env,
            vec![
                EnvVar {
                    name: "SOME_OTHER_VAR".into(),
                    value: "A value for the other env var".into(),
                },
                EnvVar {
                    name: "SOME_VAR".into(),
                    value: "A value for the env var".into(),
                },
            ]
        );
    }

    #[test]
    fn test_stage_and_step_agent() {
        let compiled = compile_yaml(
            r#"
apiVersion: v0.1
stages:
  - name: A Working Stage
    agent:
      image: some-image
    steps:
      - command: echo
        args: ['hello', 'world']
        agent:
          image: some-other-image
      - command: echo
        args: ['goodbye']
"#,
        )
        .unwrap();

        let images: Vec<&str> = compiled.tasks[0].spec.steps.iter().map(|s| s.image.as_str()).collect();
        assert_eq!(images, vec!["some-other-image", "some-image"]);
    }

    #[test]
    fn test_mangled_task_names() {
        let compiled = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: ". -a- ."
    steps:
      - command: ls
  - name: Wööh!!!! - This is cool.
    steps:
      - command: ls
"#,
        )
        .unwrap();

        let names: Vec<&str> = compiled.tasks.iter().map(Task::name).collect();
        assert_eq!(
            names,
            vec![
                "somepipeline-build-somebuild-stage-a-abcd",
                "somepipeline-build-somebuild-stage-wh-this-is-cool-abcd",
            ]
        );
    }

    #[test]
    fn test_syntactic_sugar_step() {
        let result = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: A Working Stage
    steps:
      - step: some-step
        options:
          firstParam: some value
      - command: echo
"#,
        );

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "syntactic sugar steps not yet supported");
    }

    #[test]
    fn test_post_on_stage() {
        let result = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: A Working Stage
    steps:
      - command: echo
    post:
      - condition: success
        actions:
          - name: mail
            options:
              to: foo@bar.com
"#,
        );

        assert_eq!(unsupported(result), UnsupportedFeature::StagePost);
    }

    #[test]
    fn test_post_at_top_level() {
        let result = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: A Working Stage
    steps:
      - command: echo
post:
  - condition: always
    actions:
      - name: junit
"#,
        );

        assert_eq!(unsupported(result), UnsupportedFeature::RootPost);
    }

    #[test]
    fn test_top_level_and_stage_options() {
        let result = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
options:
  timeout:
    time: 50
    unit: minutes
  retry: 3
stages:
  - name: A Working Stage
    options:
      timeout:
        time: 5
        unit: seconds
    steps:
      - command: echo
"#,
        );

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "options at top level not yet supported");
    }

    #[test]
    fn test_top_level_timeout_only_rejected() {
        let result = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
options:
  timeout:
    time: 10
    unit: minutes
stages:
  - name: Build
    steps:
      - command: make
"#,
        );

        assert_eq!(unsupported(result), UnsupportedFeature::RootOptions);
    }

    #[test]
    fn test_top_level_retry_only_rejected() {
        let result = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
options:
  retry: 2
stages:
  - name: Build
    steps:
      - command: make
"#,
        );

        assert_eq!(unsupported(result), UnsupportedFeature::RootOptions);
    }

    #[test]
    fn test_stage_timeout_short_circuits() {
        let result = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: Fine
    steps:
      - command: make
  - name: Slow
    options:
      timeout:
        time: 10
        unit: minutes
    steps:
      - command: make
"#,
        );

        assert_eq!(unsupported(result), UnsupportedFeature::StageTimeout);
    }

    #[test]
    fn test_validation_runs_first() {
        let result = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
post:
  - condition: always
    actions:
      - name: junit
stages:
  - name: Same
    steps:
      - command: make
  - name: Same
    steps:
      - command: make
"#,
        );

        assert!(matches!(result, Err(StagegraphError::Validation(_))));
    }

    #[test]
    fn test_case_collision_rejected_before_any_task_is_built() {
        let result = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: Build
    steps:
      - command: make
  - name: build
    steps:
      - command: make
"#,
        );

        match result {
            Err(StagegraphError::Validation(err)) => {
                let paths: Vec<String> = err.errors[0].paths.iter().map(ToString::to_string).collect();
                assert_eq!(paths, vec!["stages[0].name", "stages[1].name"]);
            }
            other => panic!("expected a validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_prefix_truncation_collision_rejected() {
        let definition = PipelineDefinition::from_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: Integration tests for the storage layer
    steps:
      - command: make
  - name: Integration tests for the network layer
    steps:
      - command: make
"#,
        )
        .unwrap();

        let err = compile(&definition, "somepipeline", "somebuild", "somenamespace", "abcd")
            .expect_err("task names collide once prefixed");
        assert!(matches!(err, StagegraphError::Validation(_)));

        // Shorter ids leave room for the distinguishing part of the names
        let compiled = compile(&definition, "p", "1", "ns", "abcd").unwrap();
        let second = &compiled.pipeline.spec.tasks[1];
        assert_ne!(second.task_ref.name, compiled.tasks[0].name());
        assert_eq!(second.ordering_providers(), [compiled.pipeline.spec.tasks[0].name.clone()]);
    }

    #[test]
    fn test_invalid_suffix_rejected() {
        let definition = PipelineDefinition::from_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: Build
    steps:
      - command: make
"#,
        )
        .unwrap();

        for suffix in ["ABC_1", "ab-cd"] {
            match compile(&definition, "p", "b", "ns", suffix) {
                Err(StagegraphError::Validation(err)) => {
                    assert_eq!(err.errors[0].paths[0].to_string(), "suffix");
                }
                other => panic!("expected a validation error for {suffix}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_blank_agents_inherit() {
        let compiled = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: Inherits
    agent:
      label: ""
    steps:
      - command: echo
        agent:
          image: ""
"#,
        )
        .unwrap();

        assert_eq!(compiled.tasks[0].spec.steps[0].image, "some-image");
    }

    #[test]
    fn test_empty_stash_and_unstash_are_unset() {
        let compiled = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: Build
    options:
      stash: {}
      unstash: {}
    steps:
      - command: make
"#,
        )
        .unwrap();
        assert_eq!(compiled.tasks.len(), 1);

        let result = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: Build
    options:
      stash:
        name: out
        files: "dist/**"
    steps:
      - command: make
"#,
        );
        assert_eq!(unsupported(result), UnsupportedFeature::StageStash);
    }

    #[test]
    fn test_compile_is_idempotent() {
        let definition = PipelineDefinition::from_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: One
    steps:
      - command: make
  - name: Two
    parallel:
      - name: Left
        steps:
          - command: left
      - name: Right
        steps:
          - command: right
"#,
        )
        .unwrap();

        let first = compile(&definition, "p", "1", "ns", "abcd").unwrap();
        let second = compile(&definition, "p", "1", "ns", "abcd").unwrap();

        assert_eq!(first, second);
        assert_eq!(first.to_yaml().unwrap(), second.to_yaml().unwrap());
    }

    #[test]
    fn test_generated_suffix_from_rng() {
        let definition = PipelineDefinition::from_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: Build
    steps:
      - command: make
"#,
        )
        .unwrap();

        let mut rng = StepRng::new(0x000a_0b0c, 0);
        let compiled = compile_with(&definition, "p", "1", "ns", "", &mut rng).unwrap();

        assert_eq!(compiled.pipeline.name(), "p-build-1-0c0b0a");
        assert_eq!(compiled.tasks[0].name(), "p-build-1-stage-build-0c0b0a");
        assert_eq!(compiled.pipeline.spec.tasks[0].name, "build-0c0b0a");
    }

    #[test]
    fn test_random_suffix_is_hex() {
        let definition = PipelineDefinition::from_yaml(
            "apiVersion: v0.1\nagent:\n  image: i\nstages:\n  - name: Build\n    steps:\n      - command: make\n",
        )
        .unwrap();

        let compiled = compile(&definition, "p", "1", "ns", "").unwrap();
        let suffix = compiled.pipeline.name().trim_start_matches("p-build-1-");

        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert!(compiled.tasks[0].name().ends_with(suffix));
    }

    #[test]
    fn test_yaml_and_json_output() {
        let compiled = compile_yaml(
            r#"
apiVersion: v0.1
agent:
  image: some-image
stages:
  - name: One
    steps:
      - command: make
  - name: Two
    steps:
      - command: make
"#,
        )
        .unwrap();

        let yaml = compiled.to_yaml().unwrap();
        assert_eq!(yaml.matches("---\n").count(), 2);
        assert!(yaml.contains("kind: Pipeline"));
        assert!(yaml.contains("targetPath: workspace"));
        assert!(yaml.contains("taskRef:"));

        let json: serde_json::Value = serde_json::from_str(&compiled.to_json().unwrap()).unwrap();
        assert_eq!(json["pipeline"]["kind"], "Pipeline");
        assert_eq!(json["tasks"].as_array().unwrap().len(), 2);
        assert_eq!(
            json["pipeline"]["spec"]["tasks"][1]["resources"]["inputs"][1]["from"][0],
            "somepipeline-build-somebuild-stage-one-abcd"
        );
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Stage-to-task transformation
//!
//! Turns the stage tree of a validated definition into an arena of
//! transformed stages. Leaves carry their generated [`Task`]; composite
//! stages carry the ids of their children. Upward links (`enclosing`,
//! `previous_sibling`) are arena ids and are only ever used for lookups.

use tracing::trace;

use crate::crd::{Container, EnvVar, Task};
use crate::errors::UnsupportedFeature;
use crate::pipeline::env::{root_env, scoped_env};
use crate::pipeline::label::mangle;
use crate::pipeline::{Agent, PipelineDefinition, Stage};

/// Index of a node in a [`StageTree`]
pub type StageId = usize;

/// Workspace of root stages that do not name one
pub const DEFAULT_WORKSPACE: &str = "default";

/// Workspace name meaning "start fresh, depend on nothing"
pub const FRESH_WORKSPACE: &str = "empty";

/// Target path of the checkout performed by the first task
pub const CHECKOUT_PATH: &str = "workspace";

/// What a transformed stage turned into
#[derive(Debug, Clone, PartialEq)]
pub enum StageKind {
    /// Leaf stage compiled to a task
    Task(Task),
    /// Children run one after another
    Sequential(Vec<StageId>),
    /// Children run side by side
    Parallel(Vec<StageId>),
}

/// A stage plus everything the compiler computed about it
#[derive(Debug, Clone)]
pub struct TransformedStage<'a> {
    pub stage: &'a Stage,
    pub kind: StageKind,
    /// Nesting depth; root stages are 0
    pub depth: usize,
    pub enclosing: Option<StageId>,
    /// Preceding sibling in a sequential block, or the preceding root stage.
    /// Always `None` for parallel branches.
    pub previous_sibling: Option<StageId>,
    /// Effective workspace name
    pub workspace: String,
    /// Set on leaves once their dependencies are resolved
    pub pipeline_task: Option<crate::crd::PipelineTask>,
}

impl<'a> TransformedStage<'a> {
    pub fn name(&self) -> &str {
        &self.stage.name
    }

    pub fn task(&self) -> Option<&Task> {
        match &self.kind {
            StageKind::Task(task) => Some(task),
            _ => None,
        }
    }
}

/// Arena of transformed stages, in construction order
#[derive(Debug, Clone, Default)]
pub struct StageTree<'a> {
    nodes: Vec<TransformedStage<'a>>,
    roots: Vec<StageId>,
}

impl<'a> StageTree<'a> {
    pub fn node(&self, id: StageId) -> &TransformedStage<'a> {
        &self.nodes[id]
    }

    pub(crate) fn node_mut(&mut self, id: StageId) -> &mut TransformedStage<'a> {
        &mut self.nodes[id]
    }

    pub fn roots(&self) -> &[StageId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Leaf ids in depth-first order, which is also task construction order
    pub fn leaves(&self) -> Vec<StageId> {
        let mut out = Vec::new();
        for &root in &self.roots {
            self.collect_leaves(root, &mut out);
        }
        out
    }

    fn collect_leaves(&self, id: StageId, out: &mut Vec<StageId>) {
        match &self.nodes[id].kind {
            StageKind::Task(_) => out.push(id),
            StageKind::Sequential(children) | StageKind::Parallel(children) => {
                for &child in children {
                    self.collect_leaves(child, out);
                }
            }
        }
    }

    /// The ancestor of `id` at `depth`, or `id` itself if it sits there
    pub fn ancestor_at(&self, id: StageId, depth: usize) -> Option<StageId> {
        let mut current = id;
        loop {
            let node = &self.nodes[current];
            if node.depth == depth {
                return Some(current);
            }
            if node.depth < depth {
                return None;
            }
            current = node.enclosing?;
        }
    }

    fn push(&mut self, node: TransformedStage<'a>) -> StageId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }
}

/// Identifiers shared by every generated name
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'c> {
    pub pipeline_id: &'c str,
    pub build_id: &'c str,
    pub namespace: &'c str,
    pub suffix: &'c str,
}

/// What a stage inherits from where it sits in the tree
struct Scope<'s> {
    checkout_path: Option<&'s str>,
    env: &'s [EnvVar],
    agent: &'s Agent,
    workspace: &'s str,
    depth: usize,
    enclosing: Option<StageId>,
    previous_sibling: Option<StageId>,
}

/// Transform every stage of `definition`.
///
/// Root post sections and root options are the caller's concern; this
/// only looks at the stages and the root agent and environment.
pub fn transform<'a>(
    definition: &'a PipelineDefinition,
    ctx: &TransformContext<'_>,
) -> Result<StageTree<'a>, UnsupportedFeature> {
    let mut tree = StageTree::default();
    let env = root_env(&definition.environment);
    let mut previous = None;

    for (i, stage) in definition.stages.iter().enumerate() {
        let scope = Scope {
            checkout_path: (i == 0).then_some(CHECKOUT_PATH),
            env: &env,
            agent: &definition.agent,
            workspace: DEFAULT_WORKSPACE,
            depth: 0,
            enclosing: None,
            previous_sibling: previous,
        };

        let id = tree.transform_stage(stage, ctx, &scope)?;
        tree.roots.push(id);
        previous = Some(id);
    }

    Ok(tree)
}

impl<'a> StageTree<'a> {
    fn transform_stage(
        &mut self,
        stage: &'a Stage,
        ctx: &TransformContext<'_>,
        scope: &Scope<'_>,
    ) -> Result<StageId, UnsupportedFeature> {
        check_supported(stage)?;

        let env = scoped_env(stage, scope.env);
        let agent = stage.agent.or_inherit(scope.agent);
        let workspace = stage
            .options
            .workspace
            .clone()
            .unwrap_or_else(|| scope.workspace.to_string());

        trace!(stage = %stage.name, depth = scope.depth, workspace = %workspace, "transforming stage");

        if !stage.steps.is_empty() {
            let task = leaf_task(stage, ctx, agent, &env, scope.checkout_path)?;
            return Ok(self.push(TransformedStage {
                stage,
                kind: StageKind::Task(task),
                depth: scope.depth,
                enclosing: scope.enclosing,
                previous_sibling: scope.previous_sibling,
                workspace,
                pipeline_task: None,
            }));
        }

        let (nested, parallel) = if !stage.stages.is_empty() {
            (&stage.stages, false)
        } else if !stage.parallel.is_empty() {
            (&stage.parallel, true)
        } else {
            return Err(UnsupportedFeature::EmptyStage);
        };

        let id = self.push(TransformedStage {
            stage,
            kind: StageKind::Sequential(Vec::new()),
            depth: scope.depth,
            enclosing: scope.enclosing,
            previous_sibling: scope.previous_sibling,
            workspace: workspace.clone(),
            pipeline_task: None,
        });

        let mut children = Vec::with_capacity(nested.len());
        for (i, child) in nested.iter().enumerate() {
            let child_scope = Scope {
                checkout_path: if i == 0 { scope.checkout_path } else { None },
                env: &env,
                agent,
                workspace: &workspace,
                depth: scope.depth + 1,
                enclosing: Some(id),
                previous_sibling: if parallel { None } else { children.last().copied() },
            };
            children.push(self.transform_stage(child, ctx, &child_scope)?);
        }

        self.nodes[id].kind = if parallel {
            StageKind::Parallel(children)
        } else {
            StageKind::Sequential(children)
        };

        Ok(id)
    }
}

/// Reject stage features the compiler cannot express yet
fn check_supported(stage: &Stage) -> Result<(), UnsupportedFeature> {
    let options = &stage.options;

    if !stage.post.is_empty() {
        return Err(UnsupportedFeature::StagePost);
    }
    if options.root.timeout.as_ref().is_some_and(|t| !t.is_empty()) {
        return Err(UnsupportedFeature::StageTimeout);
    }
    if options.root.retry != 0 {
        return Err(UnsupportedFeature::StageRetry);
    }
    if options.stash.as_ref().is_some_and(|s| *s != Default::default()) {
        return Err(UnsupportedFeature::StageStash);
    }
    if options.unstash.as_ref().is_some_and(|u| *u != Default::default()) {
        return Err(UnsupportedFeature::StageUnstash);
    }

    Ok(())
}

/// Name of the task generated for a leaf stage
pub(crate) fn task_name(ctx: &TransformContext<'_>, stage_name: &str) -> String {
    mangle(
        &format!("{}-build-{}-stage-{}", ctx.pipeline_id, ctx.build_id, stage_name),
        ctx.suffix,
    )
}

/// Name of the pipeline entry that runs a leaf stage's task
pub(crate) fn pipeline_task_name(stage_name: &str, suffix: &str) -> String {
    mangle(stage_name, suffix)
}

fn leaf_task(
    stage: &Stage,
    ctx: &TransformContext<'_>,
    agent: &Agent,
    env: &[EnvVar],
    checkout_path: Option<&str>,
) -> Result<Task, UnsupportedFeature> {
    let mut task = Task::new(task_name(ctx, &stage.name), ctx.namespace, checkout_path);

    for (i, step) in stage.steps.iter().enumerate() {
        let command = step
            .command
            .as_deref()
            .filter(|c| !c.is_empty())
            .ok_or(UnsupportedFeature::SyntacticSugarStep)?;

        let image = if step.agent.is_empty() {
            agent.image_or_default()
        } else {
            step.agent.image_or_default()
        };

        task.spec.steps.push(Container {
            name: mangle(&format!("stage-{}-step-{}", stage.name, i), ctx.suffix),
            image,
            command: vec![command.to_string()],
            args: step.arguments.clone(),
            env: env.to_vec(),
        });
    }

    Ok(task)
}

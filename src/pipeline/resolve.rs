// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Dependency and workspace resolution
//!
//! Every leaf gets a pipeline task with two input edges:
//!
//! - `workspace`: the most recent earlier task using the same named
//!   workspace, skipping over parallel blocks the leaf is not part of.
//! - `temp-ordering-resource`: the end tasks of whatever ran immediately
//!   before the leaf, so sequential order holds even across workspaces.
//!
//! Leaves are resolved in construction order, and a leaf only counts as a
//! workspace provider once it has been resolved itself. That keeps a task
//! from ever depending on itself or on something that runs after it.

use tracing::debug;

use crate::crd::PipelineTask;
use crate::pipeline::transform::{
    pipeline_task_name, StageId, StageKind, StageTree, FRESH_WORKSPACE,
};

/// Outcome of looking for a leaf's workspace provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceSearch {
    /// The leaf asked for a fresh workspace
    Fresh,
    /// Task name of the provider
    Provided(String),
    /// No earlier task uses the same workspace
    NotFound,
}

impl WorkspaceSearch {
    fn into_providers(self) -> Vec<String> {
        match self {
            Self::Provided(task) => vec![task],
            Self::Fresh | Self::NotFound => Vec::new(),
        }
    }
}

/// Attach a pipeline task to every leaf of `tree`
pub fn resolve(tree: &mut StageTree<'_>, suffix: &str) {
    for leaf in tree.leaves() {
        let workspace_from = tree.find_workspace_provider(leaf).into_providers();
        let ordering_from = tree.previous_end_tasks(leaf);

        let node = tree.node(leaf);
        let Some(task) = node.task() else {
            continue;
        };

        debug!(
            task = %task.name(),
            workspace = ?workspace_from,
            after = ?ordering_from,
            "resolved task dependencies"
        );

        let pipeline_task = PipelineTask::new(
            pipeline_task_name(node.name(), suffix),
            task.name().to_string(),
            workspace_from,
            ordering_from,
        );
        tree.node_mut(leaf).pipeline_task = Some(pipeline_task);
    }
}

impl StageTree<'_> {
    /// Find the task whose workspace `leaf` should receive
    pub fn find_workspace_provider(&self, leaf: StageId) -> WorkspaceSearch {
        if self.node(leaf).workspace == FRESH_WORKSPACE {
            return WorkspaceSearch::Fresh;
        }

        let mut current = self.ancestor_at(leaf, 0);
        while let Some(id) = current {
            if let Some(provider) = self.search_workspace(id, leaf) {
                return WorkspaceSearch::Provided(provider);
            }
            current = self.node(id).previous_sibling;
        }

        WorkspaceSearch::NotFound
    }

    fn search_workspace(&self, id: StageId, leaf: StageId) -> Option<String> {
        let node = self.node(id);

        match &node.kind {
            StageKind::Sequential(children) => children
                .iter()
                .rev()
                .find_map(|&child| self.search_workspace(child, leaf)),
            StageKind::Parallel(branches) => {
                // Only look inside a parallel block from within it, and then
                // only along the branch containing the leaf.
                if self.ancestor_at(leaf, node.depth) != Some(id) {
                    return None;
                }
                branches
                    .iter()
                    .find(|&&branch| self.ancestor_at(leaf, self.node(branch).depth) == Some(branch))
                    .and_then(|&branch| self.search_workspace(branch, leaf))
            }
            StageKind::Task(task) => (node.pipeline_task.is_some()
                && node.workspace == self.node(leaf).workspace)
                .then(|| task.name().to_string()),
        }
    }

    /// Task names that must finish before `leaf` starts
    pub fn previous_end_tasks(&self, leaf: StageId) -> Vec<String> {
        let mut current = leaf;
        loop {
            let node = self.node(current);
            if let Some(previous) = node.previous_sibling {
                let mut out = Vec::new();
                self.end_tasks(previous, &mut out);
                return out;
            }
            match node.enclosing {
                Some(parent) => current = parent,
                None => return Vec::new(),
            }
        }
    }

    /// The tasks a stage finishes with
    fn end_tasks(&self, id: StageId, out: &mut Vec<String>) {
        match &self.node(id).kind {
            StageKind::Task(task) => out.push(task.name().to_string()),
            StageKind::Sequential(children) => {
                if let Some(&last) = children.last() {
                    self.end_tasks(last, out);
                }
            }
            StageKind::Parallel(branches) => {
                for &branch in branches {
                    self.end_tasks(branch, out);
                }
            }
        }
    }
}

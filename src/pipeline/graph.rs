// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Task dependency graph
//!
//! Builds a graph of a compiled pipeline's tasks from their workspace and
//! ordering inputs, for display and for checking execution order.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::HashMap;

use crate::crd::Pipeline;
use crate::errors::StagegraphError;

/// How a task depends on another
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dependency {
    /// Receives the other task's workspace (and runs after it)
    Workspace,
    /// Only runs after it
    Ordering,
}

/// Dependency graph over the tasks of a pipeline
pub struct PipelineGraph {
    graph: DiGraph<String, Dependency>,
    name_to_index: HashMap<String, NodeIndex>,
}

impl PipelineGraph {
    /// Build the graph from a pipeline's task resources.
    ///
    /// Nodes are task names. A provider that feeds a task both its
    /// workspace and its ordering gets a single workspace edge.
    pub fn from_pipeline(pipeline: &Pipeline) -> Self {
        let mut graph = DiGraph::new();
        let mut name_to_index = HashMap::new();

        for pt in &pipeline.spec.tasks {
            let name = pt.task_ref.name.clone();
            let node = graph.add_node(name.clone());
            name_to_index.insert(name, node);
        }

        let mut builder = Self {
            graph,
            name_to_index,
        };

        for pt in &pipeline.spec.tasks {
            let to = builder.name_to_index[&pt.task_ref.name];
            for provider in pt.workspace_providers() {
                builder.add_edge(provider, to, Dependency::Workspace);
            }
            for provider in pt.ordering_providers() {
                builder.add_edge(provider, to, Dependency::Ordering);
            }
        }

        builder
    }

    fn add_edge(&mut self, provider: &str, to: NodeIndex, dependency: Dependency) {
        // Providers outside the pipeline still show up as nodes
        let from = match self.name_to_index.get(provider) {
            Some(node) => *node,
            None => {
                let node = self.graph.add_node(provider.to_string());
                self.name_to_index.insert(provider.to_string(), node);
                node
            }
        };

        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, dependency);
        }
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Task names in an order that respects every dependency
    pub fn topological_order(&self) -> Result<Vec<String>, StagegraphError> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.graph[n].clone()).collect())
            .map_err(|cycle| StagegraphError::CircularDependency {
                tasks: self.find_cycle_members(cycle.node_id()),
            })
    }

    /// Walk forward from `start` until it is reached again
    fn find_cycle_members(&self, start: NodeIndex) -> Vec<String> {
        let mut path = vec![start];
        let mut visited = std::collections::HashSet::new();

        fn walk(
            graph: &DiGraph<String, Dependency>,
            start: NodeIndex,
            path: &mut Vec<NodeIndex>,
            visited: &mut std::collections::HashSet<NodeIndex>,
        ) -> bool {
            let Some(&current) = path.last() else {
                return false;
            };
            for next in graph.neighbors(current) {
                if next == start {
                    return true;
                }
                if visited.insert(next) {
                    path.push(next);
                    if walk(graph, start, path, visited) {
                        return true;
                    }
                    path.pop();
                }
            }
            false
        }

        walk(&self.graph, start, &mut path, &mut visited);
        path.into_iter().map(|n| self.graph[n].clone()).collect()
    }

    /// Tasks that `task` directly depends on, with the kind of dependency
    pub fn dependencies(&self, task: &str) -> Option<Vec<(String, Dependency)>> {
        let node = self.name_to_index.get(task)?;
        let mut deps: Vec<(String, Dependency)> = self
            .graph
            .edges_directed(*node, petgraph::Direction::Incoming)
            .map(|e| (self.graph[e.source()].clone(), *e.weight()))
            .collect();
        deps.sort_by(|a, b| a.0.cmp(&b.0));
        Some(deps)
    }

    /// Mermaid flowchart; workspace edges are solid, ordering edges dotted
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for node in self.graph.node_indices() {
            out.push_str(&format!("    n{}[\"{}\"]\n", node.index(), self.graph[node]));
        }

        for edge in self.graph.edge_references() {
            let arrow = match edge.weight() {
                Dependency::Workspace => "-->",
                Dependency::Ordering => "-.->",
            };
            out.push_str(&format!(
                "    n{} {} n{}\n",
                edge.source().index(),
                arrow,
                edge.target().index()
            ));
        }

        out
    }

    /// Graphviz DOT; ordering-only edges are dashed
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for edge in self.graph.edge_references() {
            let style = match edge.weight() {
                Dependency::Workspace => "",
                Dependency::Ordering => " [style=dashed]",
            };
            out.push_str(&format!(
                "    \"{}\" -> \"{}\"{};\n",
                self.graph[edge.source()],
                self.graph[edge.target()],
                style
            ));
        }

        for node in self.graph.node_indices() {
            if self.graph.neighbors_undirected(node).count() == 0 {
                out.push_str(&format!("    \"{}\";\n", self.graph[node]));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Numbered execution order with each task's dependencies
    pub fn to_text(&self) -> Result<String, StagegraphError> {
        let order = self.topological_order()?;
        let mut out = String::new();

        for (i, task) in order.iter().enumerate() {
            out.push_str(&format!("{}. {}", i + 1, task));

            let deps = self.dependencies(task).unwrap_or_default();
            let workspace: Vec<&str> = deps
                .iter()
                .filter(|(_, d)| *d == Dependency::Workspace)
                .map(|(n, _)| n.as_str())
                .collect();
            let after: Vec<&str> = deps
                .iter()
                .filter(|(_, d)| *d == Dependency::Ordering)
                .map(|(n, _)| n.as_str())
                .collect();

            if !workspace.is_empty() {
                out.push_str(&format!(" [workspace: {}]", workspace.join(", ")));
            }
            if !after.is_empty() {
                out.push_str(&format!(" [after: {}]", after.join(", ")));
            }

            out.push('\n');
        }

        Ok(out)
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Environment scoping
//!
//! A stage sees its ancestors' environment plus its own, with its own
//! entries winning on name clashes.

use std::collections::BTreeMap;

use crate::crd::EnvVar;
use crate::pipeline::Stage;

/// Merge `parent_env` with the stage's own environment.
///
/// The result has one entry per name, sorted by name. Empty when both
/// inputs are empty.
pub fn scoped_env(stage: &Stage, parent_env: &[EnvVar]) -> Vec<EnvVar> {
    if parent_env.is_empty() && stage.environment.is_empty() {
        return Vec::new();
    }

    let mut merged: BTreeMap<&str, &str> = BTreeMap::new();
    for e in parent_env {
        merged.insert(&e.name, &e.value);
    }
    for e in &stage.environment {
        merged.insert(&e.name, &e.value);
    }

    merged
        .into_iter()
        .map(|(name, value)| EnvVar {
            name: name.to_string(),
            value: value.to_string(),
        })
        .collect()
}

/// Convert root-level definition entries into resolved variables
pub fn root_env(environment: &[crate::pipeline::EnvVar]) -> Vec<EnvVar> {
    let mut merged: BTreeMap<&str, &str> = BTreeMap::new();
    for e in environment {
        merged.insert(&e.name, &e.value);
    }

    merged
        .into_iter()
        .map(|(name, value)| EnvVar {
            name: name.to_string(),
            value: value.to_string(),
        })
        .collect()
}

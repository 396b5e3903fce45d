// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Field-path-qualified validation errors
//!
//! Every validation failure points at the exact place in the pipeline
//! definition it came from, e.g. `stages[0].steps[1].command`.

use std::fmt;
use thiserror::Error;

/// One step of a field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A named field, e.g. `options`
    Field(String),
    /// An index into the preceding list field, e.g. `[2]`
    Index(usize),
}

/// A path from the document root to a single field
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Path consisting of a single field name
    pub fn field(name: &str) -> Self {
        Self {
            segments: vec![PathSegment::Field(name.to_string())],
        }
    }

    /// This path extended by a named field
    pub fn child(&self, field: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(PathSegment::Field(field.to_string()));
        Self { segments }
    }

    /// This path extended by an indexed list field
    pub fn index(&self, field: &str, idx: usize) -> Self {
        let mut path = self.child(field);
        path.segments.push(PathSegment::Index(idx));
        path
    }

    fn prepend(&mut self, prefix: &[PathSegment]) {
        let mut segments = prefix.to_vec();
        segments.append(&mut self.segments);
        self.segments = segments;
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

/// A single validation failure with the field path(s) it applies to
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", with_paths(.paths))]
pub struct FieldError {
    pub message: String,
    pub paths: Vec<FieldPath>,
}

impl FieldError {
    pub fn new(message: impl Into<String>, field: &str) -> Self {
        Self {
            message: message.into(),
            paths: vec![FieldPath::field(field)],
        }
    }

    /// Exactly one of `fields` must be set, but none were
    pub fn missing_one_of(fields: &[&str]) -> Self {
        Self {
            message: "expected exactly one, got neither".to_string(),
            paths: fields.iter().map(|f| FieldPath::field(f)).collect(),
        }
    }

    /// Exactly one of `fields` must be set, but more than one was
    pub fn multiple_one_of(fields: &[&str]) -> Self {
        Self {
            message: "expected exactly one, got both".to_string(),
            paths: fields.iter().map(|f| FieldPath::field(f)).collect(),
        }
    }

    /// A required field is absent or empty
    pub fn missing_field(field: &str) -> Self {
        Self {
            message: "missing field(s)".to_string(),
            paths: vec![FieldPath::field(field)],
        }
    }

    /// Qualify every path with a parent field: `name` → `field.name`
    pub fn via_field(mut self, field: &str) -> Self {
        let prefix = [PathSegment::Field(field.to_string())];
        for path in &mut self.paths {
            path.prepend(&prefix);
        }
        self
    }

    /// Qualify every path with an indexed parent: `name` → `field[idx].name`
    pub fn via_field_index(mut self, field: &str, idx: usize) -> Self {
        let prefix = [PathSegment::Field(field.to_string()), PathSegment::Index(idx)];
        for path in &mut self.paths {
            path.prepend(&prefix);
        }
        self
    }
}

fn with_paths(paths: &[FieldPath]) -> String {
    if paths.is_empty() {
        return String::new();
    }
    let paths: Vec<String> = paths.iter().map(ToString::to_string).collect();
    format!(": {}", paths.join(", "))
}

/// All the field errors found while validating a pipeline definition.
///
/// Never empty when returned from the validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", one_per_line(.errors))]
pub struct ValidationError {
    pub errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }
}

impl From<FieldError> for ValidationError {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

fn one_per_line(errors: &[FieldError]) -> String {
    let lines: Vec<String> = errors.iter().map(ToString::to_string).collect();
    lines.join("\n")
}

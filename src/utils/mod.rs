// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Utility modules
//!
//! Common utilities for the stagegraph CLI.

pub mod colors;

pub use colors::*;

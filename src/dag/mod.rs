// src/dag/mod.rs

//! Task graph storage and analysis.
//!
//! - [`graph`] holds the task set with its summary tree and dependency links.
//! - [`critical_path`] runs the forward/backward pass and reports the
//!   critical set.

pub mod critical_path;
pub mod graph;

pub use critical_path::{CriticalPathResult, TaskTiming, analyze, check_acyclic};
pub use graph::TaskGraph;

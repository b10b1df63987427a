// src/config/mod.rs

//! Project file loading and validation.
//!
//! Responsibilities:
//! - Define the file-backed data model (`model.rs`).
//! - Load a project file from disk, TOML or JSON (`loader.rs`).
//! - Validate record-level invariants before a core is built (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_project_path, load_and_validate, load_from_path};
pub use model::{ProjectFile, RawProjectFile};

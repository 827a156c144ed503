// src/fileset/mod.rs

//! File-set selection and the symbolic path table.
//!
//! - [`selector`] compiles ordered include/exclude glob patterns and resolves
//!   them against a root directory.
//! - [`paths`] holds the read-only mapping from symbolic directory names to
//!   concrete paths, and expands `${name}` placeholders in patterns.

pub mod paths;
pub mod selector;

use std::path::PathBuf;

pub use paths::PathTable;
pub use selector::FileSelector;

/// A resolved set of files flowing between pipeline stages.
pub type FileSet = Vec<PathBuf>;

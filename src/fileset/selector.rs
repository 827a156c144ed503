// src/fileset/selector.rs

use std::fmt;
use std::path::Path;

use globset::{Glob, GlobMatcher};
use tracing::debug;
use walkdir::WalkDir;

use crate::errors::{Result, SluiceError};
use crate::fileset::FileSet;

/// One compiled pattern in a selector, in declaration order.
#[derive(Clone)]
struct CompiledPattern {
    exclude: bool,
    matcher: GlobMatcher,
}

/// An ordered sequence of inclusion/exclusion glob patterns.
///
/// A leading `!` marks a pattern as an exclusion. Order matters: an exclusion
/// only cancels matches of the inclusions that precede it, and a later
/// inclusion re-adds a path that an earlier exclusion removed.
///
/// Patterns are evaluated against paths relative to a root directory, with
/// forward slashes (e.g. `"src/js/app.js"`).
#[derive(Clone)]
pub struct FileSelector {
    raw: Vec<String>,
    patterns: Vec<CompiledPattern>,
}

impl fmt::Debug for FileSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSelector")
            .field("patterns", &self.raw)
            .finish()
    }
}

impl FileSelector {
    /// Compile a selector from raw patterns.
    ///
    /// Returns [`SluiceError::Glob`] on the first invalid pattern.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(patterns.len());
        let mut raw = Vec::with_capacity(patterns.len());

        for pat in patterns {
            let pat = pat.as_ref();
            let (exclude, glob_str) = match pat.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, pat),
            };

            let glob = Glob::new(glob_str).map_err(|source| SluiceError::Glob {
                pattern: pat.to_string(),
                source,
            })?;

            compiled.push(CompiledPattern {
                exclude,
                matcher: glob.compile_matcher(),
            });
            raw.push(pat.to_string());
        }

        Ok(Self {
            raw,
            patterns: compiled,
        })
    }

    /// The raw patterns this selector was built from.
    pub fn patterns(&self) -> &[String] {
        &self.raw
    }

    /// Returns true if the selector has no patterns at all.
    ///
    /// An empty selector matches nothing; tasks that only aggregate other
    /// tasks have one of these.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Returns true if the selector includes the given root-relative path.
    ///
    /// Patterns are applied in order: an inclusion match marks the path as
    /// selected, a subsequent exclusion match un-selects it, and so on. The
    /// final state wins.
    pub fn matches(&self, rel_path: &str) -> bool {
        let mut selected = false;
        for pat in &self.patterns {
            if pat.matcher.is_match(rel_path) {
                selected = !pat.exclude;
            }
        }
        selected
    }

    /// Walk `root` and collect every file the selector includes, sorted.
    pub fn resolve(&self, root: &Path) -> Result<FileSet> {
        if self.is_empty() {
            return Ok(Vec::new());
        }

        let mut files: FileSet = Vec::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| {
                SluiceError::Config(format!("walking {:?}: {e}", root))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(rel) = relative_str(root, entry.path()) {
                if self.matches(&rel) {
                    files.push(entry.path().to_path_buf());
                }
            }
        }

        files.sort();
        debug!(patterns = ?self.raw, count = files.len(), "selector resolved");
        Ok(files)
    }
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if the path is not under `root` and cannot be relativized.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let s = rel.to_string_lossy().replace('\\', "/");
    Some(s)
}


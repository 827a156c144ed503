// src/fileset/paths.rs

use std::collections::BTreeMap;

use crate::errors::{Result, SluiceError};

/// Read-only mapping from symbolic directory names to concrete paths.
///
/// Built once from the `[paths]` config section and never mutated afterwards.
/// Patterns and stage destinations reference entries with `${name}`, e.g.:
///
/// ```toml
/// [paths]
/// dev = "app/src"
/// prod = "app/dist"
/// vendor = "bower_components"
///
/// [task.lint]
/// select = ["${dev}/js/**/*.js", "!${dev}/js/**/*.min.js"]
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathTable {
    entries: BTreeMap<String, String>,
}

impl PathTable {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    /// Look up a symbolic name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|s| s.as_str())
    }

    /// Iterate over all entries, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Expand every `${name}` placeholder in `input`.
    ///
    /// Fails with a configuration error on an unknown name or an unterminated
    /// placeholder.
    pub fn expand(&self, input: &str) -> Result<String> {
        let mut out = String::with_capacity(input.len());
        let mut rest = input;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| {
                SluiceError::Config(format!(
                    "unterminated path placeholder in '{input}'"
                ))
            })?;
            let name = &after[..end];
            let value = self.get(name).ok_or_else(|| {
                SluiceError::Config(format!(
                    "unknown path name '{name}' in '{input}' (not in [paths])"
                ))
            })?;
            out.push_str(value);
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Expand a list of patterns in order.
    pub fn expand_all<S: AsRef<str>>(&self, inputs: &[S]) -> Result<Vec<String>> {
        inputs.iter().map(|s| self.expand(s.as_ref())).collect()
    }
}

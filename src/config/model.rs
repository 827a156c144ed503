// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [paths]
/// dev = "app/src"
/// prod = "app/dist"
/// vendor = "bower_components"
///
/// [task.lint]
/// select = ["${dev}/js/**/*.js", "!${dev}/js/**/*.min.js"]
/// stage = [{ kind = "exec", cmd = "jshint {files}" }]
/// notify = "JavaScript has been linted"
///
/// [task.scripts]
/// after = ["lint", "format"]
///
/// [[watch]]
/// select = ["${dev}/js/**/*.js"]
/// run = ["scripts"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Symbolic directory names from `[paths]`, read-only after load.
    #[serde(default)]
    pub paths: BTreeMap<String, String>,

    /// All tasks from `[task.<name>]`. Keys are the task names.
    #[serde(default)]
    pub task: BTreeMap<String, TaskConfig>,

    /// Watch bindings from `[[watch]]`.
    #[serde(default)]
    pub watch: Vec<WatchConfig>,
}

/// `[task.<name>]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TaskConfig {
    /// Ordered inclusion/exclusion patterns (`!` prefix excludes) selecting
    /// this task's input file set. May reference `[paths]` via `${name}`.
    ///
    /// Empty for tasks that only aggregate other tasks via `after`.
    #[serde(default)]
    pub select: Vec<String>,

    /// Prerequisite list: this task waits for all tasks listed here.
    #[serde(default)]
    pub after: Vec<String>,

    /// Transform stages applied in order to the selected file set.
    #[serde(default)]
    pub stage: Vec<StageConfig>,

    /// Message logged when the task's stages all complete.
    #[serde(default)]
    pub notify: Option<String>,
}

/// One stage table inside a task's `stage = [...]` array.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StageConfig {
    /// Copy the file set into `dest`, optionally renaming with a suffix
    /// inserted before the extension (e.g. `suffix = ".min"`).
    Copy {
        dest: String,
        #[serde(default)]
        suffix: Option<String>,
    },

    /// Run an external command; `{files}` expands to the quoted file set.
    Exec { cmd: String },
}

/// One `[[watch]]` binding: when a change event matches `select`, each task
/// in `run` is triggered.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    pub select: Vec<String>,
    pub run: Vec<String>,
}

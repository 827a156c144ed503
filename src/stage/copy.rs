// src/stage/copy.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::fs;
use tracing::debug;

use crate::errors::SluiceError;
use crate::fileset::FileSet;
use crate::stage::{Stage, StageContext, StageOutput};

/// Copies the incoming file set into a destination directory.
///
/// This is the vendor-file copy step: no transformation, just placement.
/// Output is the set of destination paths, so a following stage operates on
/// the copies.
pub struct CopyStage {
    /// Destination directory, relative to the project root unless absolute.
    dest: PathBuf,
    /// Optional suffix inserted before the file extension, e.g. `".min"`
    /// turns `app.js` into `app.min.js`.
    suffix: Option<String>,
}

impl CopyStage {
    pub fn new(dest: impl Into<PathBuf>, suffix: Option<String>) -> Self {
        Self {
            dest: dest.into(),
            suffix,
        }
    }

    fn output_path(&self, dest_dir: &Path, src: &Path) -> Option<PathBuf> {
        let file_name = src.file_name()?;
        let mut name = PathBuf::from(file_name);

        if let Some(suffix) = &self.suffix {
            let stem = src.file_stem()?.to_string_lossy().into_owned();
            match src.extension() {
                Some(ext) => {
                    name = PathBuf::from(format!(
                        "{stem}{suffix}.{}",
                        ext.to_string_lossy()
                    ));
                }
                None => {
                    name = PathBuf::from(format!("{stem}{suffix}"));
                }
            }
        }

        Some(dest_dir.join(name))
    }
}

impl Stage for CopyStage {
    fn name(&self) -> &str {
        "copy"
    }

    fn apply<'a>(
        &'a self,
        input: FileSet,
        ctx: &'a StageContext,
    ) -> BoxFuture<'a, anyhow::Result<StageOutput>> {
        async move {
            let dest_dir = if self.dest.is_absolute() {
                self.dest.clone()
            } else {
                ctx.root.join(&self.dest)
            };

            fs::create_dir_all(&dest_dir).await?;

            let mut files: FileSet = Vec::with_capacity(input.len());
            let mut failures = Vec::new();
            // Copying flattens to the bare file name, so two sources may
            // claim the same destination; the second is a per-file failure,
            // not a silent overwrite.
            let mut claimed: HashSet<PathBuf> = HashSet::new();

            for src in input {
                let Some(out) = self.output_path(&dest_dir, &src) else {
                    failures.push(SluiceError::StageProcessing {
                        stage: self.name().to_string(),
                        file: src.clone(),
                        source: anyhow::anyhow!("path has no file name"),
                    });
                    continue;
                };

                if !claimed.insert(out.clone()) {
                    failures.push(SluiceError::StageProcessing {
                        stage: self.name().to_string(),
                        file: src.clone(),
                        source: anyhow::anyhow!(
                            "destination {:?} already written by another source file",
                            out
                        ),
                    });
                    continue;
                }

                match fs::copy(&src, &out).await {
                    Ok(_) => {
                        debug!(from = ?src, to = ?out, "copied");
                        files.push(out);
                    }
                    Err(err) => {
                        failures.push(SluiceError::StageProcessing {
                            stage: self.name().to_string(),
                            file: src.clone(),
                            source: err.into(),
                        });
                    }
                }
            }

            Ok(StageOutput { files, failures })
        }
        .boxed()
    }
}

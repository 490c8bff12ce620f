//! Packaging boundary: hand rendered artifacts to an output sink.
//!
//! The packager itself is an external collaborator — an archive writer, an
//! object store, a directory — so the orchestrator only sees the
//! [`Packager`] trait. Filenames are derived from the original document
//! name with the extension replaced by `.md`; the packager contract
//! requires name uniqueness, so collisions get a numeric suffix.

use crate::error::DocmillError;
use crate::output::BatchResult;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info};

/// Accepts (filename, content) pairs and stores them somewhere.
pub trait Packager {
    fn add(&mut self, filename: &str, content: &[u8]) -> io::Result<()>;
}

/// Derive the artifact filename for an input document name: the extension
/// (if any) is replaced by `.md`.
pub fn output_filename(name: &str) -> String {
    let stem = match name.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem,
        _ => name,
    };
    format!("{stem}.md")
}

/// Render every successful artifact in the batch and hand it to the
/// packager. Failed documents contribute no file. Returns the number of
/// files written.
pub fn package_batch(
    batch: &BatchResult,
    packager: &mut dyn Packager,
) -> Result<usize, DocmillError> {
    let mut used: HashSet<String> = HashSet::new();
    let mut written = 0;

    for (name, artifact) in batch.artifacts() {
        let mut filename = output_filename(name);

        // Packager contract requires unique names.
        if !used.insert(filename.clone()) {
            let base = filename.trim_end_matches(".md").to_string();
            let mut n = 2;
            loop {
                let candidate = format!("{base}-{n}.md");
                if used.insert(candidate.clone()) {
                    filename = candidate;
                    break;
                }
                n += 1;
            }
        }

        let rendered = artifact.render();
        packager
            .add(&filename, rendered.as_bytes())
            .map_err(|source| DocmillError::OutputWriteFailed {
                path: PathBuf::from(&filename),
                source,
            })?;
        debug!("packaged '{}' ({} bytes)", filename, rendered.len());
        written += 1;
    }

    info!("packaged {} artifact(s)", written);
    Ok(written)
}

/// Packager that writes one file per artifact under a root directory.
///
/// Writes are atomic (temp file + rename) so a crash mid-batch never
/// leaves a truncated artifact behind.
pub struct DirPackager {
    root: PathBuf,
}

impl DirPackager {
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }
}

impl Packager for DirPackager {
    fn add(&mut self, filename: &str, content: &[u8]) -> io::Result<()> {
        let path = self.root.join(filename);
        let tmp = path.with_extension("md.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &path)
    }
}

// src/pipeline/sidecar.rs

//! The `filenames.txt` side-car: one `key:value` line per old-path entry of
//! the file descriptor, consumed by later stages.
//!
//! It is written to the subject root before any job is submitted and moved
//! into the subject's fMRI directory once every branch job has been
//! submitted. Both steps are fatal on failure.

use std::path::PathBuf;

use anyhow::Context;
use tracing::debug;

use crate::config::descriptor::FileDescriptor;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::subject::SubjectLayout;

/// Side-car contents for a descriptor.
pub fn render_sidecar(descriptor: &FileDescriptor) -> String {
    descriptor
        .old_path_entries()
        .into_iter()
        .map(|(key, value)| format!("{key}:{value}\n"))
        .collect()
}

/// Write the side-car to its staging location and return that path.
pub fn write_staging(
    fs: &dyn FileSystem,
    subject: &SubjectLayout,
    descriptor: &FileDescriptor,
) -> Result<PathBuf> {
    let path = subject.sidecar_staging_path();
    let contents = render_sidecar(descriptor);
    fs.write(&path, contents.as_bytes())
        .with_context(|| format!("writing side-car file {}", path.display()))?;
    debug!(path = %path.display(), entries = contents.lines().count(), "side-car written");
    Ok(path)
}

/// Move the staged side-car into the fMRI directory and return its final
/// path.
pub fn relocate(fs: &dyn FileSystem, subject: &SubjectLayout) -> Result<PathBuf> {
    let from = subject.sidecar_staging_path();
    let to = subject.sidecar_path();

    fs.create_dir_all(&subject.fmri_dir())
        .with_context(|| format!("creating {}", subject.fmri_dir().display()))?;
    fs.rename(&from, &to)
        .with_context(|| format!("moving side-car file into {}", subject.fmri_dir().display()))?;

    debug!(path = %to.display(), "side-car relocated");
    Ok(to)
}

// src/submit/log_file.rs

//! Per-job log records.
//!
//! Every submission appends one record to `<log_dir>/<job name>.log`:
//!
//! ```text
//! STANDARD OUT:
//! <queue stdout>
//!
//! STANDARD ERROR:
//! <queue stderr>
//! ```

use std::path::Path;

use anyhow::Result;

use crate::fs::FileSystem;
use crate::submit::backend::QueueResponse;

/// Format the record for one submission.
pub fn format_record(response: &QueueResponse) -> String {
    format!(
        "STANDARD OUT:\n{}\n\nSTANDARD ERROR:\n{}",
        response.stdout, response.stderr
    )
}

/// Append the record for one submission to the job's log file.
pub fn append_record(fs: &dyn FileSystem, path: &Path, response: &QueueResponse) -> Result<()> {
    fs.append(path, format_record(response).as_bytes())
}

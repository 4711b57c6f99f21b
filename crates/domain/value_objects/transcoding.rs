use std::{path::PathBuf, process::ExitStatus, time::Duration};
use thiserror::Error;

/// Failure of the external remux step. In every case the caller must assume
/// no usable output file exists.
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to launch transcoder: {0}")]
    Launch(#[source] std::io::Error),

    #[error("transcoder exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },

    #[error("transcoder did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("transcoder produced an unusable output {}: {reason}", .path.display())]
    InvalidOutput { path: PathBuf, reason: String },
}

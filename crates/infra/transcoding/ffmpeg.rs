use async_trait::async_trait;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    process::{ExitStatus, Stdio},
    time::{Duration, Instant},
};
use tokio::{fs, io::AsyncReadExt, process::Command, time::timeout};
use tracing::{error, info, warn};

use crate::{
    domain::{
        repositories::transcoder::Transcoder,
        value_objects::{asset_naming::processed_sibling, transcoding::TranscodeError},
    },
    infra::transcoding::mp4_layout::verify_fast_start,
};

const STDERR_TAIL_CHARS: usize = 2000;

#[derive(Clone, Debug)]
pub struct FfmpegTranscoderConfig {
    pub ffmpeg_path: PathBuf,
    pub timeout: Duration,
}

/// Stream-copy remux through an external ffmpeg binary. The output is a
/// sibling of the input with the processed suffix and is only returned once
/// ffmpeg has exited and the container layout has been checked.
#[derive(Clone, Debug)]
pub struct FfmpegTranscoder {
    config: FfmpegTranscoderConfig,
}

impl FfmpegTranscoder {
    pub fn new(config: FfmpegTranscoderConfig) -> Self {
        Self { config }
    }

    /// First line of `ffmpeg -version`. Used at startup to surface a missing
    /// or broken binary before the first upload needs it.
    pub async fn version(&self) -> Result<String, TranscodeError> {
        let output = Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match timeout(self.config.timeout, output).await {
            Ok(output) => output.map_err(TranscodeError::Launch)?,
            Err(_) => return Err(TranscodeError::TimedOut(self.config.timeout)),
        };

        if !output.status.success() {
            return Err(TranscodeError::Failed {
                status: output.status,
                stderr: stderr_tail(&String::from_utf8_lossy(&output.stderr)),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    async fn run(&self, input: &Path, output: &Path) -> Result<ExitStatus, TranscodeError> {
        let mut child = Command::new(&self.config.ffmpeg_path)
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input)
            .arg("-c")
            .arg("copy")
            .arg("-movflags")
            .arg("faststart")
            .arg("-f")
            .arg("mp4")
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(TranscodeError::Launch)?;

        let stderr_reader = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf).await;
                buf
            })
        });

        let status = match timeout(self.config.timeout, child.wait()).await {
            Ok(status) => status.map_err(TranscodeError::Launch)?,
            Err(_) => {
                if let Err(err) = child.kill().await {
                    warn!(error = %err, "ffmpeg: failed to kill timed out process");
                }
                return Err(TranscodeError::TimedOut(self.config.timeout));
            }
        };

        if !status.success() {
            let stderr = match stderr_reader {
                Some(task) => task.await.unwrap_or_default(),
                None => Vec::new(),
            };
            return Err(TranscodeError::Failed {
                status,
                stderr: stderr_tail(&String::from_utf8_lossy(&stderr)),
            });
        }

        Ok(status)
    }

    async fn discard(&self, output: &Path) {
        if let Err(err) = fs::remove_file(output).await {
            if err.kind() != ErrorKind::NotFound {
                warn!(
                    path = %output.display(),
                    error = %err,
                    "ffmpeg: failed to remove unusable output"
                );
            }
        }
    }
}

fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - STDERR_TAIL_CHARS).collect()
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn remux_fast_start(&self, input: PathBuf) -> Result<PathBuf, TranscodeError> {
        let output = processed_sibling(&input);
        let started = Instant::now();

        if let Err(err) = self.run(&input, &output).await {
            error!(
                input = %input.display(),
                error = %err,
                "ffmpeg: fast-start remux failed"
            );
            self.discard(&output).await;
            return Err(err);
        }

        let verify_path = output.clone();
        let verified = tokio::task::spawn_blocking(move || verify_fast_start(&verify_path))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|result| result);

        if let Err(err) = verified {
            let err = TranscodeError::InvalidOutput {
                path: output.clone(),
                reason: format!("{err:#}"),
            };
            error!(input = %input.display(), error = %err, "ffmpeg: output rejected");
            self.discard(&output).await;
            return Err(err);
        }

        info!(
            input = %input.display(),
            output = %output.display(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ffmpeg: fast-start remux finished"
        );

        Ok(output)
    }
}

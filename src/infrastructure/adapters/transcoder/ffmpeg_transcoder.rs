//! ffmpeg Transcoder - 外部 ffmpeg 转码
//!
//! - wav: 直接复制
//! - mp3: libmp3lame VBR q2
//! - opus: libopus 64k（ogg 容器，由输出扩展名决定）
//! - flac: 无损

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use super::waveform::probe_waveform;
use crate::application::ports::{AudioFormat, AudioInfo, AudioTranscoderPort, TranscodeError};

/// stderr 最多保留的字节数
const STDERR_LIMIT: usize = 4096;

/// ffmpeg 转码器
pub struct FfmpegTranscoder {
    ffmpeg: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

fn codec_args(format: AudioFormat) -> &'static [&'static str] {
    match format {
        AudioFormat::Wav => &[],
        AudioFormat::Mp3 => &["-codec:a", "libmp3lame", "-qscale:a", "2"],
        AudioFormat::Opus => &["-codec:a", "libopus", "-b:a", "64k"],
        AudioFormat::Flac => &["-codec:a", "flac"],
    }
}

/// ffmpeg 命令行参数
pub(crate) fn build_args(input: &Path, output: &Path, format: AudioFormat) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-loglevel", "error", "-y", "-i"]
        .iter()
        .map(OsString::from)
        .collect();
    args.push(input.as_os_str().to_os_string());
    args.extend(codec_args(format).iter().map(OsString::from));
    args.push(output.as_os_str().to_os_string());
    args
}

fn truncate_stderr(stderr: &[u8]) -> String {
    let start = stderr.len().saturating_sub(STDERR_LIMIT);
    String::from_utf8_lossy(&stderr[start..]).trim().to_string()
}

#[async_trait]
impl AudioTranscoderPort for FfmpegTranscoder {
    async fn probe(&self, waveform: &Path) -> Result<AudioInfo, TranscodeError> {
        let path = waveform.to_path_buf();
        tokio::task::spawn_blocking(move || probe_waveform(&path))
            .await
            .map_err(|e| TranscodeError::IoError(e.to_string()))?
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: AudioFormat,
    ) -> Result<u64, TranscodeError> {
        if format == AudioFormat::Wav {
            return tokio::fs::copy(input, output)
                .await
                .map_err(|e| TranscodeError::IoError(format!("Copy failed: {}", e)));
        }

        let args = build_args(input, output, format);
        tracing::debug!(ffmpeg = %self.ffmpeg.display(), args = ?args, "Running ffmpeg");

        let result = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                TranscodeError::IoError(format!(
                    "Failed to run {}: {}",
                    self.ffmpeg.display(),
                    e
                ))
            })?;

        if !result.status.success() {
            return Err(TranscodeError::ConverterFailed {
                exit_code: result.status.code(),
                stderr: truncate_stderr(&result.stderr),
            });
        }

        let size = tokio::fs::metadata(output)
            .await
            .map(|meta| meta.len())
            .unwrap_or(0);
        if size == 0 {
            return Err(TranscodeError::EmptyOutput(output.to_path_buf()));
        }

        tracing::debug!(format = %format, size_bytes = size, "Transcode completed");
        Ok(size)
    }
}

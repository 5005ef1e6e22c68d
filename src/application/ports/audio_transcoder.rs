//! Audio Transcoder Port - 外部转码器抽象
//!
//! 把通道产出的原始 WAV 转成请求的输出格式

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub use crate::domain::AudioFormat;

/// 转码错误
#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),

    #[error("Converter exited with {exit_code:?}: {stderr}")]
    ConverterFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("Converter produced an empty file: {0}")]
    EmptyOutput(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

/// 原始波形信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioInfo {
    /// 时长（毫秒）
    pub duration_ms: u64,
    /// 采样率
    pub sample_rate: u32,
    /// 声道数
    pub channels: u8,
}

/// Audio Transcoder Port
#[async_trait]
pub trait AudioTranscoderPort: Send + Sync {
    /// 校验并读取原始波形信息（不转码）
    async fn probe(&self, waveform: &Path) -> Result<AudioInfo, TranscodeError>;

    /// 转码 `input` 到 `output`，返回输出文件大小（字节）
    ///
    /// `wav` 为纯复制
    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: AudioFormat,
    ) -> Result<u64, TranscodeError>;
}

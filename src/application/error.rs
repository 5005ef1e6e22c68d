//! 应用层错误定义
//!
//! 除音色回退（只记日志）和通道繁忙（正常溢出路径）外，
//! 所有失败都会中止请求并以单一错误返回调用方，不做自动重试

use thiserror::Error;

use crate::application::ports::{CacheError, TranscodeError, TtsError, VoiceError};
use crate::domain::SpeechError;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 请求校验失败
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 上传的参考音频无法落盘
    #[error("Voice resolution failed: {0}")]
    VoiceResolution(String),

    /// 常驻通道合成失败
    #[error("Warm synthesis failed: {0}")]
    WarmSynthesis(String),

    /// 冷通道失败，附带子进程诊断输出
    #[error("Cold lane failed: {message}")]
    ColdLane { message: String, stderr: String },

    /// 转码失败（非零退出 / 空文件 / 中间波形无效）
    #[error("Transcode failed: {0}")]
    Transcode(String),

    /// 缓存发布失败
    #[error("Cache write failed: {0}")]
    CacheWrite(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }

    /// 冷通道错误，保留子进程 stderr
    pub fn cold_lane(err: TtsError) -> Self {
        match err {
            TtsError::ProcessFailed {
                message, stderr, ..
            } => Self::ColdLane { message, stderr },
            other => Self::ColdLane {
                message: other.to_string(),
                stderr: String::new(),
            },
        }
    }
}

impl From<SpeechError> for ApplicationError {
    fn from(err: SpeechError) -> Self {
        Self::ValidationError(err.to_string())
    }
}

impl From<VoiceError> for ApplicationError {
    fn from(err: VoiceError) -> Self {
        Self::VoiceResolution(err.to_string())
    }
}

impl From<TranscodeError> for ApplicationError {
    fn from(err: TranscodeError) -> Self {
        Self::Transcode(err.to_string())
    }
}

impl From<CacheError> for ApplicationError {
    fn from(err: CacheError) -> Self {
        Self::CacheWrite(err.to_string())
    }
}

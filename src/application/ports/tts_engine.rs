//! TTS Engine Port - 冷热两条合成通道的抽象
//!
//! - WarmEngine: 常驻、非线程安全的合成资源（阻塞调用，必须在专用线程上执行）
//! - ColdLanePort: 每次请求独立的隔离合成（子进程）

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::ModelId;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    IoError(String),

    /// 子进程启动失败、非零退出或没有产出音频
    #[error("{message}")]
    ProcessFailed {
        message: String,
        exit_code: Option<i32>,
        /// 子进程 stderr 末尾（诊断用）
        stderr: String,
    },
}

/// 一次合成所需的全部输入
///
/// 冷通道拿到的是自己的一份拷贝，不与其他请求共享任何状态
#[derive(Debug, Clone)]
pub struct EngineRequest {
    /// 要合成的文本
    pub text: String,
    /// 语言标签（仅克隆类模型使用）
    pub language: String,
    /// 参考音频路径（仅克隆类模型使用）
    pub reference_path: PathBuf,
    /// 语速倍率
    pub speed: f32,
    /// 激活模型
    pub model: ModelId,
}

/// 常驻合成引擎
///
/// 同一时刻只允许一个调用者使用（`&mut self`）；调用阻塞直到合成结束，
/// 一旦开始无法取消
pub trait WarmEngine: Send {
    /// 已加载的模型
    fn model(&self) -> &ModelId;

    /// 合成并把原始 WAV 写入 `output`
    fn synthesize(&mut self, request: &EngineRequest, output: &Path) -> Result<(), TtsError>;
}

/// 冷通道：进程隔离的按需合成
#[async_trait]
pub trait ColdLanePort: Send + Sync {
    /// 合成并把原始 WAV 写入 `output`
    async fn run(&self, request: &EngineRequest, output: &Path) -> Result<(), TtsError>;
}

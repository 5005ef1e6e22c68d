//! Voice Resolver Port - 音色解析
//!
//! 音色选择 → (缓存 key 用的音色标识, 参考音频路径)

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use thiserror::Error;

use crate::domain::VoiceSelector;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Failed to materialize uploaded reference audio: {0}")]
    UploadFailed(String),
}

/// 解析后的参考音频
///
/// 内联上传的参考音频由本请求独占，随 `VoiceReference` 释放而删除
#[derive(Debug)]
pub struct VoiceReference {
    voice_id: String,
    reference_path: PathBuf,
    fallback: bool,
    ephemeral: Option<TempPath>,
}

impl VoiceReference {
    /// 内置音色（共享、只读）
    pub fn catalog(voice_id: impl Into<String>, reference_path: PathBuf, fallback: bool) -> Self {
        Self {
            voice_id: voice_id.into(),
            reference_path,
            fallback,
            ephemeral: None,
        }
    }

    /// 上传的参考音频（请求独占）
    pub fn ephemeral(voice_id: impl Into<String>, file: TempPath) -> Self {
        Self {
            voice_id: voice_id.into(),
            reference_path: file.to_path_buf(),
            fallback: false,
            ephemeral: Some(file),
        }
    }

    /// 参与缓存 key 的音色标识
    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }

    pub fn reference_path(&self) -> &Path {
        &self.reference_path
    }

    /// 是否回退到了默认音色
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    pub fn is_ephemeral(&self) -> bool {
        self.ephemeral.is_some()
    }
}

/// Voice Resolver Port
#[async_trait]
pub trait VoiceResolverPort: Send + Sync {
    /// 解析音色；命名音色不存在时回退到默认音色，不会失败
    async fn resolve(&self, selector: &VoiceSelector) -> Result<VoiceReference, VoiceError>;
}

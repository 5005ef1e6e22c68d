//! Audio Cache Port - 内容寻址的合成结果缓存
//!
//! 布局：`{cache_dir}/{hex_digest}.{format}`，没有索引文件，
//! 文件存在即元数据

use async_trait::async_trait;
use std::path::PathBuf;
use tempfile::TempPath;
use thiserror::Error;

use crate::domain::{AudioFormat, ModelId};

/// Audio Cache 错误
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Failed to publish {path}: {reason}")]
    PublishFailed { path: PathBuf, reason: String },
}

/// 请求指纹
///
/// 指纹相同的两个请求视为等价，必须命中同一个缓存文件
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    digest: String,
    format: AudioFormat,
}

impl CacheKey {
    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }

    /// 最终发布的文件名
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.digest, self.format.extension())
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

/// 缓存条目：一经发布不再修改
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub path: PathBuf,
    pub format: AudioFormat,
}

/// 字段分隔符，避免 "ab"+"c" 与 "a"+"bc" 碰撞
const FIELD_SEPARATOR: char = '\u{1f}';

/// 生成缓存 key
///
/// md5(trim(text), voice_id, speed, format, language, model)
pub fn generate_cache_key(
    text: &str,
    voice_id: &str,
    speed: f32,
    format: AudioFormat,
    language: &str,
    model: &ModelId,
) -> CacheKey {
    let material = [
        text.trim().to_string(),
        voice_id.to_string(),
        format!("{:.3}", speed),
        format.extension().to_string(),
        language.to_string(),
        model.as_str().to_string(),
    ]
    .join(&FIELD_SEPARATOR.to_string());

    CacheKey {
        digest: format!("{:x}", md5::compute(material.as_bytes())),
        format,
    }
}

/// Audio Cache Port
#[async_trait]
pub trait AudioCachePort: Send + Sync {
    /// 仅检查存在性；命中即表示文件已完整写入，可直接返回
    async fn lookup(&self, key: &CacheKey) -> Option<CacheEntry>;

    /// 在缓存目录中预留一个私有暂存文件，转码输出写到这里
    async fn stage(&self, key: &CacheKey) -> Result<TempPath, CacheError>;

    /// 把暂存文件发布到最终文件名
    ///
    /// 先发布者胜出：若同 key 已存在，丢弃暂存文件并返回已有条目
    async fn store(&self, key: &CacheKey, staged: TempPath) -> Result<CacheEntry, CacheError>;
}

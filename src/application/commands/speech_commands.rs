//! Speech Commands - 语音合成命令

use serde::Serialize;

use crate::application::ports::{CacheEntry, CacheKey};
use crate::domain::SynthesisRequest;

/// 合成语音命令
#[derive(Debug, Clone)]
pub struct SynthesizeSpeech {
    pub request: SynthesisRequest,
}

/// 结果由哪条路径产出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisLane {
    /// 缓存命中，未合成
    Cache,
    /// 常驻引擎
    Warm,
    /// 子进程
    Cold,
}

impl SynthesisLane {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisLane::Cache => "cache",
            SynthesisLane::Warm => "warm",
            SynthesisLane::Cold => "cold",
        }
    }
}

impl std::fmt::Display for SynthesisLane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 合成语音响应
#[derive(Debug, Clone)]
pub struct SynthesizeSpeechResponse {
    pub artifact: CacheEntry,
    pub lane: SynthesisLane,
    pub cache_key: CacheKey,
}

//! Speech Context - 模型标识

use serde::{Deserialize, Serialize};

/// 支持参考音频克隆的模型架构关键字
const CLONING_ARCHITECTURES: &[&str] = &["xtts", "your_tts"];

/// 当前激活的合成模型标识
///
/// 参与缓存 key 计算：切换模型后旧缓存自然失效
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelId(String);

impl ModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 模型是否接受参考音频 + 语言参数
    pub fn supports_voice_cloning(&self) -> bool {
        let id = self.0.to_lowercase();
        CLONING_ARCHITECTURES.iter().any(|arch| id.contains(arch))
    }
}

impl ModelId {
    /// 加载后是否需要预热（仅 XTTS 架构）
    pub fn needs_warm_up(&self) -> bool {
        self.0.to_lowercase().contains("xtts")
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cloning_models() {
        assert!(ModelId::new("tts_models/multilingual/multi-dataset/xtts_v2").supports_voice_cloning());
        assert!(ModelId::new("tts_models/multilingual/multi-dataset/YOUR_TTS").supports_voice_cloning());
        assert!(!ModelId::new("tts_models/en/ljspeech/tacotron2-DDC").supports_voice_cloning());
    }

    #[test]
    fn test_only_xtts_needs_warm_up() {
        assert!(ModelId::new("tts_models/multilingual/multi-dataset/XTTS_v2").needs_warm_up());
        assert!(!ModelId::new("tts_models/multilingual/multi-dataset/your_tts").needs_warm_up());
    }
}

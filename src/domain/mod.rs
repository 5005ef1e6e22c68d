//! Domain Layer - 领域层
//!
//! 包含两个限界上下文:
//! - Speech Context: 合成请求、输出格式、模型能力
//! - Voice Context: 内置音色目录与音色选择

pub mod speech;
pub mod voice;

pub use speech::{AudioFormat, ModelId, SpeechError, SynthesisRequest, DEFAULT_LANGUAGE};
pub use voice::{VoiceSelector, DEFAULT_VOICE};

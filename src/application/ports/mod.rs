//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_cache;
mod audio_transcoder;
mod tts_engine;
mod voice_resolver;

pub use audio_cache::{generate_cache_key, AudioCachePort, CacheEntry, CacheError, CacheKey};
pub use audio_transcoder::{AudioFormat, AudioInfo, AudioTranscoderPort, TranscodeError};
pub use tts_engine::{ColdLanePort, EngineRequest, TtsError, WarmEngine};
pub use voice_resolver::{VoiceError, VoiceReference, VoiceResolverPort};

//! Voice Adapter - 音色解析实现

mod file_voice_resolver;

pub use file_voice_resolver::FsVoiceResolver;

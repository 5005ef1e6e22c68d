//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 内置音色目录（音色名 → 参考音频相对路径）
//! - 请求中的音色选择（命名音色 / 上传参考音频）

pub mod catalog;
mod value_objects;

pub use catalog::DEFAULT_VOICE;
pub use value_objects::VoiceSelector;

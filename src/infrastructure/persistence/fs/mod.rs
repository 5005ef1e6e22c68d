//! 文件系统缓存实现

mod audio_cache;

pub use audio_cache::FsAudioCache;

//! Persistence Layer - 数据持久化
//!
//! 文件系统缓存实现

pub mod fs;

pub use self::fs::FsAudioCache;

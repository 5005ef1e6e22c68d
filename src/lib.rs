//! speechlane - 冷热双通道语音合成服务
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Speech: 合成请求、输出格式、模型标识
//! - Voice: 内置音色目录与音色选择
//!
//! 应用层 (application/):
//! - Ports: 端口定义（WarmEngine, ColdLane, AudioCache, AudioTranscoder, VoiceResolver）
//! - Warm Lane: 常驻资源的非阻塞互斥访问
//! - Commands: 冷热双通道调度 (LaneRouter)
//! - Queries: 服务状态
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: OpenAI 兼容的 /v1/audio/speech
//! - Persistence: 内容寻址的文件缓存
//! - Adapters: 常驻引擎客户端、冷通道子进程、ffmpeg 转码、音色解析

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};

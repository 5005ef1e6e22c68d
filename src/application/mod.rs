//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（常驻引擎、冷通道、缓存、转码、音色解析）
//! - commands: CQRS 命令及处理器（冷热双通道调度）
//! - queries: CQRS 查询及处理器（服务状态）
//! - warm_lane: 常驻资源守卫
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod warm_lane;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use commands::{
    handlers::{LaneRouter, LaneRouterConfig},
    SynthesisLane, SynthesizeSpeech, SynthesizeSpeechResponse,
};

pub use error::ApplicationError;

pub use ports::{
    // Audio cache
    generate_cache_key,
    AudioCachePort,
    CacheEntry,
    CacheError,
    CacheKey,
    // Transcoder
    AudioInfo,
    AudioTranscoderPort,
    TranscodeError,
    // Lanes
    ColdLanePort,
    EngineRequest,
    TtsError,
    WarmEngine,
    // Voice
    VoiceError,
    VoiceReference,
    VoiceResolverPort,
};

pub use queries::{
    handlers::GetServiceStatusHandler, GetServiceStatus, ServiceStatus,
};

pub use warm_lane::{LaneDecision, WarmLaneState, WarmLease, WarmResourceGuard};

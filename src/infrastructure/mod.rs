//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现

pub mod adapters;
pub mod http;
pub mod persistence;

pub use adapters::{
    load_warm_lane, ColdLaneConfig, FakeWarmEngine, FfmpegTranscoder, FsVoiceResolver,
    HttpWarmEngine, HttpWarmEngineConfig, ProcessColdLane,
};
pub use persistence::FsAudioCache;

//! TTS Adapter - 常驻引擎与冷通道实现

mod cold_lane;
mod fake_tts_client;
mod http_tts_client;
mod loader;

pub use cold_lane::{ColdLaneConfig, ProcessColdLane};
pub use fake_tts_client::{silent_wav, FakeWarmEngine};
pub use http_tts_client::{HttpWarmEngine, HttpWarmEngineConfig};
pub use loader::load_warm_lane;

//! Fake Warm Engine - 用于冒烟测试的常驻引擎
//!
//! 不加载任何模型，按文本长度输出静音 WAV

use std::path::Path;

use crate::application::ports::{EngineRequest, TtsError, WarmEngine};
use crate::domain::ModelId;

/// 每个字符对应的静音时长（毫秒）
const MS_PER_CHAR: u64 = 60;

/// 生成单声道 16-bit PCM 静音 WAV
pub fn silent_wav(sample_rate: u32, duration_ms: u64) -> Vec<u8> {
    let frames = sample_rate as u64 * duration_ms / 1000;
    let data_len = (frames * 2) as u32;
    let byte_rate = sample_rate * 2;

    let mut wav = Vec::with_capacity(44 + data_len as usize);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.resize(44 + data_len as usize, 0);
    wav
}

/// Fake Warm Engine
pub struct FakeWarmEngine {
    model: ModelId,
    sample_rate: u32,
}

impl FakeWarmEngine {
    pub fn new(model: ModelId) -> Self {
        tracing::info!(model = %model, "FakeWarmEngine initialized");
        Self {
            model,
            sample_rate: 24_000,
        }
    }
}

impl WarmEngine for FakeWarmEngine {
    fn model(&self) -> &ModelId {
        &self.model
    }

    fn synthesize(&mut self, request: &EngineRequest, output: &Path) -> Result<(), TtsError> {
        let duration_ms = (request.text.chars().count() as u64 * MS_PER_CHAR).max(200);

        tracing::debug!(
            text_len = request.text.len(),
            duration_ms = duration_ms,
            "FakeWarmEngine: writing silence"
        );

        std::fs::write(output, silent_wav(self.sample_rate, duration_ms))
            .map_err(|e| TtsError::IoError(e.to_string()))
    }
}

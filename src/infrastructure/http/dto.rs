//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::{SynthesizeSpeech, WarmLaneState};
use crate::domain::{AudioFormat, SynthesisRequest, VoiceSelector, DEFAULT_VOICE};
use crate::infrastructure::http::error::ApiError;

// ============================================================================
// Speech DTOs
// ============================================================================

/// OpenAI 兼容的语音合成请求
///
/// multipart 表单使用相同字段，另外可以带 `custom_voice_file`
#[derive(Debug, Clone, Deserialize)]
pub struct SpeechRequest {
    /// 兼容字段，接受但忽略
    #[serde(default = "default_model")]
    pub model: String,
    pub input: String,
    #[serde(default = "default_voice")]
    pub voice: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default = "default_response_format")]
    pub response_format: String,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_model() -> String {
    "tts-1".to_string()
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_response_format() -> String {
    "mp3".to_string()
}

fn default_speed() -> f32 {
    1.0
}

impl SpeechRequest {
    /// 只有 `input` 的请求，其余字段取默认值
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            model: default_model(),
            input: input.into(),
            voice: default_voice(),
            language: None,
            response_format: default_response_format(),
            speed: default_speed(),
        }
    }

    /// 校验并转换为命令；非空的上传音频优先于 `voice`
    pub fn into_command(self, upload: Option<Vec<u8>>) -> Result<SynthesizeSpeech, ApiError> {
        let format: AudioFormat = self
            .response_format
            .parse()
            .map_err(|e: crate::domain::SpeechError| ApiError::BadRequest(e.to_string()))?;

        let voice = match upload {
            Some(bytes) if !bytes.is_empty() => VoiceSelector::upload(bytes),
            _ => VoiceSelector::named(self.voice),
        };

        let request = SynthesisRequest::new(self.input, voice, self.language, self.speed, format)
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        Ok(SynthesizeSpeech { request })
    }
}

// ============================================================================
// Ping DTOs
// ============================================================================

/// Ping 响应
#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub model: String,
    pub warm_lane: WarmLaneState,
    pub timestamp: String,
}

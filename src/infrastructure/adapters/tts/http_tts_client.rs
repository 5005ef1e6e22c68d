//! HTTP Warm Engine - 常驻合成服务客户端
//!
//! 模型常驻在同机的合成进程里，本客户端是它在本进程中的句柄。
//! 调用是阻塞的，只能在专用阻塞线程上使用（见 `spawn_blocking`）。
//!
//! 外部 TTS API:
//! POST {base_url}/api/tts
//! Request: {"text": "...", "model": "...", "speed": 1.0, "speaker_wav": "...", "language": "en"}
//! Response: audio/wav binary
//!
//! GET {base_url}/health

use reqwest::blocking::Client;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;

use crate::application::ports::{EngineRequest, TtsError, WarmEngine};
use crate::domain::ModelId;

/// TTS 推理请求体 (JSON)
#[derive(Debug, Serialize, PartialEq)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    model: &'a str,
    speed: f32,
    /// 仅声音克隆模型需要
    #[serde(skip_serializing_if = "Option::is_none")]
    speaker_wav: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language: Option<&'a str>,
}

impl<'a> TtsHttpRequest<'a> {
    fn from_request(request: &'a EngineRequest) -> Self {
        let cloning = request.model.supports_voice_cloning();
        Self {
            text: &request.text,
            model: request.model.as_str(),
            speed: request.speed,
            speaker_wav: cloning.then(|| request.reference_path.to_string_lossy().to_string()),
            language: cloning.then_some(request.language.as_str()),
        }
    }
}

/// HTTP Warm Engine 配置
#[derive(Debug, Clone)]
pub struct HttpWarmEngineConfig {
    /// 常驻服务基础 URL
    pub base_url: String,
    /// 单次合成超时时间（秒）
    pub timeout_secs: u64,
    /// 常驻服务加载的模型
    pub model: ModelId,
}

impl Default for HttpWarmEngineConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5200".to_string(),
            timeout_secs: 300,
            model: ModelId::new("tts_models/multilingual/multi-dataset/xtts_v2"),
        }
    }
}

impl HttpWarmEngineConfig {
    pub fn new(base_url: impl Into<String>, model: ModelId) -> Self {
        Self {
            base_url: base_url.into(),
            model,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP Warm Engine
pub struct HttpWarmEngine {
    client: Client,
    config: HttpWarmEngineConfig,
}

impl HttpWarmEngine {
    /// 连接常驻服务，健康检查失败即返回错误
    pub fn connect(config: HttpWarmEngineConfig) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        let engine = Self { client, config };
        engine.health_check()?;

        tracing::info!(
            base_url = %engine.config.base_url,
            model = %engine.config.model,
            "Warm engine connected"
        );
        Ok(engine)
    }

    /// 获取推理 URL
    fn synthesize_url(&self) -> String {
        format!("{}/api/tts", self.config.base_url.trim_end_matches('/'))
    }

    /// 获取健康检查 URL
    fn health_url(&self) -> String {
        format!("{}/health", self.config.base_url.trim_end_matches('/'))
    }

    fn health_check(&self) -> Result<(), TtsError> {
        let response = self
            .client
            .get(self.health_url())
            .timeout(Duration::from_secs(5))
            .send()
            .map_err(|e| map_send_error(e, 5))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(TtsError::ServiceError(format!(
                "Health check returned HTTP {}",
                response.status()
            )))
        }
    }
}

fn map_send_error(err: reqwest::Error, timeout_secs: u64) -> TtsError {
    if err.is_timeout() {
        TtsError::Timeout(Duration::from_secs(timeout_secs))
    } else if err.is_connect() {
        TtsError::NetworkError(format!("Cannot connect to warm engine: {}", err))
    } else {
        TtsError::NetworkError(err.to_string())
    }
}

impl WarmEngine for HttpWarmEngine {
    fn model(&self) -> &ModelId {
        &self.config.model
    }

    fn synthesize(&mut self, request: &EngineRequest, output: &Path) -> Result<(), TtsError> {
        let body = TtsHttpRequest::from_request(request);

        tracing::debug!(
            url = %self.synthesize_url(),
            text_len = body.text.len(),
            speaker_wav = ?body.speaker_wav,
            "Sending warm synthesis request"
        );

        let response = self
            .client
            .post(self.synthesize_url())
            .json(&body)
            .send()
            .map_err(|e| map_send_error(e, self.config.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let audio = response
            .bytes()
            .map_err(|e| TtsError::InvalidResponse(format!("Failed to read audio: {}", e)))?;
        if audio.is_empty() {
            return Err(TtsError::InvalidResponse("Empty audio body".to_string()));
        }

        std::fs::write(output, &audio).map_err(|e| TtsError::IoError(e.to_string()))?;

        tracing::debug!(audio_size = audio.len(), "Warm synthesis response written");
        Ok(())
    }
}

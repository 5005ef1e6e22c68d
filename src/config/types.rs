//! Configuration Types
//!
//! 定义所有配置结构体

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 模型配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 常驻通道配置
    #[serde(default)]
    pub warm: WarmConfig,

    /// 冷通道配置
    #[serde(default)]
    pub cold: ColdConfig,

    /// 调度配置
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 转码配置
    #[serde(default)]
    pub transcode: TranscodeConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 请求体上限（字节），包含上传的参考音频
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5100
}

fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024 // 50 MB
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// 获取服务器地址
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 模型配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    /// 激活模型标识（两条通道共用，参与缓存 key）
    #[serde(default = "default_model")]
    pub model: String,
}

pub(crate) fn default_model() -> String {
    "tts_models/multilingual/multi-dataset/xtts_v2".to_string()
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
        }
    }
}

/// 常驻引擎后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarmBackend {
    /// 通过 HTTP 访问的常驻合成进程
    #[default]
    Http,
    /// 输出静音 WAV，用于冒烟测试
    Fake,
    /// 不加载常驻引擎，全部走冷通道
    Disabled,
}

/// 常驻通道配置
#[derive(Debug, Clone, Deserialize)]
pub struct WarmConfig {
    #[serde(default)]
    pub backend: WarmBackend,

    /// 常驻合成服务基础 URL
    #[serde(default = "default_warm_url")]
    pub url: String,

    /// 单次合成超时（秒）
    #[serde(default = "default_warm_timeout")]
    pub timeout_secs: u64,

    /// 预热文本
    #[serde(default = "default_warmup_text")]
    pub warmup_text: String,

    /// 预热音色
    #[serde(default = "default_warmup_voice")]
    pub warmup_voice: String,
}

fn default_warm_url() -> String {
    "http://127.0.0.1:5200".to_string()
}

fn default_warm_timeout() -> u64 {
    300
}

fn default_warmup_text() -> String {
    "System online.".to_string()
}

fn default_warmup_voice() -> String {
    "jarvis".to_string()
}

impl Default for WarmConfig {
    fn default() -> Self {
        Self {
            backend: WarmBackend::default(),
            url: default_warm_url(),
            timeout_secs: default_warm_timeout(),
            warmup_text: default_warmup_text(),
            warmup_voice: default_warmup_voice(),
        }
    }
}

/// 冷通道配置
#[derive(Debug, Clone, Deserialize)]
pub struct ColdConfig {
    /// Python 解释器
    #[serde(default = "default_python")]
    pub python: PathBuf,

    /// 合成 CLI 脚本
    #[serde(default = "default_script")]
    pub script: PathBuf,

    #[serde(default = "default_use_cuda")]
    pub use_cuda: bool,

    /// 子进程超时（秒），0 表示不限制
    #[serde(default = "default_cold_timeout")]
    pub timeout_secs: u64,
}

fn default_python() -> PathBuf {
    PathBuf::from("/usr/local/lib/coqui/bin/python")
}

fn default_script() -> PathBuf {
    PathBuf::from("/usr/local/lib/coqui/bin/tts")
}

fn default_use_cuda() -> bool {
    true
}

fn default_cold_timeout() -> u64 {
    600
}

impl Default for ColdConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            script: default_script(),
            use_cuda: default_use_cuda(),
            timeout_secs: default_cold_timeout(),
        }
    }
}

impl ColdConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

/// 调度配置
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    /// 同时处理的最大请求数
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

fn default_max_in_flight() -> usize {
    16
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 合成结果缓存目录
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// 模型下载目录（冷通道的 TTS_HOME）
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// 内置音色参考音频目录
    #[serde(default = "default_voice_dir")]
    pub voice_dir: PathBuf,

    /// 临时文件目录，未设置时使用系统临时目录
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("/opt/ai/cache/coqui-tts-audio")
}

fn default_model_dir() -> PathBuf {
    PathBuf::from("/opt/ai/models/speech/coqui-tts")
}

fn default_voice_dir() -> PathBuf {
    PathBuf::from("/opt/ai/assets/voices")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            model_dir: default_model_dir(),
            voice_dir: default_voice_dir(),
            work_dir: None,
        }
    }
}

impl StorageConfig {
    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// 转码配置
#[derive(Debug, Clone, Deserialize)]
pub struct TranscodeConfig {
    /// ffmpeg 可执行文件
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

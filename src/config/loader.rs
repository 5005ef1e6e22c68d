//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 命令行参数
//! 2. 兼容旧部署的环境变量（`AUDIO_CACHE_DIR`、`TTS_HOME`、`VOICE_ASSET_DIR`、`DEBUG`）
//! 3. 环境变量（前缀 `SPEECHLANE_`）
//! 4. 配置文件（config.toml）
//! 5. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::PathBuf;
use thiserror::Error;

use super::types::{AppConfig, WarmBackend};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 旧部署使用的环境变量 → 配置键
const LEGACY_PATH_VARS: &[(&str, &str)] = &[
    ("AUDIO_CACHE_DIR", "storage.cache_dir"),
    ("TTS_HOME", "storage.model_dir"),
    ("VOICE_ASSET_DIR", "storage.voice_dir"),
];

/// 命令行覆盖项
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// 显式指定的配置文件（必须存在）
    pub config_path: Option<PathBuf>,
    pub model: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    /// 强制 debug 日志
    pub debug: bool,
}

/// 加载应用配置
///
/// # 环境变量示例
/// - `SPEECHLANE_SERVER__PORT=5100`
/// - `SPEECHLANE_WARM__BACKEND=disabled`
/// - `SPEECHLANE_COLD__TIMEOUT_SECS=900`
/// - `SPEECHLANE_STORAGE__CACHE_DIR=/var/cache/speechlane`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_with(&ConfigOverrides::default())
}

/// 加载配置并应用命令行覆盖
pub fn load_config_with(overrides: &ConfigOverrides) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 5100)?
        .set_default("server.max_body_bytes", 50 * 1024 * 1024)?
        .set_default("tts.model", super::types::default_model())?
        .set_default("warm.backend", "http")?
        .set_default("warm.url", "http://127.0.0.1:5200")?
        .set_default("warm.timeout_secs", 300)?
        .set_default("warm.warmup_text", "System online.")?
        .set_default("warm.warmup_voice", "jarvis")?
        .set_default("cold.python", "/usr/local/lib/coqui/bin/python")?
        .set_default("cold.script", "/usr/local/lib/coqui/bin/tts")?
        .set_default("cold.use_cuda", true)?
        .set_default("cold.timeout_secs", 600)?
        .set_default("dispatch.max_in_flight", 16)?
        .set_default("storage.cache_dir", "/opt/ai/cache/coqui-tts-audio")?
        .set_default("storage.model_dir", "/opt/ai/models/speech/coqui-tts")?
        .set_default("storage.voice_dir", "/opt/ai/assets/voices")?
        .set_default("transcode.ffmpeg", "ffmpeg")?
        .set_default("log.level", "info")?;

    // 2. 配置文件
    if let Some(path) = overrides.config_path.as_deref() {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量
    // 前缀: SPEECHLANE_，层级分隔符: __ (双下划线)
    builder = builder.add_source(
        Environment::with_prefix("SPEECHLANE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    // 4. 旧环境变量
    for (key, value) in legacy_env_overrides(|name| std::env::var(name).ok()) {
        builder = builder.set_override(key, value)?;
    }

    // 5. 命令行
    builder = builder
        .set_override_option("tts.model", overrides.model.clone())?
        .set_override_option("server.host", overrides.host.clone())?
        .set_override_option("server.port", overrides.port.map(i64::from))?;
    if overrides.debug {
        builder = builder.set_override("log.level", "debug")?;
    }

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 解析旧环境变量
///
/// 空值忽略；`DEBUG` 为 true/1/yes 时把日志级别提到 debug
pub(crate) fn legacy_env_overrides(
    lookup: impl Fn(&str) -> Option<String>,
) -> Vec<(&'static str, String)> {
    let mut overrides: Vec<(&'static str, String)> = LEGACY_PATH_VARS
        .iter()
        .filter_map(|(var, key)| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (*key, value))
        })
        .collect();

    let debug = lookup("DEBUG")
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false);
    if debug {
        overrides.push(("log.level", "debug".to_string()));
    }

    overrides
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.tts.model.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Model identifier cannot be empty".to_string(),
        ));
    }

    if config.dispatch.max_in_flight == 0 {
        return Err(ConfigError::ValidationError(
            "dispatch.max_in_flight cannot be 0".to_string(),
        ));
    }

    if config.warm.backend == WarmBackend::Http && config.warm.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Warm lane URL cannot be empty when backend is http".to_string(),
        ));
    }

    if config.cold.python.as_os_str().is_empty() || config.cold.script.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Cold lane python and script cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Max Body: {} bytes", config.server.max_body_bytes);
    tracing::info!("Model: {}", config.tts.model);
    tracing::info!("Warm Backend: {:?}", config.warm.backend);
    if config.warm.backend == WarmBackend::Http {
        tracing::info!("Warm URL: {}", config.warm.url);
        tracing::info!("Warm Timeout: {}s", config.warm.timeout_secs);
    }
    tracing::info!("Cold Python: {:?}", config.cold.python);
    tracing::info!("Cold Script: {:?}", config.cold.script);
    tracing::info!("Cold CUDA: {}", config.cold.use_cuda);
    match config.cold.timeout() {
        Some(timeout) => tracing::info!("Cold Timeout: {}s", timeout.as_secs()),
        None => tracing::info!("Cold Timeout: none"),
    }
    tracing::info!("Max In Flight: {}", config.dispatch.max_in_flight);
    tracing::info!("Cache Directory: {:?}", config.storage.cache_dir);
    tracing::info!("Model Directory: {:?}", config.storage.model_dir);
    tracing::info!("Voice Directory: {:?}", config.storage.voice_dir);
    tracing::info!("Work Directory: {:?}", config.storage.work_dir());
    tracing::info!("ffmpeg: {:?}", config.transcode.ffmpeg);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_model() {
        let mut config = AppConfig::default();
        config.tts.model = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_pool() {
        let mut config = AppConfig::default();
        config.dispatch.max_in_flight = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_empty_warm_url_only_matters_for_http_backend() {
        let mut config = AppConfig::default();
        config.warm.url = String::new();
        assert!(validate_config(&config).is_err());

        config.warm.backend = WarmBackend::Disabled;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_legacy_env_maps_to_storage_keys() {
        let overrides = legacy_env_overrides(lookup(&[
            ("AUDIO_CACHE_DIR", "/srv/cache"),
            ("TTS_HOME", "/srv/models"),
            ("VOICE_ASSET_DIR", ""),
        ]));

        assert_eq!(
            overrides,
            vec![
                ("storage.cache_dir", "/srv/cache".to_string()),
                ("storage.model_dir", "/srv/models".to_string()),
            ]
        );
    }

    #[test]
    fn test_legacy_debug_flag() {
        assert!(legacy_env_overrides(lookup(&[("DEBUG", "True")]))
            .contains(&("log.level", "debug".to_string())));
        assert!(legacy_env_overrides(lookup(&[("DEBUG", "false")])).is_empty());
    }

    #[test]
    fn test_file_and_command_line_layers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speechlane.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 6000

[warm]
backend = "disabled"

[cold]
timeout_secs = 0
"#,
        )
        .unwrap();

        let config = load_config_with(&ConfigOverrides {
            config_path: Some(path),
            model: Some("tts_models/multilingual/multi-dataset/your_tts".to_string()),
            host: Some("0.0.0.0".to_string()),
            port: None,
            debug: true,
        })
        .unwrap();

        assert_eq!(config.server.addr(), "0.0.0.0:6000");
        assert_eq!(config.tts.model, "tts_models/multilingual/multi-dataset/your_tts");
        assert_eq!(config.warm.backend, WarmBackend::Disabled);
        assert_eq!(config.cold.timeout(), None);
        assert_eq!(config.log.level, "debug");
    }

    #[test]
    fn test_missing_explicit_config_file_fails() {
        let result = load_config_with(&ConfigOverrides {
            config_path: Some(PathBuf::from("/nonexistent/speechlane.toml")),
            ..Default::default()
        });
        assert!(result.is_err());
    }
}

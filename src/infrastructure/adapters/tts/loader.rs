//! Warm Lane Loader - 启动时加载常驻引擎
//!
//! 连接与预热都是阻塞操作，放在专用阻塞线程上执行。
//! 任何一步失败都只记录日志：服务照常启动，所有请求走冷通道。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{FakeWarmEngine, HttpWarmEngine, HttpWarmEngineConfig};
use crate::application::ports::{EngineRequest, TtsError, WarmEngine};
use crate::application::warm_lane::WarmResourceGuard;
use crate::config::{WarmBackend, WarmConfig};
use crate::domain::voice::catalog;
use crate::domain::{ModelId, DEFAULT_LANGUAGE};

/// 加载常驻引擎并装入守卫，返回是否有新引擎装入
pub async fn load_warm_lane(
    guard: Arc<WarmResourceGuard>,
    config: &WarmConfig,
    model: ModelId,
    voice_dir: &Path,
) -> bool {
    if config.backend == WarmBackend::Disabled {
        tracing::info!("Warm lane disabled, routing all traffic to cold lane");
        return false;
    }

    let config = config.clone();
    let warmup_reference = catalog::reference_for(&config.warmup_voice).map(|p| voice_dir.join(p));

    let loaded = tokio::task::spawn_blocking(move || {
        let mut engine = connect(&config, model)?;
        warm_up(engine.as_mut(), &config.warmup_text, warmup_reference)?;
        Ok::<_, TtsError>(guard.install(engine))
    })
    .await;

    match loaded {
        Ok(Ok(installed)) => installed,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Warm lane unavailable, routing all traffic to cold lane");
            false
        }
        Err(e) => {
            tracing::error!(error = %e, "Warm lane loader aborted");
            false
        }
    }
}

fn connect(config: &WarmConfig, model: ModelId) -> Result<Box<dyn WarmEngine>, TtsError> {
    match config.backend {
        WarmBackend::Http => {
            let http = HttpWarmEngineConfig::new(config.url.clone(), model)
                .with_timeout(config.timeout_secs);
            Ok(Box::new(HttpWarmEngine::connect(http)?))
        }
        WarmBackend::Fake => Ok(Box::new(FakeWarmEngine::new(model))),
        WarmBackend::Disabled => Err(TtsError::ServiceError("Warm lane disabled".to_string())),
    }
}

/// 合成一次并丢弃结果
///
/// 只对 XTTS 模型、且预热音色文件存在时执行
fn warm_up(
    engine: &mut dyn WarmEngine,
    text: &str,
    reference: Option<PathBuf>,
) -> Result<(), TtsError> {
    let model = engine.model().clone();
    if !model.needs_warm_up() {
        return Ok(());
    }
    let Some(reference) = reference.filter(|p| p.is_file()) else {
        tracing::debug!("Warm-up voice asset not found, skipping warm-up");
        return Ok(());
    };

    let output = tempfile::Builder::new()
        .prefix("tts_warmup_")
        .suffix(".wav")
        .tempfile()
        .map_err(|e| TtsError::IoError(e.to_string()))?
        .into_temp_path();

    let request = EngineRequest {
        text: text.to_string(),
        language: DEFAULT_LANGUAGE.to_string(),
        reference_path: reference,
        speed: 1.0,
        model,
    };

    let started = std::time::Instant::now();
    engine.synthesize(&request, &output)?;
    tracing::info!(
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Warm-up synthesis completed"
    );
    Ok(())
}

//! Speech Command Handlers - 冷热双通道调度器 (Lane Router)
//!
//! 每个请求的状态机：
//! `Resolving → CacheCheck → {WarmAttempt | ColdLane} → Transcoding → Done | Failed`
//!
//! - 缓存命中直接结束，不合成也不转码，也不占用并发名额
//! - 未命中时非阻塞尝试常驻引擎；繁忙或未加载一律溢出到冷通道，不排队也不拒绝
//! - 阻塞的常驻合成交给 `spawn_blocking` 专用线程，异步调度线程不会被卡住
//! - 临时波形与上传的参考音频由请求独占，任何退出路径都会删除
//! - 同 key 的并发未命中不做合并，各自合成，先发布者胜出

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempPath;
use tokio::sync::Semaphore;
use tracing::Instrument;
use uuid::Uuid;

use crate::application::commands::{SynthesisLane, SynthesizeSpeech, SynthesizeSpeechResponse};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    generate_cache_key, AudioCachePort, AudioTranscoderPort, ColdLanePort, EngineRequest,
    VoiceReference, VoiceResolverPort,
};
use crate::application::warm_lane::{LaneDecision, WarmLease, WarmResourceGuard};
use crate::domain::SynthesisRequest;

/// 调度器配置
#[derive(Debug, Clone)]
pub struct LaneRouterConfig {
    /// 临时波形、上传参考音频的目录
    pub work_dir: PathBuf,
    /// 同时合成的最大请求数（缓存命中不计入）
    pub max_in_flight: usize,
}

impl Default for LaneRouterConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir(),
            max_in_flight: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DispatchState {
    Resolving,
    CacheCheck,
    WarmAttempt,
    ColdLane,
    Transcoding,
    Done,
    Failed,
}

impl DispatchState {
    fn as_str(&self) -> &'static str {
        match self {
            DispatchState::Resolving => "resolving",
            DispatchState::CacheCheck => "cache_check",
            DispatchState::WarmAttempt => "warm_attempt",
            DispatchState::ColdLane => "cold_lane",
            DispatchState::Transcoding => "transcoding",
            DispatchState::Done => "done",
            DispatchState::Failed => "failed",
        }
    }
}

fn enter(state: DispatchState) {
    tracing::debug!(state = state.as_str(), "Dispatch state");
}

/// Lane Router - SynthesizeSpeech Handler
#[derive(Clone)]
pub struct LaneRouter {
    voices: Arc<dyn VoiceResolverPort>,
    cache: Arc<dyn AudioCachePort>,
    warm: Arc<WarmResourceGuard>,
    cold: Arc<dyn ColdLanePort>,
    transcoder: Arc<dyn AudioTranscoderPort>,
    work_dir: PathBuf,
    permits: Arc<Semaphore>,
}

impl LaneRouter {
    pub fn new(
        config: LaneRouterConfig,
        voices: Arc<dyn VoiceResolverPort>,
        cache: Arc<dyn AudioCachePort>,
        warm: Arc<WarmResourceGuard>,
        cold: Arc<dyn ColdLanePort>,
        transcoder: Arc<dyn AudioTranscoderPort>,
    ) -> Self {
        Self {
            voices,
            cache,
            warm,
            cold,
            transcoder,
            work_dir: config.work_dir,
            permits: Arc::new(Semaphore::new(config.max_in_flight.max(1))),
        }
    }

    pub fn warm_lane(&self) -> &Arc<WarmResourceGuard> {
        &self.warm
    }

    pub async fn handle(
        &self,
        command: SynthesizeSpeech,
    ) -> Result<SynthesizeSpeechResponse, ApplicationError> {
        let span = tracing::info_span!("dispatch", request_id = %Uuid::new_v4());

        async move {
            let started = Instant::now();
            let result = self.dispatch(command.request).await;

            match &result {
                Ok(response) => tracing::info!(
                    state = DispatchState::Done.as_str(),
                    lane = %response.lane,
                    cache_key = %response.cache_key,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Speech request completed"
                ),
                Err(e) => tracing::warn!(
                    state = DispatchState::Failed.as_str(),
                    error = %e,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Speech request failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn dispatch(
        &self,
        request: SynthesisRequest,
    ) -> Result<SynthesizeSpeechResponse, ApplicationError> {
        enter(DispatchState::Resolving);
        let voice = self.voices.resolve(request.voice()).await?;
        if voice.is_fallback() {
            tracing::warn!(
                requested = ?request.voice(),
                voice_id = %voice.voice_id(),
                "Voice resolution fell back to default voice"
            );
        }

        let model = self.warm.active_model();
        let cache_key = generate_cache_key(
            request.text(),
            voice.voice_id(),
            request.speed(),
            request.format(),
            request.language(),
            &model,
        );

        enter(DispatchState::CacheCheck);
        if let Some(artifact) = self.cache.lookup(&cache_key).await {
            tracing::debug!(cache_key = %cache_key, "Cache hit");
            return Ok(SynthesizeSpeechResponse {
                artifact,
                lane: SynthesisLane::Cache,
                cache_key,
            });
        }

        tracing::debug!(
            cache_key = %cache_key,
            voice_id = %voice.voice_id(),
            model = %model,
            text_len = request.text().len(),
            "Cache miss"
        );

        // 只有需要合成的请求占用并发名额，缓存命中不排队
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| ApplicationError::internal("Dispatch pool closed"))?;

        let engine_request = EngineRequest {
            text: request.text().to_string(),
            language: request.language().to_string(),
            reference_path: voice.reference_path().to_path_buf(),
            speed: request.speed(),
            model,
        };
        let waveform = self.allocate_waveform()?;
        let (lane, waveform) = self.synthesize(engine_request, voice, waveform).await?;

        enter(DispatchState::Transcoding);
        let info = self.transcoder.probe(&waveform).await?;
        let staged = self.cache.stage(&cache_key).await?;
        let size_bytes = self
            .transcoder
            .convert(&waveform, &staged, cache_key.format())
            .await?;
        let artifact = self.cache.store(&cache_key, staged).await?;

        tracing::debug!(
            lane = %lane,
            duration_ms = info.duration_ms,
            sample_rate = info.sample_rate,
            size_bytes = size_bytes,
            path = %artifact.path.display(),
            "Artifact published"
        );

        Ok(SynthesizeSpeechResponse {
            artifact,
            lane,
            cache_key,
        })
    }

    /// 选择通道并合成原始波形
    async fn synthesize(
        &self,
        request: EngineRequest,
        voice: VoiceReference,
        waveform: TempPath,
    ) -> Result<(SynthesisLane, TempPath), ApplicationError> {
        match self.warm.try_acquire() {
            LaneDecision::Acquired(lease) => {
                enter(DispatchState::WarmAttempt);
                let waveform = run_warm(lease, request, voice, waveform).await?;
                Ok((SynthesisLane::Warm, waveform))
            }
            decision => {
                enter(DispatchState::ColdLane);
                tracing::debug!(warm_lane = ?decision, "Overflowing to cold lane");

                self.cold
                    .run(&request, &waveform)
                    .await
                    .map_err(ApplicationError::cold_lane)?;
                drop(voice);

                Ok((SynthesisLane::Cold, waveform))
            }
        }
    }

    fn allocate_waveform(&self) -> Result<TempPath, ApplicationError> {
        tempfile::Builder::new()
            .prefix("tts_")
            .suffix(".wav")
            .tempfile_in(&self.work_dir)
            .map(|file| file.into_temp_path())
            .map_err(|e| {
                ApplicationError::internal(format!(
                    "Failed to allocate temporary waveform in {}: {}",
                    self.work_dir.display(),
                    e
                ))
            })
    }
}

/// 在专用阻塞线程上执行常驻合成
///
/// 租约、参考音频、输出波形一起 move 进线程。调用方放弃等待时合成仍会跑完，
/// 结束后锁在该线程上归还，临时文件随任务输出一起删除。
async fn run_warm(
    mut lease: WarmLease,
    request: EngineRequest,
    voice: VoiceReference,
    waveform: TempPath,
) -> Result<TempPath, ApplicationError> {
    let started = Instant::now();

    let handle = tokio::task::spawn_blocking(move || {
        let result = lease.synthesize(&request, &waveform);
        drop(lease);
        drop(voice);
        result.map(|_| waveform)
    });

    match handle.await {
        Ok(Ok(waveform)) => {
            tracing::debug!(
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Warm synthesis completed"
            );
            Ok(waveform)
        }
        Ok(Err(e)) => Err(ApplicationError::WarmSynthesis(e.to_string())),
        Err(e) => Err(ApplicationError::WarmSynthesis(format!(
            "Warm lane worker aborted: {}",
            e
        ))),
    }
}

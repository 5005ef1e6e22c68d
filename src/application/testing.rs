//! 调度器测试替身
//!
//! 常驻/冷通道用可控的假实现，音色解析与缓存用真实的文件系统实现

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::application::commands::handlers::{LaneRouter, LaneRouterConfig};
use crate::application::commands::SynthesizeSpeech;
use crate::application::ports::{
    AudioFormat, AudioInfo, AudioTranscoderPort, ColdLanePort, EngineRequest, TranscodeError,
    TtsError, WarmEngine,
};
use crate::application::warm_lane::WarmResourceGuard;
use crate::domain::{ModelId, SynthesisRequest, VoiceSelector};
use crate::infrastructure::adapters::transcoder::probe_waveform;
use crate::infrastructure::adapters::tts::silent_wav;
use crate::infrastructure::adapters::voice::FsVoiceResolver;
use crate::infrastructure::persistence::fs::FsAudioCache;

pub(crate) const TEST_MODEL: &str = "tts_models/multilingual/multi-dataset/xtts_v2";

/// 调用计数、并发峰值与收到的请求
#[derive(Clone, Default)]
pub(crate) struct CallCounter {
    calls: Arc<AtomicUsize>,
    inside: Arc<AtomicUsize>,
    max_inside: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<EngineRequest>>>,
}

impl CallCounter {
    fn enter(&self, request: &EngineRequest) {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.inside.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_inside.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.inside.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_inside.load(Ordering::SeqCst)
    }

    /// 通道最近一次收到的请求
    pub fn last_request(&self) -> Option<EngineRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }
}

/// 测试侧的闸门：等待引擎进入合成、放行合成
pub(crate) struct WarmGate {
    entered: UnboundedReceiver<()>,
    release: UnboundedSender<()>,
}

impl WarmGate {
    pub async fn entered(&mut self) {
        self.entered.recv().await;
    }

    pub fn release(&self) {
        let _ = self.release.send(());
    }
}

/// 可控的常驻引擎
pub(crate) struct FakeWarm {
    model: ModelId,
    counter: CallCounter,
    gate: Option<(UnboundedSender<()>, UnboundedReceiver<()>)>,
    delay: Duration,
    fail: bool,
}

impl FakeWarm {
    pub fn new() -> Self {
        Self {
            model: ModelId::new(TEST_MODEL),
            counter: CallCounter::default(),
            gate: None,
            delay: Duration::ZERO,
            fail: false,
        }
    }

    /// 每次合成都停在闸门处，直到测试放行
    pub fn gated() -> (Self, WarmGate) {
        let (entered_tx, entered_rx) = unbounded_channel();
        let (release_tx, release_rx) = unbounded_channel();
        let engine = Self {
            gate: Some((entered_tx, release_rx)),
            ..Self::new()
        };
        (
            engine,
            WarmGate {
                entered: entered_rx,
                release: release_tx,
            },
        )
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl WarmEngine for FakeWarm {
    fn model(&self) -> &ModelId {
        &self.model
    }

    fn synthesize(&mut self, request: &EngineRequest, output: &Path) -> Result<(), TtsError> {
        self.counter.enter(request);

        if let Some((entered, release)) = self.gate.as_mut() {
            let _ = entered.send(());
            let _ = release.blocking_recv();
        }
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let result = if self.fail {
            Err(TtsError::ServiceError(
                "CUDA error: device-side assert triggered".to_string(),
            ))
        } else {
            std::fs::write(output, silent_wav(22_050, 250)).map_err(|e| TtsError::IoError(e.to_string()))
        };

        self.counter.exit();
        result
    }
}

/// 可控的冷通道
pub(crate) struct FakeCold {
    counter: CallCounter,
    payload: Vec<u8>,
    stderr: Option<String>,
    delay: Duration,
}

impl FakeCold {
    pub fn new() -> Self {
        Self {
            counter: CallCounter::default(),
            payload: silent_wav(22_050, 250),
            stderr: None,
            delay: Duration::ZERO,
        }
    }

    pub fn failing(stderr: &str) -> Self {
        Self {
            stderr: Some(stderr.to_string()),
            ..Self::new()
        }
    }

    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl ColdLanePort for FakeCold {
    async fn run(&self, request: &EngineRequest, output: &Path) -> Result<(), TtsError> {
        self.counter.enter(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let result = match &self.stderr {
            Some(stderr) => Err(TtsError::ProcessFailed {
                message: "Coqui CLI exited with status 1".to_string(),
                exit_code: Some(1),
                stderr: stderr.clone(),
            }),
            None => tokio::fs::write(output, &self.payload)
                .await
                .map_err(|e| TtsError::IoError(e.to_string())),
        };

        self.counter.exit();
        result
    }
}

/// 记录请求格式、直接复制文件的转码器
#[derive(Default)]
pub(crate) struct RecordingTranscoder {
    formats: Mutex<Vec<AudioFormat>>,
}

impl RecordingTranscoder {
    pub fn formats(&self) -> Vec<AudioFormat> {
        self.formats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl AudioTranscoderPort for RecordingTranscoder {
    async fn probe(&self, waveform: &Path) -> Result<AudioInfo, TranscodeError> {
        probe_waveform(waveform)
    }

    async fn convert(
        &self,
        input: &Path,
        output: &Path,
        format: AudioFormat,
    ) -> Result<u64, TranscodeError> {
        self.formats
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(format);
        tokio::fs::copy(input, output)
            .await
            .map_err(|e| TranscodeError::IoError(e.to_string()))
    }
}

/// 完整装配的调度器，目录全部位于临时目录
pub(crate) struct Harness {
    _dir: TempDir,
    voice_dir: PathBuf,
    cache_dir: PathBuf,
    work_dir: PathBuf,
    pub router: LaneRouter,
    pub warm: Arc<WarmResourceGuard>,
    pub warm_calls: CallCounter,
    pub cold_calls: CallCounter,
    pub transcoder: Arc<RecordingTranscoder>,
}

impl Harness {
    pub async fn new(warm: Option<FakeWarm>, cold: FakeCold) -> Self {
        Self::with_pool(warm, cold, 16).await
    }

    /// 指定并发合成名额
    pub async fn with_pool(warm: Option<FakeWarm>, cold: FakeCold, max_in_flight: usize) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let voice_dir = dir.path().join("voices");
        let cache_dir = dir.path().join("cache");
        let work_dir = dir.path().join("work");

        std::fs::create_dir_all(voice_dir.join("standard")).unwrap();
        std::fs::create_dir_all(&work_dir).unwrap();
        std::fs::write(
            voice_dir.join("standard/alloy.wav"),
            silent_wav(22_050, 500),
        )
        .unwrap();

        let warm_calls = warm
            .as_ref()
            .map(|engine| engine.counter.clone())
            .unwrap_or_default();
        let cold_calls = cold.counter.clone();

        let guard = Arc::new(match warm {
            Some(engine) => WarmResourceGuard::with_engine(Box::new(engine)),
            None => WarmResourceGuard::new(ModelId::new(TEST_MODEL)),
        });
        let transcoder = Arc::new(RecordingTranscoder::default());

        let router = LaneRouter::new(
            LaneRouterConfig {
                work_dir: work_dir.clone(),
                max_in_flight,
            },
            Arc::new(FsVoiceResolver::new(voice_dir.clone(), work_dir.clone())),
            Arc::new(FsAudioCache::new(&cache_dir).await.unwrap()),
            guard.clone(),
            Arc::new(cold),
            transcoder.clone(),
        );

        Self {
            _dir: dir,
            voice_dir,
            cache_dir,
            work_dir,
            router,
            warm: guard,
            warm_calls,
            cold_calls,
            transcoder,
        }
    }

    pub fn voice_dir(&self) -> &Path {
        &self.voice_dir
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn cache_files(&self) -> Vec<PathBuf> {
        list(&self.cache_dir)
    }

    pub fn work_files(&self) -> Vec<PathBuf> {
        list(&self.work_dir)
    }
}

fn list(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
        .unwrap_or_default()
}

pub(crate) fn speech(text: &str, voice: &str, format: AudioFormat) -> SynthesizeSpeech {
    SynthesizeSpeech {
        request: SynthesisRequest::new(text, VoiceSelector::named(voice), None, 1.0, format)
            .unwrap(),
    }
}

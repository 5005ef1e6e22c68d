//! Warm Lane Guard - 常驻合成资源的非阻塞互斥访问
//!
//! 进程内只有一个常驻引擎，同一时刻最多一个请求在使用它。
//! `try_acquire` 只做一次锁检查，从不排队等待：拿不到就是 `Busy`，
//! 由调度器转去冷通道。

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::application::ports::{EngineRequest, TtsError, WarmEngine};
use crate::domain::ModelId;

/// 已安装的引擎及其占用标记
#[derive(Clone)]
struct WarmSlot {
    engine: Arc<Mutex<Box<dyn WarmEngine>>>,
    in_use: Arc<AtomicBool>,
    model: ModelId,
}

/// 非阻塞尝试的结果
pub enum LaneDecision {
    /// 拿到独占租约
    Acquired(WarmLease),
    /// 另一个请求正在使用
    Busy,
    /// 没有加载常驻引擎
    Absent,
}

impl std::fmt::Debug for LaneDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaneDecision::Acquired(lease) => write!(f, "Acquired({})", lease.model()),
            LaneDecision::Busy => write!(f, "Busy"),
            LaneDecision::Absent => write!(f, "Absent"),
        }
    }
}

/// 常驻通道状态（健康检查用）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarmLaneState {
    Idle,
    Busy,
    Absent,
}

/// 常驻引擎的独占租约
///
/// 租约被释放（包括错误路径和 panic 展开）时锁自动归还。
/// 可以 move 进 `spawn_blocking`。
pub struct WarmLease {
    engine: OwnedMutexGuard<Box<dyn WarmEngine>>,
    in_use: Arc<AtomicBool>,
}

impl WarmLease {
    pub fn model(&self) -> &ModelId {
        self.engine.model()
    }

    /// 阻塞合成，不可中断
    pub fn synthesize(
        &mut self,
        request: &EngineRequest,
        output: &std::path::Path,
    ) -> Result<(), TtsError> {
        self.engine.synthesize(request, output)
    }
}

impl Drop for WarmLease {
    fn drop(&mut self) {
        self.in_use.store(false, Ordering::Release);
    }
}

/// 常驻资源守卫
///
/// 通过依赖注入交给调度器，而不是进程级全局变量
pub struct WarmResourceGuard {
    slot: RwLock<Option<WarmSlot>>,
    active_model: RwLock<ModelId>,
}

impl WarmResourceGuard {
    /// 没有常驻引擎：所有请求走冷通道
    pub fn new(model: ModelId) -> Self {
        Self {
            slot: RwLock::new(None),
            active_model: RwLock::new(model),
        }
    }

    pub fn with_engine(engine: Box<dyn WarmEngine>) -> Self {
        let guard = Self::new(engine.model().clone());
        guard.install(engine);
        guard
    }

    /// 当前激活模型（参与缓存 key）
    pub fn active_model(&self) -> ModelId {
        self.active_model
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// 安装常驻引擎
    ///
    /// 已安装同一模型时保留现有实例并丢弃新实例，返回 false。
    /// 正在进行的合成继续持有旧实例直到结束。
    pub fn install(&self, engine: Box<dyn WarmEngine>) -> bool {
        let model = engine.model().clone();
        let mut slot = self.slot.write().unwrap_or_else(|e| e.into_inner());

        if let Some(existing) = slot.as_ref() {
            if existing.model == model {
                tracing::debug!(model = %model, "Warm engine already loaded, keeping instance");
                return false;
            }
        }

        *slot = Some(WarmSlot {
            engine: Arc::new(Mutex::new(engine)),
            in_use: Arc::new(AtomicBool::new(false)),
            model: model.clone(),
        });
        *self.active_model.write().unwrap_or_else(|e| e.into_inner()) = model.clone();

        tracing::info!(model = %model, "Warm engine installed");
        true
    }

    /// 卸载常驻引擎，之后所有请求走冷通道
    pub fn unload(&self) {
        let previous = self.slot.write().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(slot) = previous {
            tracing::info!(model = %slot.model, "Warm engine unloaded");
        }
    }

    /// 非阻塞尝试获取常驻引擎
    pub fn try_acquire(&self) -> LaneDecision {
        let slot = match self.slot.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
            Some(slot) => slot.clone(),
            None => return LaneDecision::Absent,
        };

        match slot.engine.try_lock_owned() {
            Ok(engine) => {
                slot.in_use.store(true, Ordering::Release);
                LaneDecision::Acquired(WarmLease {
                    engine,
                    in_use: slot.in_use,
                })
            }
            Err(_) => LaneDecision::Busy,
        }
    }

    pub fn state(&self) -> WarmLaneState {
        match self.slot.read().unwrap_or_else(|e| e.into_inner()).as_ref() {
            None => WarmLaneState::Absent,
            Some(slot) if slot.in_use.load(Ordering::Acquire) => WarmLaneState::Busy,
            Some(_) => WarmLaneState::Idle,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::AtomicUsize;

    struct NullEngine {
        model: ModelId,
        calls: Arc<AtomicUsize>,
        panic: bool,
    }

    impl NullEngine {
        fn boxed(model: &str) -> Box<dyn WarmEngine> {
            Box::new(Self {
                model: ModelId::new(model),
                calls: Arc::new(AtomicUsize::new(0)),
                panic: false,
            })
        }
    }

    impl WarmEngine for NullEngine {
        fn model(&self) -> &ModelId {
            &self.model
        }

        fn synthesize(&mut self, _request: &EngineRequest, _output: &Path) -> Result<(), TtsError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.panic {
                panic!("engine crashed");
            }
            Err(TtsError::ServiceError("CUDA error".to_string()))
        }
    }

    fn request() -> EngineRequest {
        EngineRequest {
            text: "Hello".to_string(),
            language: "en".to_string(),
            reference_path: "alloy.wav".into(),
            speed: 1.0,
            model: ModelId::new("xtts_v2"),
        }
    }

    #[test]
    fn test_absent_without_engine() {
        let guard = WarmResourceGuard::new(ModelId::new("xtts_v2"));
        assert!(matches!(guard.try_acquire(), LaneDecision::Absent));
        assert_eq!(guard.state(), WarmLaneState::Absent);
        assert_eq!(guard.active_model().as_str(), "xtts_v2");
    }

    #[test]
    fn test_second_acquire_is_busy_until_release() {
        let guard = WarmResourceGuard::with_engine(NullEngine::boxed("xtts_v2"));

        let lease = match guard.try_acquire() {
            LaneDecision::Acquired(lease) => lease,
            other => panic!("expected lease, got {:?}", other),
        };
        assert_eq!(guard.state(), WarmLaneState::Busy);
        assert!(matches!(guard.try_acquire(), LaneDecision::Busy));

        drop(lease);
        assert_eq!(guard.state(), WarmLaneState::Idle);
        assert!(matches!(guard.try_acquire(), LaneDecision::Acquired(_)));
    }

    #[test]
    fn test_lease_released_after_failed_synthesis() {
        let guard = WarmResourceGuard::with_engine(NullEngine::boxed("xtts_v2"));

        if let LaneDecision::Acquired(mut lease) = guard.try_acquire() {
            assert!(lease.synthesize(&request(), Path::new("out.wav")).is_err());
        } else {
            panic!("expected lease");
        }

        assert!(matches!(guard.try_acquire(), LaneDecision::Acquired(_)));
    }

    #[tokio::test]
    async fn test_lease_released_after_panic_on_worker_thread() {
        let guard = WarmResourceGuard::with_engine(Box::new(NullEngine {
            model: ModelId::new("xtts_v2"),
            calls: Arc::new(AtomicUsize::new(0)),
            panic: true,
        }));

        let mut lease = match guard.try_acquire() {
            LaneDecision::Acquired(lease) => lease,
            other => panic!("expected lease, got {:?}", other),
        };
        let joined = tokio::task::spawn_blocking(move || {
            lease.synthesize(&request(), Path::new("out.wav"))
        })
        .await;

        assert!(joined.is_err());
        assert_eq!(guard.state(), WarmLaneState::Idle);
        assert!(matches!(guard.try_acquire(), LaneDecision::Acquired(_)));
    }

    #[test]
    fn test_install_same_model_keeps_instance() {
        let calls = Arc::new(AtomicUsize::new(0));
        let guard = WarmResourceGuard::with_engine(Box::new(NullEngine {
            model: ModelId::new("xtts_v2"),
            calls: calls.clone(),
            panic: false,
        }));

        assert!(!guard.install(NullEngine::boxed("xtts_v2")));

        if let LaneDecision::Acquired(mut lease) = guard.try_acquire() {
            let _ = lease.synthesize(&request(), Path::new("out.wav"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_install_new_model_switches_active_model() {
        let guard = WarmResourceGuard::with_engine(NullEngine::boxed("xtts_v2"));
        assert!(guard.install(NullEngine::boxed("your_tts")));
        assert_eq!(guard.active_model().as_str(), "your_tts");

        guard.unload();
        assert!(matches!(guard.try_acquire(), LaneDecision::Absent));
        assert_eq!(guard.active_model().as_str(), "your_tts");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_only_one_concurrent_acquire_wins() {
        let guard = Arc::new(WarmResourceGuard::with_engine(NullEngine::boxed("xtts_v2")));
        let barrier = Arc::new(tokio::sync::Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                let barrier = barrier.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    let decision = guard.try_acquire();
                    let won = matches!(decision, LaneDecision::Acquired(_));
                    // 所有任务尝试完之前不释放租约
                    barrier.wait().await;
                    drop(decision);
                    won
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}

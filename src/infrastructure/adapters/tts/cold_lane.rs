//! Cold Lane - 一次性合成子进程
//!
//! 每个请求启动一个独立的 Coqui CLI 进程，从头加载模型、合成一次后退出。
//! 进程之间不共享任何状态，可以同时跑任意多个。
//!
//! - stdin 置空，stdout/stderr 逐行并发读取，避免管道写满导致子进程卡死
//! - 只保留 stderr 末尾一段用于诊断
//! - 超时或请求被放弃时子进程随 `Child` 释放被杀掉

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::application::ports::{ColdLanePort, EngineRequest, TtsError};

/// 保留的 stderr 末尾字节数
const STDERR_TAIL_BYTES: usize = 8 * 1024;

/// 冷通道配置
#[derive(Debug, Clone)]
pub struct ColdLaneConfig {
    /// Python 解释器
    pub python: PathBuf,
    /// 合成 CLI 脚本
    pub script: PathBuf,
    /// 模型下载目录，作为 TTS_HOME 传给子进程
    pub model_dir: PathBuf,
    pub use_cuda: bool,
    /// None 表示不限制
    pub timeout: Option<Duration>,
}

/// 子进程冷通道
pub struct ProcessColdLane {
    config: ColdLaneConfig,
}

impl ProcessColdLane {
    pub fn new(config: ColdLaneConfig) -> Self {
        Self { config }
    }

    /// CLI 参数（脚本路径在最前）
    fn build_args(&self, request: &EngineRequest, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            self.config.script.clone().into_os_string(),
            "--text".into(),
            request.text.clone().into(),
            "--model_name".into(),
            request.model.as_str().into(),
            "--out_path".into(),
            output.as_os_str().to_os_string(),
            "--progress_bar".into(),
            "False".into(),
            "--use_cuda".into(),
            if self.config.use_cuda { "yes" } else { "no" }.into(),
        ];

        if request.model.supports_voice_cloning() {
            args.push("--speaker_wav".into());
            args.push(request.reference_path.as_os_str().to_os_string());
            args.push("--language_idx".into());
            args.push(request.language.clone().into());
        }

        args
    }

    fn process_failed(message: impl Into<String>, exit_code: Option<i32>, stderr: String) -> TtsError {
        TtsError::ProcessFailed {
            message: message.into(),
            exit_code,
            stderr,
        }
    }
}

/// 追加一行并把缓冲裁剪到上限（按字符边界）
fn push_tail(tail: &mut String, line: &str) {
    tail.push_str(line);
    tail.push('\n');

    if tail.len() > STDERR_TAIL_BYTES {
        let mut cut = tail.len() - STDERR_TAIL_BYTES;
        while !tail.is_char_boundary(cut) {
            cut += 1;
        }
        tail.drain(..cut);
    }
}

/// 读完一个输出流，逐行转发到日志，返回末尾片段
async fn drain<R: AsyncRead + Unpin>(reader: Option<R>, stream: &'static str) -> String {
    let mut tail = String::new();
    let Some(reader) = reader else {
        return tail;
    };

    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                let text = text.trim_end();
                if !text.is_empty() {
                    tracing::debug!(stream, "{}", text);
                    push_tail(&mut tail, text);
                }
            }
            Err(e) => {
                tracing::warn!(stream, error = %e, "Failed to read cold lane output");
                break;
            }
        }
    }

    tail
}

#[async_trait]
impl ColdLanePort for ProcessColdLane {
    async fn run(&self, request: &EngineRequest, output: &Path) -> Result<(), TtsError> {
        let started = Instant::now();

        let mut child = Command::new(&self.config.python)
            .args(self.build_args(request, output))
            .env("COQUI_TOS_AGREED", "1")
            .env("TTS_HOME", &self.config.model_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                Self::process_failed(
                    format!(
                        "Failed to spawn cold lane {}: {}",
                        self.config.python.display(),
                        e
                    ),
                    None,
                    String::new(),
                )
            })?;

        tracing::debug!(pid = ?child.id(), model = %request.model, "Cold lane process started");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let supervise = async {
            let (status, _, stderr_tail) =
                tokio::join!(child.wait(), drain(stdout, "stdout"), drain(stderr, "stderr"));
            (status, stderr_tail)
        };

        let (status, stderr_tail) = match self.config.timeout {
            Some(limit) => match tokio::time::timeout(limit, supervise).await {
                Ok(finished) => finished,
                Err(_) => {
                    tracing::warn!(timeout_secs = limit.as_secs(), "Cold lane timed out, killing process");
                    return Err(TtsError::Timeout(limit));
                }
            },
            None => supervise.await,
        };

        let status = status.map_err(|e| {
            Self::process_failed(
                format!("Failed to wait for cold lane: {}", e),
                None,
                stderr_tail.clone(),
            )
        })?;

        if !status.success() {
            tracing::warn!(
                exit_code = ?status.code(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Cold lane process failed"
            );
            return Err(Self::process_failed(
                format!("Coqui CLI exited with {}", status),
                status.code(),
                stderr_tail,
            ));
        }

        let produced = tokio::fs::metadata(output)
            .await
            .map(|meta| meta.len() > 0)
            .unwrap_or(false);
        if !produced {
            return Err(Self::process_failed(
                "Coqui CLI exited successfully but produced no audio",
                status.code(),
                stderr_tail,
            ));
        }

        tracing::debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Cold lane synthesis completed"
        );
        Ok(())
    }
}

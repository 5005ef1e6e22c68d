//! File Voice Resolver - 基于文件系统的音色解析
//!
//! - 内置音色：`{voice_dir}/{catalog path}`，共享只读
//! - 未知音色或参考文件缺失：回退到默认音色
//! - 上传音频：写入工作目录下的请求私有临时文件，以内容摘要作为音色标识

use async_trait::async_trait;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::application::ports::{VoiceError, VoiceReference, VoiceResolverPort};
use crate::domain::voice::catalog;
use crate::domain::{VoiceSelector, DEFAULT_VOICE};

/// 文件系统音色解析器
pub struct FsVoiceResolver {
    voice_dir: PathBuf,
    work_dir: PathBuf,
}

impl FsVoiceResolver {
    pub fn new(voice_dir: impl Into<PathBuf>, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            voice_dir: voice_dir.into(),
            work_dir: work_dir.into(),
        }
    }

    fn default_voice(&self) -> VoiceReference {
        VoiceReference::catalog(
            DEFAULT_VOICE,
            self.voice_dir.join(catalog::default_reference()),
            true,
        )
    }

    async fn resolve_named(&self, name: &str) -> VoiceReference {
        if let Some(relative) = catalog::reference_for(name) {
            let path = self.voice_dir.join(relative);
            if is_file(&path).await {
                return VoiceReference::catalog(name.trim().to_ascii_lowercase(), path, false);
            }
            tracing::warn!(voice = %name, path = %path.display(), "Voice asset missing");
        }

        let fallback = self.default_voice();
        if !is_file(fallback.reference_path()).await {
            tracing::error!(
                path = %fallback.reference_path().display(),
                "Default voice asset missing"
            );
        }
        fallback
    }

    async fn materialize_upload(&self, bytes: &[u8]) -> Result<VoiceReference, VoiceError> {
        let voice_id = format!("upload-{:x}", md5::compute(bytes));
        let work_dir = self.work_dir.clone();
        let data = bytes.to_vec();

        let file = tokio::task::spawn_blocking(move || {
            let mut file = tempfile::Builder::new()
                .prefix("voice_")
                .suffix(".wav")
                .tempfile_in(&work_dir)?;
            file.write_all(&data)?;
            file.flush()?;
            Ok::<_, std::io::Error>(file.into_temp_path())
        })
        .await
        .map_err(|e| VoiceError::UploadFailed(e.to_string()))?
        .map_err(|e| VoiceError::UploadFailed(e.to_string()))?;

        tracing::debug!(
            voice_id = %voice_id,
            size_bytes = bytes.len(),
            path = %file.display(),
            "Uploaded reference audio materialized"
        );

        Ok(VoiceReference::ephemeral(voice_id, file))
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

#[async_trait]
impl VoiceResolverPort for FsVoiceResolver {
    async fn resolve(&self, selector: &VoiceSelector) -> Result<VoiceReference, VoiceError> {
        match selector {
            VoiceSelector::Named(name) => Ok(self.resolve_named(name).await),
            VoiceSelector::Upload(bytes) if bytes.is_empty() => {
                tracing::debug!("Empty upload, using default voice");
                Ok(self.default_voice())
            }
            VoiceSelector::Upload(bytes) => self.materialize_upload(bytes).await,
        }
    }
}

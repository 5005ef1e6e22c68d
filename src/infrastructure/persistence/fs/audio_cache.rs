//! Content-Addressed Audio Cache
//!
//! 缓存条目是 `{cache_dir}/{digest}.{ext}` 的普通文件，文件本身就是记录，
//! 没有索引、不做淘汰。
//!
//! 转码结果先写进同目录下的私有暂存文件，再以 no-clobber 方式发布：
//! 同 key 的多个生产者中第一个发布的胜出，其余丢弃自己的副本，
//! 读者永远看不到写了一半的文件。

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tokio::fs;

use crate::application::ports::{AudioCachePort, CacheEntry, CacheError, CacheKey};

/// 发布结果
enum Published {
    New,
    Existing,
    Replaced,
}

/// 文件系统音频缓存
pub struct FsAudioCache {
    cache_dir: PathBuf,
}

impl FsAudioCache {
    /// 创建缓存，目录不存在时自动创建
    pub async fn new(cache_dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.as_ref().to_path_buf();

        fs::create_dir_all(&cache_dir)
            .await
            .map_err(|e| CacheError::IoError(format!("{}: {}", cache_dir.display(), e)))?;

        tracing::info!(cache_dir = %cache_dir.display(), "FsAudioCache initialized");

        Ok(Self { cache_dir })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.cache_dir.join(key.file_name())
    }
}

/// 非空普通文件才算有效条目
async fn is_published(path: &Path) -> bool {
    match fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}

#[async_trait]
impl AudioCachePort for FsAudioCache {
    async fn lookup(&self, key: &CacheKey) -> Option<CacheEntry> {
        let path = self.entry_path(key);

        if is_published(&path).await {
            Some(CacheEntry {
                path,
                format: key.format(),
            })
        } else {
            None
        }
    }

    async fn stage(&self, key: &CacheKey) -> Result<TempPath, CacheError> {
        let dir = self.cache_dir.clone();
        let prefix = format!(".{}-", key.digest());
        let suffix = format!(".{}", key.format().extension());

        tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(&suffix)
                .tempfile_in(&dir)
                .map(|file| file.into_temp_path())
        })
        .await
        .map_err(|e| CacheError::IoError(e.to_string()))?
        .map_err(|e| CacheError::IoError(format!("Failed to create staging file: {}", e)))
    }

    async fn store(&self, key: &CacheKey, staged: TempPath) -> Result<CacheEntry, CacheError> {
        let target = self.entry_path(key);
        let destination = target.clone();

        let published = tokio::task::spawn_blocking(move || {
            match staged.persist_noclobber(&destination) {
                Ok(()) => Ok(Published::New),
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                    let existing_valid = std::fs::metadata(&destination)
                        .map(|meta| meta.is_file() && meta.len() > 0)
                        .unwrap_or(false);
                    if existing_valid {
                        // e.path 在这里释放，暂存副本随之删除
                        Ok(Published::Existing)
                    } else {
                        e.path
                            .persist(&destination)
                            .map(|_| Published::Replaced)
                            .map_err(|e| e.error)
                    }
                }
                Err(e) => Err(e.error),
            }
        })
        .await
        .map_err(|e| CacheError::IoError(e.to_string()))?
        .map_err(|e| CacheError::PublishFailed {
            path: target.clone(),
            reason: e.to_string(),
        })?;

        match published {
            Published::New => {
                tracing::debug!(path = %target.display(), "Cache entry published")
            }
            Published::Existing => tracing::debug!(
                path = %target.display(),
                "Cache entry already published by another request, discarding copy"
            ),
            Published::Replaced => {
                tracing::warn!(path = %target.display(), "Replaced empty cache entry")
            }
        }

        Ok(CacheEntry {
            path: target,
            format: key.format(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::generate_cache_key;
    use crate::domain::{AudioFormat, ModelId};

    fn key(text: &str, format: AudioFormat) -> CacheKey {
        generate_cache_key(text, "alloy", 1.0, format, "en", &ModelId::new("xtts_v2"))
    }

    async fn produce(cache: &FsAudioCache, key: &CacheKey, data: &[u8]) -> CacheEntry {
        let staged = cache.stage(key).await.unwrap();
        fs::write(&staged, data).await.unwrap();
        cache.store(key, staged).await.unwrap()
    }

    fn files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsAudioCache::new(dir.path().join("cache")).await.unwrap();
        let key = key("Hello", AudioFormat::Mp3);

        assert!(cache.lookup(&key).await.is_none());

        let entry = produce(&cache, &key, b"ID3 audio").await;
        assert_eq!(entry.path, cache.cache_dir().join(format!("{}.mp3", key.digest())));
        assert_eq!(entry.format, AudioFormat::Mp3);

        assert_eq!(cache.lookup(&key).await, Some(entry));
        assert_eq!(files(cache.cache_dir()), vec![key.file_name()]);
    }

    #[tokio::test]
    async fn test_staging_file_is_hidden_and_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsAudioCache::new(dir.path()).await.unwrap();
        let key = key("Hello", AudioFormat::Flac);

        let staged = cache.stage(&key).await.unwrap();
        let name = staged.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with(&format!(".{}-", key.digest())));
        assert!(name.ends_with(".flac"));
        assert!(cache.lookup(&key).await.is_none());

        drop(staged);
        assert!(files(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_first_publish_wins() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsAudioCache::new(dir.path()).await.unwrap();
        let key = key("Hello", AudioFormat::Wav);

        let first = produce(&cache, &key, b"first").await;
        let second = produce(&cache, &key, b"second").await;

        assert_eq!(first, second);
        assert_eq!(std::fs::read(&first.path).unwrap(), b"first");
        assert_eq!(files(dir.path()), vec![key.file_name()]);
    }

    #[tokio::test]
    async fn test_empty_file_is_not_an_entry() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsAudioCache::new(dir.path()).await.unwrap();
        let key = key("Hello", AudioFormat::Opus);

        std::fs::write(dir.path().join(key.file_name()), b"").unwrap();
        assert!(cache.lookup(&key).await.is_none());

        let entry = produce(&cache, &key, b"OggS").await;
        assert_eq!(std::fs::read(&entry.path).unwrap(), b"OggS");
        assert!(cache.lookup(&key).await.is_some());
    }

    #[tokio::test]
    async fn test_formats_are_separate_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FsAudioCache::new(dir.path()).await.unwrap();

        produce(&cache, &key("Hello", AudioFormat::Wav), b"RIFF").await;
        assert!(cache.lookup(&key("Hello", AudioFormat::Mp3)).await.is_none());
    }
}

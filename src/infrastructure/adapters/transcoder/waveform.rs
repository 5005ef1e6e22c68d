//! 原始波形校验
//!
//! 只读容器头，不解码样本：确认通道产出的确实是可读的 WAV，并取出时长

use std::path::Path;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioInfo, TranscodeError};

/// 读取波形信息；文件不可读、不是音频或没有样本都视为无效
pub fn probe_waveform(path: &Path) -> Result<AudioInfo, TranscodeError> {
    let file = std::fs::File::open(path)
        .map_err(|e| TranscodeError::IoError(format!("{}: {}", path.display(), e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    hint.with_extension("wav");

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| TranscodeError::DecodingError(format!("Probe failed: {}", e)))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| TranscodeError::DecodingError("No audio track found".to_string()))?;
    let params = &track.codec_params;

    let sample_rate = params
        .sample_rate
        .filter(|rate| *rate > 0)
        .ok_or_else(|| TranscodeError::DecodingError("Unknown sample rate".to_string()))?;

    let channels = params
        .channels
        .map(|c| c.count() as u8)
        .ok_or_else(|| TranscodeError::DecodingError("Unknown channel count".to_string()))?;

    let frames = params.n_frames.unwrap_or(0);
    if frames == 0 {
        return Err(TranscodeError::InvalidInput(format!(
            "Waveform contains no samples: {}",
            path.display()
        )));
    }

    Ok(AudioInfo {
        duration_ms: frames * 1000 / sample_rate as u64,
        sample_rate,
        channels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::tts::silent_wav;

    #[test]
    fn test_probe_reads_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tts_raw.wav");
        std::fs::write(&path, silent_wav(22_050, 1500)).unwrap();

        let info = probe_waveform(&path).unwrap();
        assert_eq!(info.sample_rate, 22_050);
        assert_eq!(info.channels, 1);
        assert_eq!(info.duration_ms, 1500);
    }

    #[test]
    fn test_probe_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tts_raw.wav");
        std::fs::write(&path, b"Traceback (most recent call last)").unwrap();

        assert!(probe_waveform(&path).is_err());
    }

    #[test]
    fn test_probe_rejects_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tts_raw.wav");
        std::fs::write(&path, b"").unwrap();

        assert!(probe_waveform(&path).is_err());
    }

    #[test]
    fn test_probe_rejects_missing_file() {
        assert!(matches!(
            probe_waveform(Path::new("/nonexistent/tts_raw.wav")),
            Err(TranscodeError::IoError(_))
        ));
    }
}

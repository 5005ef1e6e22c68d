//! Speech Context - Value Objects

use serde::{Deserialize, Serialize};

use super::errors::SpeechError;
use crate::domain::voice::VoiceSelector;

/// 未指定语言时使用的默认语言
pub const DEFAULT_LANGUAGE: &str = "en";

/// 音频输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// 原始 WAV，直接复制
    Wav,
    /// MP3 - 高质量 VBR
    #[default]
    Mp3,
    /// Opus (OGG 容器) - 64 kbps
    Opus,
    /// FLAC - 无损
    Flac,
}

impl AudioFormat {
    /// 缓存文件扩展名
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Opus => "opus",
            AudioFormat::Flac => "flac",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Opus => "audio/ogg",
            AudioFormat::Flac => "audio/flac",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = SpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wav" => Ok(AudioFormat::Wav),
            "mp3" => Ok(AudioFormat::Mp3),
            "opus" => Ok(AudioFormat::Opus),
            "flac" => Ok(AudioFormat::Flac),
            _ => Err(SpeechError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// 一次合成请求
///
/// 构造后不可变；构造时完成校验
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    text: String,
    voice: VoiceSelector,
    language: String,
    speed: f32,
    format: AudioFormat,
}

impl SynthesisRequest {
    pub fn new(
        text: impl Into<String>,
        voice: VoiceSelector,
        language: Option<String>,
        speed: f32,
        format: AudioFormat,
    ) -> Result<Self, SpeechError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        if !speed.is_finite() || speed <= 0.0 {
            return Err(SpeechError::InvalidSpeed(speed));
        }

        let language = language
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        Ok(Self {
            text,
            voice,
            language,
            speed,
            format,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn voice(&self) -> &VoiceSelector {
        &self.voice
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn format(&self) -> AudioFormat {
        self.format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alloy() -> VoiceSelector {
        VoiceSelector::named("alloy")
    }

    #[test]
    fn test_format_parse() {
        assert_eq!("FLAC".parse::<AudioFormat>().unwrap(), AudioFormat::Flac);
        assert_eq!("opus".parse::<AudioFormat>().unwrap(), AudioFormat::Opus);
        assert!("aac".parse::<AudioFormat>().is_err());
    }

    #[test]
    fn test_rejects_blank_text() {
        let err = SynthesisRequest::new("   ", alloy(), None, 1.0, AudioFormat::Wav).unwrap_err();
        assert_eq!(err, SpeechError::EmptyText);
    }

    #[test]
    fn test_rejects_non_positive_speed() {
        assert!(SynthesisRequest::new("Hello", alloy(), None, 0.0, AudioFormat::Wav).is_err());
        assert!(SynthesisRequest::new("Hello", alloy(), None, -1.5, AudioFormat::Wav).is_err());
        assert!(SynthesisRequest::new("Hello", alloy(), None, f32::NAN, AudioFormat::Wav).is_err());
    }

    #[test]
    fn test_language_defaults_to_english() {
        let request =
            SynthesisRequest::new("Hello", alloy(), Some(String::new()), 1.0, AudioFormat::Mp3)
                .unwrap();
        assert_eq!(request.language(), "en");

        let request =
            SynthesisRequest::new("Hola", alloy(), Some("es".into()), 1.0, AudioFormat::Mp3)
                .unwrap();
        assert_eq!(request.language(), "es");
    }
}

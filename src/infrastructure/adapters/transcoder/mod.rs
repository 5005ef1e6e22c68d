//! Transcoder Adapter - 音频转码与波形校验

mod ffmpeg_transcoder;
mod waveform;

pub use ffmpeg_transcoder::FfmpegTranscoder;
pub use waveform::probe_waveform;

//! Voice Context - 内置音色目录
//!
//! 路径相对于 `storage.voice_dir`

/// 找不到请求音色时回退的默认音色
pub const DEFAULT_VOICE: &str = "alloy";

const VOICE_CATALOG: &[(&str, &str)] = &[
    ("alloy", "standard/alloy.wav"),
    ("echo", "standard/echo.wav"),
    ("fable", "standard/fable.wav"),
    ("onyx", "standard/onyx.wav"),
    ("nova", "standard/nova.wav"),
    ("shimmer", "standard/shimmer.wav"),
    ("jarvis", "elite/paul_bettany.wav"),
    ("friday", "elite/kerry_condon.wav"),
    ("hal", "elite/hal9000.wav"),
    ("samantha", "elite/scarlett_johansson.wav"),
    ("cortana", "elite/cortana.wav"),
    ("glados", "elite/glados.wav"),
    ("tars", "elite/tars.wav"),
    ("kitt", "elite/kitt.wav"),
    ("rachel", "elite/rachel.wav"),
];

/// 查找音色的参考音频相对路径（大小写不敏感）
pub fn reference_for(voice: &str) -> Option<&'static str> {
    let voice = voice.trim();
    VOICE_CATALOG
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(voice))
        .map(|(_, path)| *path)
}

/// 默认音色的参考音频相对路径
pub fn default_reference() -> &'static str {
    // DEFAULT_VOICE 必须在目录中
    VOICE_CATALOG[0].1
}

//! Voice Context - Value Objects

/// 请求中的音色选择
#[derive(Clone, PartialEq, Eq)]
pub enum VoiceSelector {
    /// 内置音色名
    Named(String),
    /// 请求内联上传的参考音频
    Upload(Vec<u8>),
}

impl VoiceSelector {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn upload(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Upload(bytes.into())
    }
}

impl std::fmt::Debug for VoiceSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VoiceSelector::Named(name) => f.debug_tuple("Named").field(name).finish(),
            VoiceSelector::Upload(bytes) => write!(f, "Upload({} bytes)", bytes.len()),
        }
    }
}

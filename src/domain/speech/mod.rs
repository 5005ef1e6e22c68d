//! Speech Context - 合成请求与模型能力

mod errors;
mod model;
mod value_objects;

pub use errors::SpeechError;
pub use model::ModelId;
pub use value_objects::{AudioFormat, SynthesisRequest, DEFAULT_LANGUAGE};

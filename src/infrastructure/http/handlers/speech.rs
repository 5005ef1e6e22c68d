//! Speech Handlers
//!
//! `POST /v1/audio/speech`：`application/json` 走结构化请求体，
//! 其余内容类型按 multipart 表单解析

use axum::{
    body::Body,
    extract::{FromRequest, Multipart, Request, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::application::SynthesizeSpeechResponse;
use crate::infrastructure::http::dto::SpeechRequest;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 响应头：本次请求由哪条通道完成
pub const LANE_HEADER: &str = "x-synthesis-lane";

/// 上传参考音频的表单字段
const VOICE_FILE_FIELD: &str = "custom_voice_file";

pub async fn create_speech(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, ApiError> {
    let is_json = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().starts_with("application/json"))
        .unwrap_or(false);

    let (speech, upload) = if is_json {
        let Json(speech) = Json::<SpeechRequest>::from_request(request, &state).await?;
        (speech, None)
    } else {
        let multipart = Multipart::from_request(request, &state).await?;
        read_form(multipart).await?
    };

    let command = speech.into_command(upload)?;
    let result = state.lane_router.handle(command).await?;

    stream_artifact(result).await
}

/// 解析 multipart 表单
async fn read_form(mut multipart: Multipart) -> Result<(SpeechRequest, Option<Vec<u8>>), ApiError> {
    let mut input: Option<String> = None;
    let mut speech = SpeechRequest::new(String::new());
    let mut upload: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        if field_name == VOICE_FILE_FIELD {
            let bytes = field.bytes().await.map_err(|e| {
                ApiError::BadRequest(format!("Failed to read {}: {}", VOICE_FILE_FIELD, e))
            })?;
            upload = Some(bytes.to_vec());
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read {}: {}", field_name, e)))?;

        match field_name.as_str() {
            "input" => input = Some(value),
            "model" => speech.model = value,
            "voice" => speech.voice = value,
            "language" => speech.language = Some(value),
            "response_format" => speech.response_format = value,
            "speed" => {
                speech.speed = value
                    .trim()
                    .parse()
                    .map_err(|_| ApiError::BadRequest(format!("Invalid speed: {}", value)))?;
            }
            _ => {
                tracing::debug!(field = %field_name, "Ignoring unknown form field");
            }
        }
    }

    speech.input = input.ok_or_else(|| ApiError::BadRequest("Missing field: input".to_string()))?;
    Ok((speech, upload))
}

/// 从缓存文件流式返回
async fn stream_artifact(result: SynthesizeSpeechResponse) -> Result<Response, ApiError> {
    let path = &result.artifact.path;
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to open {}: {}", path.display(), e)))?;
    let file_size = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to stat {}: {}", path.display(), e)))?
        .len();

    let format = result.artifact.format;
    let body = Body::from_stream(ReaderStream::new(file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.content_type())
        .header(header::CONTENT_LENGTH, file_size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"speech.{}\"", format.extension()),
        )
        .header(LANE_HEADER, result.lane.as_str())
        .body(body)
        .map_err(|e| ApiError::Internal(e.to_string()))
}

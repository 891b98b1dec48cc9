use axum::{
    Router,
    extract::{Multipart, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::post,
};

use crate::{error::AppError, state::AppState};

use super::models::ImageUpload;

#[utoipa::path(
    post,
    path = "/remove-background",
    summary = "移除图片背景（下载）",
    description = "接收 multipart 字段 `image`，校验扩展名后交给分割后端抠图，\
                   以附件形式返回 PNG（建议文件名 no_background.png）。",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "PNG bytes, attachment disposition"),
        (status = 400, description = "Validation failure", body = crate::error::ErrorBody),
        (status = 500, description = "Processing failure", body = crate::error::ErrorBody)
    ),
    tag = "Matting"
)]
pub async fn remove_background(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let upload = ImageUpload::from_multipart(multipart).await?;
    upload.validate_extension()?;

    tracing::info!(filename = %upload.filename, bytes = upload.bytes.len(), "开始背景移除");
    let png = state.matting.process(upload).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"no_background.png\""),
    );
    Ok((StatusCode::OK, headers, png))
}

#[utoipa::path(
    post,
    path = "/remove-background-preview",
    summary = "移除图片背景（预览）",
    description = "与下载端点契约一致，但响应不带附件标记，用于前端直接内联展示。",
    request_body(content = Vec<u8>, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "PNG bytes, inline"),
        (status = 400, description = "Validation failure", body = crate::error::ErrorBody),
        (status = 500, description = "Processing failure", body = crate::error::ErrorBody)
    ),
    tag = "Matting"
)]
pub async fn remove_background_preview(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let upload = ImageUpload::from_multipart(multipart).await?;
    upload.validate_extension()?;

    tracing::info!(filename = %upload.filename, bytes = upload.bytes.len(), "开始背景移除（预览）");
    let png = state.matting.process(upload).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    Ok((StatusCode::OK, headers, png))
}

pub fn create_matting_router() -> Router<AppState> {
    Router::new()
        .route("/remove-background", post(remove_background))
        .route("/remove-background-preview", post(remove_background_preview))
}

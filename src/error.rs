use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// 应用统一错误类型
///
/// 对外契约固定为 `{"error": <reason>}`：
/// - 校验类错误（缺少文件、空文件名、扩展名不允许）→ 400，永远不会进入解码流程
/// - 解码/抠图/编码失败统一包装为 `Processing` → 500，消息带 `Error processing image:` 前缀
#[derive(Error, Debug, utoipa::ToSchema)]
pub enum AppError {
    /// multipart 中缺少 `image` 字段
    #[error("No image file provided")]
    MissingUpload,

    /// `image` 字段存在但未选择文件（文件名为空）
    #[error("No file selected")]
    EmptyFilename,

    /// 文件扩展名不在允许集合内
    #[error("File type not allowed. Use PNG, JPG, JPEG or WEBP")]
    UnsupportedFileType,

    /// multipart 请求体本身无法解析
    #[error("Invalid multipart request: {0}")]
    Multipart(String),

    /// 图像处理失败（解码、抠图后端、PNG 编码）
    #[error("Error processing image: {0}")]
    Processing(String),

    /// 内部服务器错误
    #[error("Internal error: {0}")]
    Internal(String),
}

/// 错误响应体（单字段 JSON）
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// 人类可读的错误原因
    #[schema(example = "No image file provided")]
    pub error: String,
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingUpload
            | AppError::EmptyFilename
            | AppError::UnsupportedFileType
            | AppError::Multipart(_) => StatusCode::BAD_REQUEST,
            AppError::Processing(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "请求处理失败");
        }
        let mut res = Json(json!({ "error": self.to_string() })).into_response();
        *res.status_mut() = status;
        res
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::Multipart(err.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn validation_errors_use_fixed_reason_strings() {
        assert_eq!(AppError::MissingUpload.to_string(), "No image file provided");
        assert_eq!(AppError::EmptyFilename.to_string(), "No file selected");
        assert_eq!(
            AppError::UnsupportedFileType.to_string(),
            "File type not allowed. Use PNG, JPG, JPEG or WEBP"
        );
    }

    #[test]
    fn processing_error_carries_the_documented_prefix() {
        let e = AppError::Processing("bad magic bytes".to_string());
        assert_eq!(e.to_string(), "Error processing image: bad magic bytes");
    }
}

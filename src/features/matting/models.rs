use axum::body::Bytes;
use axum::extract::Multipart;

use crate::error::AppError;

/// 允许上传的扩展名集合（大小写不敏感）
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// 类型化的上传请求值
///
/// 在任何处理逻辑执行之前，multipart 请求体先被解析为这个结构：
/// 字节 + 声明的文件名。生命周期不超过单个请求。
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// 客户端声明的文件名
    pub filename: String,
    /// 原始图像字节
    pub bytes: Bytes,
}

impl ImageUpload {
    /// 从 multipart 请求体解析上传字段
    ///
    /// - 缺少 `image` 字段 → `MissingUpload`
    /// - 字段存在但文件名为空 → `EmptyFilename`
    /// - 其余字段忽略
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, AppError> {
        let mut upload: Option<ImageUpload> = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or("").to_string();
            if name != "image" {
                tracing::debug!("忽略未知 multipart 字段: {}", name);
                continue;
            }

            let filename = field
                .file_name()
                .map(str::to_string)
                .filter(|f| !f.is_empty())
                .ok_or(AppError::EmptyFilename)?;
            let bytes = field.bytes().await?;

            upload = Some(ImageUpload { filename, bytes });
        }

        upload.ok_or(AppError::MissingUpload)
    }

    /// 校验声明的文件名扩展名是否在允许集合内
    ///
    /// 校验失败的请求永远不会进入解码流程。
    pub fn validate_extension(&self) -> Result<(), AppError> {
        if allowed_file(&self.filename) {
            Ok(())
        } else {
            Err(AppError::UnsupportedFileType)
        }
    }
}

/// 文件名需含 '.'，且最后一个 '.' 之后的文本（小写化）在允许集合内
fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

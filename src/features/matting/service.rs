use std::sync::Arc;

use axum::body::Bytes;
use image::ImageFormat;
use tokio::sync::Semaphore;

use crate::error::AppError;

use super::backend::MattingBackend;
use super::models::ImageUpload;

/// 抠图服务：解码 → 后端抠图 → PNG 编码
///
/// 整条流水线是 CPU 密集型阻塞操作，必须移出 tokio worker；
/// 并发量由信号量限制，避免阻塞线程池被抠图请求占满。
#[derive(Clone)]
pub struct MattingService {
    backend: Arc<dyn MattingBackend>,
    permits: Arc<Semaphore>,
}

impl MattingService {
    /// `max_parallel` 为并发许可数，0 表示取 CPU 核心数
    pub fn new(backend: Arc<dyn MattingBackend>, max_parallel: u32) -> Self {
        let permits = if max_parallel == 0 {
            num_cpus::get()
        } else {
            max_parallel as usize
        };
        Self {
            backend,
            permits: Arc::new(Semaphore::new(permits)),
        }
    }

    /// 处理一次上传，返回 PNG 字节
    ///
    /// 解码、抠图、编码的任何失败都统一包装为 `Processing`（对外 500），
    /// 完整诊断细节只记录在服务端日志中。成功时 PNG 才会被完整返回，
    /// 不存在部分响应。
    pub async fn process(&self, upload: ImageUpload) -> Result<Bytes, AppError> {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Internal(format!("获取抠图信号量失败: {e}")))?;

        let backend = Arc::clone(&self.backend);
        let filename = upload.filename.clone();
        let png = tokio::task::spawn_blocking(move || {
            process_blocking(backend.as_ref(), &upload.bytes)
        })
        .await
        .map_err(|e| AppError::Internal(format!("阻塞抠图任务执行失败: {e}")))??;

        tracing::info!(filename = %filename, bytes = png.len(), "背景移除完成");
        Ok(Bytes::from(png))
    }
}

fn process_blocking(backend: &dyn MattingBackend, input: &[u8]) -> Result<Vec<u8>, AppError> {
    let decoded = image::load_from_memory(input).map_err(|e| {
        tracing::error!(error = ?e, "图像解码失败");
        AppError::Processing(e.to_string())
    })?;

    let matted = backend.remove_background(&decoded).map_err(|e| {
        tracing::error!(error = ?e, backend = backend.name(), "抠图后端失败");
        AppError::Processing(e.to_string())
    })?;

    let mut buffer = std::io::Cursor::new(Vec::new());
    matted.write_to(&mut buffer, ImageFormat::Png).map_err(|e| {
        tracing::error!(error = ?e, "PNG 编码失败");
        AppError::Processing(e.to_string())
    })?;

    Ok(buffer.into_inner())
}

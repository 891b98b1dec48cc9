use crate::config::AppConfig;
use crate::error::AppError;
use std::fs;
use std::path::Path;

/// 执行启动检查
///
/// 1. 检查并创建上传目录（幂等，create-if-absent）
///
/// 该检查是进程启动期的一次性副作用，不参与请求热路径：
/// 上传内容始终从内存中的请求体读取。
pub async fn run_startup_checks(config: &AppConfig) -> Result<(), AppError> {
    tracing::info!("🔍 开始执行启动检查...");

    ensure_upload_dir(&config.upload_path())?;

    tracing::info!("✅ 启动检查完成");
    Ok(())
}

/// 确保上传目录存在
fn ensure_upload_dir(path: &Path) -> Result<(), AppError> {
    if !path.exists() {
        tracing::warn!("📁 未找到上传目录，正在创建: {:?}", path);
        fs::create_dir_all(path)
            .map_err(|e| AppError::Internal(format!("创建上传目录失败: {e}")))?;
        tracing::info!("✅ 上传目录创建成功");
    } else {
        tracing::info!("✅ 上传目录已存在");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ensure_upload_dir;

    #[test]
    fn ensure_upload_dir_is_idempotent() {
        let dir = std::env::temp_dir().join(format!("nobg-uploads-{}", uuid::Uuid::new_v4()));

        assert!(!dir.exists());
        ensure_upload_dir(&dir).expect("first create");
        assert!(dir.is_dir());
        // 第二次调用不应报错
        ensure_upload_dir(&dir).expect("second create");

        std::fs::remove_dir_all(&dir).expect("cleanup");
    }
}

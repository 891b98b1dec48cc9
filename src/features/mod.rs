/// 健康检查
pub mod health;

/// 背景移除（抠图）
pub mod matting;

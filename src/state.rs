use crate::features::matting::MattingService;

/// 聚合的应用共享状态
///
/// 服务本身是无状态的：这里只聚合抠图服务句柄（后端 + 并发许可），
/// 不保留任何跨请求的可变数据。
#[derive(Clone)]
pub struct AppState {
    pub matting: MattingService,
}

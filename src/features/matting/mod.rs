mod backend;
pub mod handler;
mod models;
mod service;

pub use backend::{BorderFloodMatting, MattingBackend, MattingError};
pub use handler::create_matting_router;
pub use models::{ALLOWED_EXTENSIONS, ImageUpload};
pub use service::MattingService;

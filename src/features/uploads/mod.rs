pub mod models;
pub mod repositories;
pub mod services;

pub use repositories::PgUploadRepository;
pub use services::UploadService;

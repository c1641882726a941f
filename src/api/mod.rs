pub mod error;
pub mod response;
pub mod route;

pub use error::ApiError;
pub use response::ApiResponse;
pub use route::create_router;

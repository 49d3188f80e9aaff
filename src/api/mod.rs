pub mod date;
pub mod payload;
pub mod response;

pub use response::{ApiResponse, ApiResult};

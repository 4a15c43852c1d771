pub mod panic;
pub mod response;

pub use panic::panic_response;
pub use response::{ApiResponse, ApiResult};

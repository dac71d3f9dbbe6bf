pub mod api_key;
pub mod auth;
pub mod response;

pub use api_key::require_api_key;
pub use auth::{require_auth, AuthUser};
pub use response::{ApiResponse, ApiResult};

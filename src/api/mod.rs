pub mod extract;
pub mod multipart;

pub use extract::{parse_id, required, required_secret, JsonBody};
pub use multipart::MultipartForm;

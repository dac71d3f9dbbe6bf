pub mod payment;
pub mod storage;

pub use payment::{PaymentGateway, RazorpayGateway};
pub use storage::{MemoryStorage, ObjectStorage, SupabaseStorage};

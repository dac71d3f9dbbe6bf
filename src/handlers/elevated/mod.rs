// handlers/elevated/mod.rs - Admin handlers (x-api-key required)
pub mod users;

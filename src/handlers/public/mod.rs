// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Account creation, token acquisition and the read-only course catalog.
// These handlers have no user context, so every input is validated here.
pub mod courses;
pub mod enrollments;
pub mod users;

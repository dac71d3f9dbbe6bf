// handlers/protected/mod.rs - Protected handlers (access token required)
//
// Every route in this tier runs behind `require_auth`, which loads the
// caller into an `AuthUser` extension. Ownership checks happen here.
pub mod courses;
pub mod dashboards;
pub mod enrollments;
pub mod lessons;
pub mod likes;
pub mod payments;
pub mod users;

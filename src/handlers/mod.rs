// handlers/mod.rs - 3-tier handler architecture
//
// Public (no auth) → Protected (access token) → Elevated (admin API key)
pub mod elevated;
pub mod protected;
pub mod public;

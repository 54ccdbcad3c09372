// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Token acquisition endpoints. No user context is available here, so every
// input is validated by the services before it reaches the database.
pub mod auth;

pub use auth::{login, register, register_company};

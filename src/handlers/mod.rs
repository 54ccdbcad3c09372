// handlers/mod.rs - Handler tiers
//
// public    (no token)                  /, /health, /auth/*
// account   (JWT, any account)          /api/auth/*, /api/organizations, own join requests
// protected (JWT + organization member) every other /api/* route
pub mod account;
pub mod health;
pub mod protected;
pub mod public;

pub use health::{health, root};

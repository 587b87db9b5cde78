//! Fablebound API — HTTP surface and narration worker.

pub mod auth;
pub mod error;
pub mod identity;
pub mod routes;
pub mod state;
pub mod worker;

//! Route modules organized by bounded context.

pub mod health;
pub mod invite;
pub mod session;

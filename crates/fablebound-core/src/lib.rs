//! Fablebound Core — shared domain model and collaborator traits.
//!
//! This crate defines the data contracts every other crate depends on,
//! plus the trait seams for the external collaborators (content store,
//! narration provider, identity provider). It contains no infrastructure
//! code.

pub mod character;
pub mod clock;
pub mod error;
pub mod identity;
pub mod invite;
pub mod message;
pub mod narration;
pub mod participant;
pub mod session;
pub mod store;

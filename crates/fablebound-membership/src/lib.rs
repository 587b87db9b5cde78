//! Fablebound Membership — the transactional join/invite protocol.
//!
//! Everything here mutates session membership through the store's versioned
//! writes, so concurrent joins serialize and `turn_order` never loses an
//! entry.

pub mod invites;
pub mod sessions;

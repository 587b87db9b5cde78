//! Fablebound Store — PostgreSQL implementation of the `ContentStore`
//! trait.

pub mod pg_content_store;
pub mod schema;

pub use pg_content_store::PgContentStore;

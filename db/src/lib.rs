//! Persistence for Almanac.
//!
//! [`storage::Storage`] is the seam the API talks to. Two backends implement
//! it: [`storage::postgres::PostgresStorage`] for deployments and
//! [`storage::memory::MemoryStorage`] for tests and local experiments.
//!
//! The relational schema is in `migrations/` and mirrored by [`schema`].

pub mod models;
pub mod password;
pub mod schema;
pub mod storage;

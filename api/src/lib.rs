//! Almanac API service.
//!
//! Provides REST API endpoints for managing calendar events and the users
//! who own them.
//!
//! # Configuration
//!
//! See [`config::AlmanacApiConfig`]; every option can also be set from an
//! `ALMANAC_API_*` environment variable.
//!
//! # Authentication
//!
//! Opaque bearer tokens issued by `POST /api/user/token/`. Only a SHA-256
//! digest of each token is stored. See [`auth::token`].

pub mod auth;
pub mod config;
pub mod server;

pub(crate) mod context;
pub(crate) mod error;
pub(crate) mod extract;
pub(crate) mod handlers;

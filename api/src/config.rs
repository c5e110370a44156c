use chrono::TimeDelta;
use clap::Parser;
use std::net::SocketAddr;

#[derive(Clone, Debug, Parser)]
#[command(version, about = "Almanac calendar API server")]
pub struct AlmanacApiConfig {
    #[clap(
        short,
        long,
        env = "ALMANAC_API_BIND_ADDR",
        default_value = "0.0.0.0:8000"
    )]
    pub bind_addr: SocketAddr,

    /// Origin browsers load the API from; used for CORS.
    #[clap(
        long,
        env = "ALMANAC_API_PUBLIC_URL",
        default_value = "http://localhost:8000"
    )]
    pub public_url: String,

    /// Print the OpenAPI document as JSON and exit.
    #[clap(long, default_value_t = false)]
    pub dump_openapi: bool,

    #[clap(
        long,
        env = "ALMANAC_API_DATABASE_URL",
        default_value = "postgres://localhost/almanac"
    )]
    pub database_url: String,

    /// Upper bound on pooled database connections.
    #[clap(long, env = "ALMANAC_API_DATABASE_MAX_CONNECTIONS", default_value_t = 10)]
    pub database_max_connections: u32,

    /// bcrypt work factor for newly hashed passwords.
    #[clap(
        long,
        env = "ALMANAC_API_PASSWORD_HASH_COST",
        default_value_t = almanac_db::password::DEFAULT_COST,
        value_parser = clap::value_parser!(u32).range(4..=31)
    )]
    pub password_hash_cost: u32,

    /// How long an issued token stays valid, in hours.
    #[clap(
        long,
        env = "ALMANAC_API_TOKEN_TTL_HOURS",
        default_value_t = 30 * 24,
        value_parser = clap::value_parser!(i64).range(1..)
    )]
    pub token_ttl_hours: i64,
}

impl AlmanacApiConfig {
    pub fn token_ttl(&self) -> TimeDelta {
        TimeDelta::hours(self.token_ttl_hours)
    }
}

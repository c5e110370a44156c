mod create_user;

pub use create_user::{CreateUserParams, create_user};

use almanac_db::storage::Storage;

pub async fn ping(stg: &impl Storage) -> anyhow::Result<()> {
    stg.ping().await?;
    println!("Database is reachable");
    Ok(())
}

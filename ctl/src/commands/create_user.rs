use anyhow::Context;
use clap::Parser;
use almanac_common::{caller::Caller, params::CreateLocalUserParams};
use almanac_db::{
    password,
    storage::{NewLocalUser, UserStore},
};

#[derive(Clone, Parser)]
pub struct CreateUserParams {
    #[clap(short, long)]
    pub display_name: String,

    #[clap(short, long)]
    pub email: String,

    #[clap(short, long)]
    pub password: String,

    /// bcrypt work factor.
    #[clap(long, default_value_t = password::DEFAULT_COST)]
    pub cost: u32,
}

pub async fn create_user(
    stg: &impl UserStore,
    CreateUserParams {
        display_name,
        email,
        password,
        cost,
    }: CreateUserParams,
) -> anyhow::Result<()> {
    let params = CreateLocalUserParams {
        display_name,
        email,
        password,
    }
    .validate()?;

    let password_hash = password::hash(params.password, cost)
        .await
        .context("Failed to hash password")?;

    let new_user = UserStore::create_local(
        stg,
        &Caller::System,
        NewLocalUser {
            email: params.email,
            display_name: params.display_name,
            password_hash,
        },
    )
    .await?;

    println!("Created user with ID {}", new_user.id);

    Ok(())
}

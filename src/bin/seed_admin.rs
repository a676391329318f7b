//! Admin bootstrap - creates (or rotates the password of) a back-office
//! admin account.
//!
//! Run with: cargo run --bin seed-admin -- --email admin@example.com --password <pw>

use clap::Parser;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use tracing::info;

use aromashop_api::{
    auth::hash_password,
    config,
    db,
    entities::admin_user::{self, Entity as AdminUserEntity},
};

#[derive(Parser, Debug)]
#[command(about = "Create or update an admin user")]
struct Args {
    /// Admin login email
    #[arg(long)]
    email: String,

    /// Plaintext password to hash and store
    #[arg(long)]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = Args::parse();
    let cfg = config::load_config()?;

    let pool = db::establish_connection_from_app_config(&cfg).await?;
    db::run_migrations(&pool).await?;

    let password_hash = hash_password(&args.password)?;

    let existing = AdminUserEntity::find()
        .filter(admin_user::Column::Email.eq(&args.email))
        .one(&pool)
        .await?;

    match existing {
        Some(admin) => {
            let admin_id = admin.id;
            let mut active: admin_user::ActiveModel = admin.into();
            active.password_hash = Set(password_hash);
            active.update(&pool).await?;
            info!(admin_id, email = %args.email, "Admin password updated");
        }
        None => {
            let created = admin_user::ActiveModel {
                email: Set(args.email.clone()),
                password_hash: Set(password_hash),
                ..Default::default()
            }
            .insert(&pool)
            .await?;
            info!(admin_id = created.id, email = %args.email, "Admin created");
        }
    }

    Ok(())
}

use std::time::Duration;

use migration::{migrate, MigrationCommand};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use crate::config::db::{db_url, DbOwner, DbProfile};
use crate::error::AppError;

/// Connect without running migrations.
pub async fn connect_db(
    profile: DbProfile,
    owner: DbOwner,
) -> Result<DatabaseConnection, AppError> {
    let mut options = ConnectOptions::new(db_url(profile, owner)?);
    options
        .max_connections(16)
        .connect_timeout(Duration::from_secs(5))
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);
    Ok(Database::connect(options).await?)
}

/// Apply pending migrations as the schema owner, then connect as `owner`.
pub async fn bootstrap_db(
    profile: DbProfile,
    owner: DbOwner,
) -> Result<DatabaseConnection, AppError> {
    let schema_conn = connect_db(profile, DbOwner::Owner).await?;
    migrate(&schema_conn, MigrationCommand::Up).await?;
    info!(profile = ?profile, "Schema up to date");
    if owner == DbOwner::Owner {
        return Ok(schema_conn);
    }
    schema_conn.close().await?;
    connect_db(profile, owner).await
}

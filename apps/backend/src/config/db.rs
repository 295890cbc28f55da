use std::env;

use crate::error::AppError;

/// Which database a connection targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbProfile {
    Prod,
    /// Name must end in `_test`.
    Test,
}

/// Which role a connection logs in as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbOwner {
    /// Runtime role used by the store.
    App,
    /// Schema owner, used by migrations.
    Owner,
}

impl DbProfile {
    fn db_name_var(self) -> &'static str {
        match self {
            DbProfile::Prod => "PROD_DB",
            DbProfile::Test => "TEST_DB",
        }
    }
}

impl DbOwner {
    fn credential_vars(self) -> (&'static str, &'static str) {
        match self {
            DbOwner::App => ("APP_DB_USER", "APP_DB_PASSWORD"),
            DbOwner::Owner => ("DEBATE_OWNER_USER", "DEBATE_OWNER_PASSWORD"),
        }
    }
}

/// Postgres URL assembled from `POSTGRES_HOST`, `POSTGRES_PORT`, the profile's
/// database name and the owner's credentials.
pub fn db_url(profile: DbProfile, owner: DbOwner) -> Result<String, AppError> {
    let host = env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port = env::var("POSTGRES_PORT").unwrap_or_else(|_| "5432".to_string());
    let db_name = db_name(profile)?;
    let (user_var, password_var) = owner.credential_vars();
    let username = must_var(user_var)?;
    let password = must_var(password_var)?;

    Ok(format!(
        "postgresql://{username}:{password}@{host}:{port}/{db_name}"
    ))
}

fn db_name(profile: DbProfile) -> Result<String, AppError> {
    let name = must_var(profile.db_name_var())?;
    if profile == DbProfile::Test && !name.ends_with("_test") {
        return Err(AppError::config(format!(
            "Test profile requires a database name ending in '_test', got '{name}'"
        )));
    }
    Ok(name)
}

fn must_var(name: &str) -> Result<String, AppError> {
    env::var(name)
        .map_err(|_| AppError::config(format!("Required environment variable '{name}' is not set")))
}

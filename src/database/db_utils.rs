use diesel::{
    pg::PgConnection,
    r2d2::{ConnectionManager, Pool},
};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use log::info;

use crate::app::AppError;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Return a pool of connections to the hosted database.
///
/// # Example
/// ```ignore
/// let pool = psql_connect_to_db("postgres://localhost/blogsite", 10)?;
/// ```
pub fn psql_connect_to_db(database_url: &str, pool_size: u32) -> Result<PgPool, AppError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);

    Ok(Pool::builder().max_size(pool_size).build(manager)?)
}

/// Brings the schema up to date with the migrations embedded in the binary.
pub fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    let mut conn = pool.get()?;

    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| AppError::Internal(format!("migrations failed: {err}")))?;
    for version in applied {
        info!("Applied migration {version}");
    }

    Ok(())
}

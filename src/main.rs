extern crate dotenv;

pub mod app;
pub mod database;
pub mod schema;

mod auth;
mod blogs;
mod routes;
mod users;

use std::{io, sync::Arc};

use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use dotenv::dotenv;
use log::{info, warn};

use crate::{
    app::{config::Config, AppState},
    auth::token::Authenticator,
    database::{
        db_utils::{psql_connect_to_db, run_migrations},
        memory::MemoryStore,
        postgres::PgStore,
        store::Store,
    },
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::load().map_err(io::Error::other)?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(database_url) => {
            let pool = psql_connect_to_db(database_url, config.pool_size).map_err(io::Error::other)?;
            run_migrations(&pool).map_err(io::Error::other)?;
            Arc::new(PgStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, keeping data in memory");
            Arc::new(MemoryStore::default())
        }
    };

    let app_state = AppState::new(
        store,
        Authenticator::new(&config.jwt_secret, config.jwt_expires_in_hours),
    );

    if let Some(seed) = config.admin.clone() {
        app_state
            .run(move |store| users::seed_admin(store, &seed))
            .await
            .map_err(io::Error::other)?;
    }

    let cors_origins = config.cors_origins.clone();
    info!("Server running on {}:{}", config.host, config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(app_state.clone()))
            .wrap(routes::cors(&cors_origins))
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

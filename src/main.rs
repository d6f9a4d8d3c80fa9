pub mod schema;
pub mod database;
pub mod app;

mod auth;
mod routes;
mod services;

use std::io;

use actix_web::{middleware::Logger, web::Data, App, HttpServer};
use env_logger::Env;

use app::{config::Config, maintenance::Maintenance, AppState};
use database::db_utils::{psql_connect_to_db, redis_connect_to_db};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;

    let app_state = AppState {
        psql_pool: psql_connect_to_db(&config.database_url)?,
        redis_pool: redis_connect_to_db(&config.redis_url)?,
        token_ttl: config.token_ttl_secs,
    };

    if config.maintenance.enabled {
        log::warn!("maintenance mode is on, GET requests need the admin key");
    }
    log::info!("Server running on {}:{}", config.host, config.port);

    let maintenance = config.maintenance.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(Data::new(app_state.clone()))
            .wrap(Maintenance::new(maintenance.clone()))
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}

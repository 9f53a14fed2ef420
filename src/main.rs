use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;

use vin_registry::config::Config;
use vin_registry::handlers::{self, AppState};
use vin_registry::repository::PgVehicleRepository;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let pool = match PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
    {
        Ok(pool) => {
            log::info!("Connection to the database is successful");
            pool
        }
        Err(err) => {
            log::error!("Failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    let repository = PgVehicleRepository::new(pool.clone());
    if let Err(err) = repository.ensure_schema().await {
        log::error!("Failed to prepare the vehicles table: {:?}", err);
        std::process::exit(1);
    }

    let state = web::Data::new(AppState::new(Arc::new(repository)));

    log::info!(
        "Server listening on {}:{}",
        config.http_host,
        config.http_port
    );

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_header()
                    .allow_any_method(),
            )
            .wrap(NormalizePath::trim())
            .wrap(Logger::default())
            .configure(handlers::configure)
    })
    .bind((config.http_host.as_str(), config.http_port))?
    .run()
    .await?;

    pool.close().await;
    log::info!("Database pool closed");
    Ok(())
}

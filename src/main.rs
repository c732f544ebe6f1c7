use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use foodgram::{config::AppConfig, db, routes};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("foodgram=info,actix_web=info")),
        )
        .init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()));
        }
    };

    tracing::info!("Connecting to database...");
    let db = match db::establish_connection(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to connect to database: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };
    tracing::info!("Database connected");

    if let Err(e) = db::create_schema(&db).await {
        tracing::error!("Failed to create schema: {}", e);
        return Err(std::io::Error::other(e.to_string()));
    }

    let bind_address = (config.host.clone(), config.port);
    tracing::info!("Starting server on http://{}:{}", bind_address.0, bind_address.1);

    let db_data = web::Data::new(db);
    let config_data = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .configure(routes::configure_routes)
    })
        .bind(bind_address)?
        .run()
        .await
}

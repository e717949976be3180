use std::io;

use actix_web::{web, App, HttpServer};
use sqlx::SqlitePool;

use user_record::config::Config;
use user_record::http;

async fn serve(pool: SqlitePool, bind_addr: &str) -> Result<(), io::Error> {
    log::info!("starting a webserver on http://{}/", bind_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(http::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = Config::from_env();

    let registry = user_record::registry()?;
    let pool = user_record::connect(&config.database_url, &registry).await?;
    log::info!("connected to {}", config.database_url);

    serve(pool, &config.bind_addr).await?;

    Ok(())
}

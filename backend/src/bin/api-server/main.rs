use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use restaurant_query::config::Config;

mod api;
mod error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    config.setup_logging()?;

    // Open the database before binding so no request is served without it.
    let state = web::Data::new(api::ApiState::new(&config.database_url).await?);
    tracing::info!("database {} ready", config.database_url);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET"]),
            )
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind((config.bind_addr.as_str(), config.port))?;

    tracing::info!(
        "listening at http://{}:{}",
        config.bind_addr,
        config.port
    );
    server.run().await?;
    Ok(())
}

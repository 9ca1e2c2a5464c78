use restaurant_query::{config::Config, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    config.setup_logging()?;

    let pool = seed::connect(&config.database_url).await?;
    tracing::info!("connected to {}", config.database_url);

    seed::create_schema(&pool).await?;
    seed::insert_fixtures(&pool).await?;

    pool.close().await;
    Ok(())
}

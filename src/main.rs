use std::error::Error;

use log::info;

use compucie_db::{config::DbConfig, schema};

#[tokio::main]
async fn main() {
    env_logger::init();
    bootstrap()
        .await
        .expect("Failed to bootstrap the database.")
}

async fn bootstrap() -> Result<(), Box<dyn Error>> {
    let config = DbConfig::from_env()?;
    let db = config.connect().await?;

    schema::create_tables(&db).await?;

    info!("Database is ready");
    Ok(())
}

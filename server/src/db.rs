use anyhow::Result;
use bb8_postgres::PostgresConnectionManager;
use tokio_postgres::NoTls;

use crate::config::config;

pub type Pool = bb8::Pool<PostgresConnectionManager<NoTls>>;
pub type Client<'a> = bb8::PooledConnection<'a, PostgresConnectionManager<NoTls>>;

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

pub async fn pool(database_url: &str) -> Result<Pool> {
    let mgr = PostgresConnectionManager::new_from_stringlike(database_url, NoTls)?;
    let pool = bb8::Pool::builder()
        .max_size(config().pool_size)
        .build(mgr)
        .await?;
    Ok(pool)
}

pub async fn migrate(database_url: &str) -> Result<()> {
    let mut conn = pool(database_url).await?.dedicated_connection().await?;

    log::info!("Running migrations");
    let report = embedded::migrations::runner().run_async(&mut conn).await?;
    for migration in report.applied_migrations() {
        log::info!("Applied {}", migration);
    }
    Ok(())
}

pub async fn reset(database_url: &str) -> Result<()> {
    {
        let conn = pool(database_url).await?.dedicated_connection().await?;
        log::warn!("Dropping all tables");
        conn.batch_execute(
            "DROP TABLE IF EXISTS flight_records, locations, routes, refinery_schema_history",
        )
        .await?;
    }
    migrate(database_url).await
}

pub async fn health(pool: &Pool) -> Result<()> {
    let client = pool.get().await?;
    client.execute("SELECT 1", &[]).await?;
    Ok(())
}

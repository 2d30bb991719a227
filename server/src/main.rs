use clap::Parser;
use cli::{Cli, Command};

mod cli;
mod config;
mod db;
mod encoders;
mod error;
mod flight_csv;
mod flights;
mod geometries;
mod geotiff;
mod models;
mod repos;
mod server;
mod trajectory;
mod uploads;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let args = Cli::parse();

    match args.cmd {
        Command::Http { address } => {
            server::run(address, &args.database_url, config::config()).await?
        }
        Command::Db(db_cmd) => match db_cmd.cmd {
            cli::DbSubCommand::Migrate => db::migrate(&args.database_url).await?,
            cli::DbSubCommand::Reset => db::reset(&args.database_url).await?,
        },
    }

    Ok(())
}

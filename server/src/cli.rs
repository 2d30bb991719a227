use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(about = "Flight track CSV conversion and import service.")]
pub struct Cli {
    #[arg(env = "FLIGHTTRACK_DATABASE_URL", short, long)]
    pub database_url: String,
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP actions
    Http {
        #[arg(env = "FLIGHTTRACK_SERVER_ADDRESS")]
        address: std::net::SocketAddr,
    },
    Db(DbCommand),
}

#[derive(Debug, Parser)]
pub struct DbCommand {
    #[command(subcommand)]
    pub cmd: DbSubCommand,
}

#[derive(Debug, Subcommand)]
pub enum DbSubCommand {
    /// Drop all tables, then migrate
    Reset,
    Migrate,
}

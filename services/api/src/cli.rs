use crate::server;
use clap::{Args, Parser, Subcommand};
use realty::auth::hash_password;
use realty::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "realty",
    about = "Serve the property listing site and its lead-capture API",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print an Argon2 hash suitable for ADMIN_PASSWORD_HASH
    HashPassword(HashPasswordArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct HashPasswordArgs {
    /// Plain-text admin password
    password: String,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::HashPassword(args) => {
            let hash = hash_password(&args.password)?;
            println!("{hash}");
            Ok(())
        }
    }
}
